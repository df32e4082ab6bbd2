use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use pretty_assertions::assert_eq;
use probe_core::{CheckError, FailureKind, Outcome, SinkPolicy, Verdict, WorkItem};
use probe_engine::{render_line, LineSink, OutcomeSink, SinkTarget};
use tempfile::TempDir;

/// Writer handing every byte to a shared buffer; writes a byte at a time to
/// expose any interleaving between callers.
#[derive(Clone, Default)]
struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match buf.first() {
            Some(byte) => {
                self.bytes.lock().unwrap().push(*byte);
                thread::yield_now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn success(id: &str, verdict: Verdict) -> Outcome {
    Outcome::success(WorkItem::from(id), verdict)
}

fn failure(id: &str) -> Outcome {
    Outcome::failure(
        WorkItem::from(id),
        CheckError::new(FailureKind::Network, "connection reset"),
    )
}

#[test]
fn full_record_omits_empty_metadata() {
    let line = render_line(SinkPolicy::Full, &success("b@x.com", Verdict::invalid())).unwrap();
    assert_eq!(line, r#"{"identifier":"b@x.com","valid":false}"#);
}

#[test]
fn full_record_carries_metadata() {
    let verdict = Verdict {
        valid: true,
        display: Some("a@x.com".to_string()),
        is_unmanaged: true,
        throttle_status: Some(1),
        is_signup_disallowed: true,
    };
    let line = render_line(SinkPolicy::Full, &success("a@x.com", verdict)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "identifier": "a@x.com",
            "valid": true,
            "display": "a@x.com",
            "is_unmanaged": true,
            "throttle_status": 1,
            "is_signup_disallowed": true
        })
    );
}

#[test]
fn valid_only_emits_bare_identifier_for_positive_verdicts() {
    assert_eq!(
        render_line(SinkPolicy::ValidOnly, &success("a@x.com", Verdict::valid())),
        Some("a@x.com".to_string())
    );
    assert_eq!(
        render_line(SinkPolicy::ValidOnly, &success("b@x.com", Verdict::invalid())),
        None
    );
}

#[test]
fn failures_never_produce_lines() {
    assert_eq!(render_line(SinkPolicy::Full, &failure("c@x.com")), None);
    assert_eq!(render_line(SinkPolicy::ValidOnly, &failure("c@x.com")), None);
}

#[test]
fn valid_only_sink_writes_subset_of_inputs() {
    let buffer = SharedBuffer::default();
    let sink = LineSink::new(SinkPolicy::ValidOnly, Box::new(buffer.clone()));

    let outcomes = vec![
        success("a@x.com", Verdict::valid()),
        success("b@x.com", Verdict::invalid()),
        failure("c@x.com"),
        success("d@x.com", Verdict::valid()),
    ];
    for outcome in &outcomes {
        sink.accept(outcome);
    }

    assert_eq!(buffer.text(), "a@x.com\nd@x.com\n");
    assert_eq!(sink.lines_written(), 2);
    assert!(sink.lines_written() <= outcomes.len());
}

#[test]
fn concurrent_emissions_never_interleave() {
    let buffer = SharedBuffer::default();
    let sink = Arc::new(LineSink::new(SinkPolicy::Full, Box::new(buffer.clone())));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let sink = sink.clone();
            thread::spawn(move || {
                for n in 0..25 {
                    let id = format!("worker{worker}-item{n}@example.com");
                    sink.accept(&success(&id, Verdict::valid()));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let text = buffer.text();
    assert!(text.ends_with('\n'));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 200);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["valid"], true);
    }
}

#[test]
fn write_failure_is_counted_and_does_not_panic() {
    let sink = LineSink::new(SinkPolicy::Full, Box::new(BrokenWriter));
    sink.accept(&success("a@x.com", Verdict::valid()));
    sink.accept(&success("b@x.com", Verdict::valid()));
    assert_eq!(sink.write_failures(), 2);
    assert_eq!(sink.lines_written(), 0);
}

#[test]
fn file_target_appends_without_truncating() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("results.txt");
    fs::write(&path, "earlier@x.com\n").unwrap();

    let sink = LineSink::for_target(SinkPolicy::ValidOnly, &SinkTarget::File(path.clone())).unwrap();
    sink.accept(&success("a@x.com", Verdict::valid()));
    sink.accept(&success("b@x.com", Verdict::invalid()));
    sink.accept(&success("c@x.com", Verdict::valid()));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "earlier@x.com\na@x.com\nc@x.com\n"
    );
}

#[test]
fn missing_file_is_created() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("new.jsonl");

    let sink = LineSink::append_to(SinkPolicy::Full, &path).unwrap();
    sink.accept(&success("a@x.com", Verdict::valid()));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"identifier\":\"a@x.com\",\"valid\":true}\n"
    );
}

#[test]
fn unopenable_target_is_a_setup_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing_dir").join("out.txt");
    assert!(LineSink::append_to(SinkPolicy::Full, &path).is_err());
}
