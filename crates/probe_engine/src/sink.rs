use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use probe_core::{Outcome, SinkPolicy, Verdict};
use probe_logging::probe_error;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot open output file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Receives every completed outcome exactly once.
pub trait OutcomeSink: Send + Sync {
    fn accept(&self, outcome: &Outcome);
}

/// Where emitted lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Stdout,
    /// Append-only file; created if missing, never truncated.
    File(PathBuf),
}

/// Self-describing record written for a successful check under [`SinkPolicy::Full`].
#[derive(Debug, Serialize)]
pub struct OutcomeRecord<'a> {
    pub identifier: &'a str,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_unmanaged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttle_status: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_signup_disallowed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl<'a> OutcomeRecord<'a> {
    pub fn new(identifier: &'a str, verdict: &'a Verdict) -> Self {
        Self {
            identifier,
            valid: verdict.valid,
            display: verdict.display.as_deref(),
            is_unmanaged: verdict.is_unmanaged,
            throttle_status: verdict.throttle_status,
            is_signup_disallowed: verdict.is_signup_disallowed,
        }
    }
}

/// Renders the line (without terminator) an outcome produces under `policy`.
///
/// Failed checks never produce a line; they belong on the diagnostic stream.
pub fn render_line(policy: SinkPolicy, outcome: &Outcome) -> Option<String> {
    let verdict = outcome.result.as_ref().ok()?;
    match policy {
        SinkPolicy::ValidOnly => verdict.valid.then(|| outcome.identifier().to_string()),
        SinkPolicy::Full => {
            match serde_json::to_string(&OutcomeRecord::new(outcome.identifier(), verdict)) {
                Ok(line) => Some(line),
                Err(err) => {
                    probe_error!(
                        "[!] Error encoding record for {}: {}",
                        outcome.identifier(),
                        err
                    );
                    None
                }
            }
        }
    }
}

/// Newline-delimited sink over a single shared writer.
///
/// Each line is written and flushed while holding the writer lock, so lines
/// from concurrent workers never interleave.
pub struct LineSink {
    policy: SinkPolicy,
    writer: Mutex<Box<dyn Write + Send>>,
    lines_written: AtomicUsize,
    write_failures: AtomicUsize,
}

impl LineSink {
    pub fn new(policy: SinkPolicy, writer: Box<dyn Write + Send>) -> Self {
        Self {
            policy,
            writer: Mutex::new(writer),
            lines_written: AtomicUsize::new(0),
            write_failures: AtomicUsize::new(0),
        }
    }

    pub fn stdout(policy: SinkPolicy) -> Self {
        Self::new(policy, Box::new(io::stdout()))
    }

    /// Opens `path` once for appending, creating it if needed.
    pub fn append_to(policy: SinkPolicy, path: &Path) -> Result<Self, SinkError> {
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(policy, Box::new(file)))
    }

    pub fn for_target(policy: SinkPolicy, target: &SinkTarget) -> Result<Self, SinkError> {
        match target {
            SinkTarget::Stdout => Ok(Self::stdout(policy)),
            SinkTarget::File(path) => Self::append_to(policy, path),
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Relaxed)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buffer = Vec::with_capacity(line.len() + 1);
        buffer.extend_from_slice(line.as_bytes());
        buffer.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&buffer)?;
        writer.flush()
    }
}

impl OutcomeSink for LineSink {
    fn accept(&self, outcome: &Outcome) {
        let Some(line) = render_line(self.policy, outcome) else {
            return;
        };

        match self.write_line(&line) {
            Ok(()) => {
                self.lines_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                probe_error!(
                    "[!] Error writing result for {}: {}",
                    outcome.identifier(),
                    err
                );
            }
        }
    }
}
