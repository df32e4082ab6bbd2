use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::Context;
use probe_core::{parse_identifiers, WorkItem};
use probe_logging::probe_info;

/// Reads all of stdin when it is piped; `None` when stdin is a terminal.
pub fn read_piped_stdin() -> anyhow::Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("reading identifiers from stdin")?;
    Ok(Some(text))
}

/// Picks the input source: non-empty piped text first, then the input file.
///
/// Returns `None` when neither source is available.
pub fn gather(piped: Option<String>, file: Option<&Path>) -> anyhow::Result<Option<Vec<WorkItem>>> {
    if let Some(text) = piped.filter(|text| !text.trim().is_empty()) {
        let items = parse_identifiers(&text);
        probe_info!("read {} identifiers from stdin", items.len());
        return Ok(Some(items));
    }

    let Some(path) = file else {
        return Ok(None);
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading identifiers from {}", path.display()))?;
    let items = parse_identifiers(&text);
    probe_info!("read {} identifiers from {}", items.len(), path.display());
    Ok(Some(items))
}
