use std::fmt;

/// One identifier submitted for validation.
///
/// Carries no identity beyond its string value: two equal items in the input
/// are admitted and checked independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for WorkItem {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WorkItem {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits raw input text into work items.
///
/// Lines are trimmed and blank lines skipped. Order and duplicates are kept.
pub fn parse_identifiers(raw: &str) -> Vec<WorkItem> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(WorkItem::from)
        .collect()
}
