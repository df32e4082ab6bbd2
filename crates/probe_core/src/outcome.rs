use std::fmt;

use crate::WorkItem;

/// Positive answer from the validation service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub valid: bool,
    pub display: Option<String>,
    pub is_unmanaged: bool,
    pub throttle_status: Option<i64>,
    pub is_signup_disallowed: bool,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    pub kind: FailureKind,
    pub message: String,
}

impl CheckError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CheckError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    HttpStatus(u16),
    MalformedResponse,
    Network,
    /// Failure reported by a service implementation that fits no other kind.
    Service,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Service => write!(f, "service error"),
        }
    }
}

/// The single result produced for one admitted work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub item: WorkItem,
    pub result: Result<Verdict, CheckError>,
}

impl Outcome {
    pub fn success(item: WorkItem, verdict: Verdict) -> Self {
        Self {
            item,
            result: Ok(verdict),
        }
    }

    pub fn failure(item: WorkItem, error: CheckError) -> Self {
        Self {
            item,
            result: Err(error),
        }
    }

    pub fn identifier(&self) -> &str {
        self.item.as_str()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// True only for a successful check with a positive verdict.
    pub fn is_valid(&self) -> bool {
        matches!(&self.result, Ok(verdict) if verdict.valid)
    }
}
