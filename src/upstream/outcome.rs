//! Result of a single snapshot fetch.

use bytes::Bytes;
use hyper::StatusCode;

/// Why a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connect or response did not complete before the deadline.
    Timeout,
    /// Connection refused, reset, closed mid-response, DNS failure, ...
    Transport,
    /// The camera answered with something other than 200 OK.
    NonOkStatus(StatusCode),
}

/// A classified fetch failure with a human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct FetchFailure {
    kind: FailureKind,
    detail: String,
}

impl FetchFailure {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            detail: detail.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            detail: detail.into(),
        }
    }

    pub fn non_ok(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NonOkStatus(status),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Timeouts and transport errors: the camera could not be reached.
    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, FailureKind::Timeout | FailureKind::Transport)
    }
}

/// Either the complete response body or a classified failure. Never partial.
pub type FetchOutcome = Result<Bytes, FetchFailure>;
