use std::fmt;

use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether a later attempt could plausibly succeed.
    ///
    /// Network faults, timeouts, 5xx, 408 and 429 are transient. Business
    /// codes, auth failures and other 4xx are not.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ApiErrorKind::Network | ApiErrorKind::Timeout => true,
            ApiErrorKind::HttpStatus(code) => code >= 500 || code == 408 || code == 429,
            ApiErrorKind::InvalidUrl
            | ApiErrorKind::Unauthorized
            | ApiErrorKind::NotFound
            | ApiErrorKind::Business { .. }
            | ApiErrorKind::Decode => false,
        }
    }

    /// Network-level failures are the only ones the HTTP layer retries itself.
    pub(crate) fn is_network_level(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Network | ApiErrorKind::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    Network,
    Timeout,
    Unauthorized,
    NotFound,
    HttpStatus(u16),
    /// HTTP 200 carrying a non-zero envelope code.
    Business { code: i64 },
    Decode,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::InvalidUrl => write!(f, "invalid url"),
            ApiErrorKind::Network => write!(f, "network error"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::NotFound => write!(f, "not found"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Business { code } => write!(f, "business error {code}"),
            ApiErrorKind::Decode => write!(f, "undecodable response"),
        }
    }
}

/// Terminal outcome of a poll loop other than success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// A fetch failed and no attempt was left, or the failure was not transient.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The server reported the analysis as failed.
    #[error("analysis failed: {message}")]
    AnalysisFailed { message: String },
    /// No terminal status within the attempt budget.
    #[error("analysis timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let transient = [
            ApiErrorKind::Network,
            ApiErrorKind::Timeout,
            ApiErrorKind::HttpStatus(502),
            ApiErrorKind::HttpStatus(429),
        ];
        for kind in transient {
            assert!(ApiError::new(kind.clone(), "x").is_transient(), "{kind}");
        }

        let permanent = [
            ApiErrorKind::Unauthorized,
            ApiErrorKind::NotFound,
            ApiErrorKind::HttpStatus(400),
            ApiErrorKind::Business { code: 1001 },
            ApiErrorKind::Decode,
        ];
        for kind in permanent {
            assert!(!ApiError::new(kind.clone(), "x").is_transient(), "{kind}");
        }
    }

    #[test]
    fn only_network_faults_are_retried_by_the_http_layer() {
        assert!(ApiError::new(ApiErrorKind::Timeout, "slow").is_network_level());
        assert!(!ApiError::new(ApiErrorKind::HttpStatus(503), "busy").is_network_level());
    }
}
