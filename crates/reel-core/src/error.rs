//! Error types for Reel Core

use thiserror::Error;

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, Error>;

/// Playback error types
#[derive(Error, Debug)]
pub enum Error {
    // Authorization errors
    #[error("Playback not authorized: {0}")]
    Authorization(String),

    #[error("Playback token expired")]
    TokenExpired,

    // Manifest errors
    #[error("Stream unavailable: {0}")]
    Manifest(String),

    // Transport errors
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    // Best-effort lookups
    #[error("{operation} unavailable: {reason}")]
    NonFatalFetch {
        operation: &'static str,
        reason: String,
    },

    // Session control errors
    #[error("Unknown quality: {0}")]
    UnknownQuality(String),

    #[error("No active playback session")]
    NoActiveSession,

    #[error("Invalid session phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map a non-success HTTP status to the matching error kind.
    ///
    /// 401/403 always mean the viewer is not entitled. Missing or unprocessable
    /// assets only count as manifest errors for the manifest call itself.
    pub fn from_status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            401 | 403 => Error::Authorization(if message.is_empty() {
                format!("{operation} rejected with HTTP {status}")
            } else {
                message
            }),
            404 | 410 | 422 if operation == "GetManifest" => Error::Manifest(if message.is_empty() {
                format!("no playable stream (HTTP {status})")
            } else {
                message
            }),
            _ => Error::Status {
                operation,
                status,
                message,
            },
        }
    }

    /// Wrap a failure of a best-effort lookup
    pub fn non_fatal(operation: &'static str, source: &Error) -> Self {
        Error::NonFatalFetch {
            operation,
            reason: source.to_string(),
        }
    }

    /// Returns true if this error ends the session when it hits the critical path
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Authorization(_)
                | Error::TokenExpired
                | Error::Manifest(_)
                | Error::Transport(_)
                | Error::Status { .. }
                | Error::Timeout { .. }
        )
    }

    /// Returns the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Authorization(_) => "AUTHORIZATION",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::Manifest(_) => "MANIFEST",
            Error::Transport(_) => "TRANSPORT",
            Error::Status { .. } => "HTTP_STATUS",
            Error::Timeout { .. } => "TIMEOUT",
            Error::NonFatalFetch { .. } => "NON_FATAL_FETCH",
            Error::UnknownQuality(_) => "UNKNOWN_QUALITY",
            Error::NoActiveSession => "NO_SESSION",
            Error::InvalidPhaseTransition { .. } => "INVALID_PHASE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Config(_) => "CONFIG_PARSE",
            Error::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            Error::from_status("RequestToken", 403, "not entitled"),
            Error::Authorization(msg) if msg == "not entitled"
        ));
        assert!(matches!(
            Error::from_status("GetManifest", 404, ""),
            Error::Manifest(_)
        ));
        assert!(matches!(
            Error::from_status("GetQualities", 404, ""),
            Error::Status { status: 404, .. }
        ));
        assert!(matches!(
            Error::from_status("PutProgress", 503, "busy"),
            Error::Status { status: 503, .. }
        ));
    }

    #[test]
    fn test_fatality() {
        assert!(Error::Authorization("denied".into()).is_fatal());
        assert!(Error::Manifest("gone".into()).is_fatal());
        assert!(Error::Timeout { operation: "GetManifest" }.is_fatal());
        assert!(!Error::NonFatalFetch {
            operation: "GetQualities",
            reason: "boom".into()
        }
        .is_fatal());
        assert!(!Error::UnknownQuality("8K".into()).is_fatal());
    }

    #[test]
    fn test_non_fatal_wraps_message() {
        let err = Error::non_fatal("GetResumePosition", &Error::Manifest("x".into()));
        assert_eq!(err.error_code(), "NON_FATAL_FETCH");
        assert!(err.to_string().contains("GetResumePosition"));
    }
}
