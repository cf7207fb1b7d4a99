//! Raw Error Module
//!
//! The unclassified failure shape operations hand to the classifier.

use std::fmt;

// == Raw Error ==
/// Failure information as reported by an operation, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawError {
    /// Explicit error code supplied by the failing layer
    pub code: Option<String>,
    /// HTTP status of the failed response, if any
    pub status: Option<u16>,
    /// Human-readable failure description
    pub message: String,
}

impl RawError {
    // == Constructors ==
    /// Creates a raw error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Creates a raw error for an HTTP response status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(message).with_status(status)
    }

    // == Builders ==
    /// Attaches an explicit error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches an HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status) {
            (Some(code), _) => write!(f, "[{}] {}", code, self.message),
            (None, Some(status)) => write!(f, "[HTTP {}] {}", status, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

// == Conversions ==
impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for RawError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let message = err.to_string();
        match err.kind() {
            ErrorKind::TimedOut => Self::new(message).with_code("TIMEOUT_ERROR"),
            ErrorKind::PermissionDenied => Self::new(message).with_code("PERMISSION_ERROR"),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => Self::new(message).with_code("NETWORK_ERROR"),
            _ => Self::new(message),
        }
    }
}

impl From<anyhow::Error> for RawError {
    fn from(err: anyhow::Error) -> Self {
        // Keep an embedded RawError's code and status when one is in the chain.
        if let Some(raw) = err.downcast_ref::<RawErrorSource>() {
            return raw.0.clone();
        }
        Self::new(format!("{:#}", err))
    }
}

/// Wrapper letting a RawError travel through `anyhow` chains.
#[derive(Debug)]
struct RawErrorSource(RawError);

impl fmt::Display for RawErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for RawErrorSource {}

impl RawError {
    /// Converts into an `anyhow::Error` that still classifies by code and status.
    pub fn into_anyhow(self) -> anyhow::Error {
        anyhow::Error::new(RawErrorSource(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_variants() {
        assert_eq!(RawError::new("boom").to_string(), "boom");
        assert_eq!(RawError::http(404, "missing").to_string(), "[HTTP 404] missing");
        assert_eq!(
            RawError::new("x").with_code("QUOTA").to_string(),
            "[QUOTA] x"
        );
    }

    #[test]
    fn test_from_io_timeout() {
        let raw = RawError::from(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert_eq!(raw.code.as_deref(), Some("TIMEOUT_ERROR"));
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        let err = anyhow::anyhow!("Network request failed").context("searchNearby");
        let raw = RawError::from(err);
        assert_eq!(raw.message, "searchNearby: Network request failed");
        assert!(raw.code.is_none());
    }

    #[test]
    fn test_anyhow_round_trip_keeps_status() {
        let raw = RawError::from(RawError::http(429, "slow down").into_anyhow());
        assert_eq!(raw.status, Some(429));
    }
}
