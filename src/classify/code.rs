//! Error Code Module
//!
//! The closed error taxonomy and the rules mapping raw failures onto it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RawError;

// == Error Code ==
/// Classified error code.
///
/// Explicit codes outside the fixed set are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorCode {
    Network,
    Timeout,
    Permission,
    Http(u16),
    Unknown,
    Other(String),
}

impl ErrorCode {
    // == Classification ==
    /// Maps a raw failure to its code. First matching rule wins:
    /// explicit code, HTTP status, then message keywords.
    pub fn from_raw(raw: &RawError) -> Self {
        if let Some(code) = &raw.code {
            return Self::parse(code);
        }
        if let Some(status) = raw.status {
            return ErrorCode::Http(status);
        }

        let message = raw.message.to_lowercase();
        if message.contains("network") {
            ErrorCode::Network
        } else if message.contains("timeout") {
            ErrorCode::Timeout
        } else if message.contains("permission") {
            ErrorCode::Permission
        } else {
            ErrorCode::Unknown
        }
    }

    /// Parses the wire form (`NETWORK_ERROR`, `HTTP_404`, ...).
    pub fn parse(code: &str) -> Self {
        match code {
            "NETWORK_ERROR" => ErrorCode::Network,
            "TIMEOUT_ERROR" => ErrorCode::Timeout,
            "PERMISSION_ERROR" => ErrorCode::Permission,
            "UNKNOWN_ERROR" => ErrorCode::Unknown,
            other => match other.strip_prefix("HTTP_").and_then(|s| s.parse().ok()) {
                Some(status) => ErrorCode::Http(status),
                None => ErrorCode::Other(other.to_string()),
            },
        }
    }

    /// Returns the wire form of the code.
    pub fn as_str(&self) -> String {
        match self {
            ErrorCode::Network => "NETWORK_ERROR".to_string(),
            ErrorCode::Timeout => "TIMEOUT_ERROR".to_string(),
            ErrorCode::Permission => "PERMISSION_ERROR".to_string(),
            ErrorCode::Http(status) => format!("HTTP_{}", status),
            ErrorCode::Unknown => "UNKNOWN_ERROR".to_string(),
            ErrorCode::Other(code) => code.clone(),
        }
    }

    /// True for failures a retry cannot fix (auth, permission, missing resource).
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ErrorCode::Permission | ErrorCode::Http(401) | ErrorCode::Http(403) | ErrorCode::Http(404)
        )
    }

    /// True for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ErrorCode::Http(500..=599))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str()
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::parse(&code)
    }
}
