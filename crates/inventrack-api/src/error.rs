use thiserror::Error;

/// A single field-level complaint returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Top-level error type for the `inventrack-api` crate.
///
/// Describes what happened on the wire. `inventrack-core` classifies these
/// into the user-facing error taxonomy (network / auth / validation / ...).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or signup was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response, with whatever the body told us.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        fields: Vec<FieldError>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status of the response that caused this error, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if no response was received at all.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.status().is_none() && !e.is_decode(),
            _ => false,
        }
    }

    /// Returns `true` if the session is missing, expired, or lacks permission.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. }) || matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Extract the API error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Field-level complaints attached to a rejected request.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Api { fields, .. } => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            message: "nope".into(),
            code: None,
            fields: Vec::new(),
        }
    }

    #[test]
    fn status_based_predicates() {
        assert!(api(401).is_auth());
        assert!(api(403).is_auth());
        assert!(!api(422).is_auth());
        assert!(api(404).is_not_found());
        assert!(!api(500).is_network());
    }

    #[test]
    fn login_rejection_is_auth() {
        let err = Error::Authentication {
            message: "bad password".into(),
        };
        assert!(err.is_auth());
        assert_eq!(err.status(), None);
    }
}
