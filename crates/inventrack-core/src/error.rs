// ── Core error types ──
//
// Consumers never see reqwest errors or raw status codes. The
// `From<inventrack_api::Error>` impl classifies transport failures into
// the five kinds a UI can act on.

use inventrack_api::FieldError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EntityId, EntityKind};

// ── Classification ───────────────────────────────────────────────────

/// What class of failure a gateway call hit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No response was received.
    Network,
    /// 401 / 403: the session is missing, expired, or not allowed.
    Auth,
    /// Any other 4xx: the server rejected the payload.
    Validation,
    /// 5xx, unreadable body, or anything unclassified.
    Server,
    /// 404.
    NotFound,
}

impl ErrorKind {
    fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            404 => Self::NotFound,
            400..=499 => Self::Validation,
            _ => Self::Server,
        }
    }
}

/// Normalized gateway failure.
///
/// Read operations return this directly; write operations wrap it in a
/// [`WriteError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub fields: Vec<FieldError>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            fields: Vec::new(),
        }
    }

    /// Text suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the server. Check your connection and try again.".into()
            }
            ErrorKind::Auth => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Validation if !self.fields.is_empty() => {
                let details: Vec<String> = self
                    .fields
                    .iter()
                    .map(|f| format!("{}: {}", f.field, f.message))
                    .collect();
                format!("{} ({})", self.message, details.join(", "))
            }
            ErrorKind::Validation | ErrorKind::NotFound => self.message.clone(),
            ErrorKind::Server => format!("The server reported an error: {}", self.message),
        }
    }
}

impl From<inventrack_api::Error> for GatewayError {
    fn from(err: inventrack_api::Error) -> Self {
        let status = err.status();
        let fields = err.field_errors().to_vec();

        let kind = match (&err, status) {
            (inventrack_api::Error::Authentication { .. }, _) => ErrorKind::Auth,
            (_, Some(status)) => ErrorKind::from_status(status),
            (inventrack_api::Error::Deserialization { .. }, None) => ErrorKind::Server,
            (inventrack_api::Error::Transport(e), None) if e.is_decode() || e.is_body() => {
                ErrorKind::Server
            }
            _ => ErrorKind::Network,
        };

        let message = match err {
            inventrack_api::Error::Api { message, .. }
            | inventrack_api::Error::Authentication { message } => message,
            other => other.to_string(),
        };

        Self {
            kind,
            message,
            status,
            fields,
        }
    }
}

// ── Write failures ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WriteOp {
    Create,
    Update,
    Delete,
    Upload,
}

/// A create / update / delete that did not land on the server.
///
/// Returned after the error reporter has seen the underlying
/// [`GatewayError`], so the caller can skip its local mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {op} {entity}: {source}")]
pub struct WriteError {
    pub op: WriteOp,
    pub entity: EntityKind,
    pub id: Option<EntityId>,
    #[source]
    pub source: GatewayError,
}

impl WriteError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind
    }
}

// ── Durable storage ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage quota exceeded for '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("failed to encode snapshot for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Unified error ────────────────────────────────────────────────────

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Failed to persist snapshot: {0}")]
    Persistence(#[from] StorageError),

    #[error("{entity} {id} not found in store")]
    NotFound { entity: EntityKind, id: EntityId },

    #[error("Cannot apply patch to {entity} {id}: {message}")]
    InvalidPatch {
        entity: EntityKind,
        id: EntityId,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// The gateway classification behind this error, if it came from the wire.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Gateway(e) => Some(e.kind),
            Self::Write(e) => Some(e.kind()),
            Self::NotAuthenticated => Some(ErrorKind::Auth),
            _ => None,
        }
    }
}

impl From<inventrack_api::Error> for CoreError {
    fn from(err: inventrack_api::Error) -> Self {
        Self::Gateway(GatewayError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> inventrack_api::Error {
        inventrack_api::Error::Api {
            status,
            message: message.into(),
            code: None,
            fields: vec![FieldError {
                field: "name".into(),
                message: "is required".into(),
            }],
        }
    }

    #[test]
    fn classifies_by_status() {
        assert_eq!(GatewayError::from(api(401, "x")).kind, ErrorKind::Auth);
        assert_eq!(GatewayError::from(api(403, "x")).kind, ErrorKind::Auth);
        assert_eq!(GatewayError::from(api(404, "x")).kind, ErrorKind::NotFound);
        assert_eq!(GatewayError::from(api(409, "x")).kind, ErrorKind::Validation);
        assert_eq!(GatewayError::from(api(422, "x")).kind, ErrorKind::Validation);
        assert_eq!(GatewayError::from(api(500, "x")).kind, ErrorKind::Server);
        assert_eq!(GatewayError::from(api(302, "x")).kind, ErrorKind::Server);
    }

    #[test]
    fn classifies_bodyless_failures() {
        let decode = inventrack_api::Error::Deserialization {
            message: "eof".into(),
            body: String::new(),
        };
        assert_eq!(GatewayError::from(decode).kind, ErrorKind::Server);

        let tls = inventrack_api::Error::Tls("bad cert".into());
        assert_eq!(GatewayError::from(tls).kind, ErrorKind::Network);

        let login = inventrack_api::Error::Authentication {
            message: "Invalid credentials".into(),
        };
        let err = GatewayError::from(login);
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.message, "Invalid credentials");
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = GatewayError::from(api(422, "Validation failed"));
        assert_eq!(err.user_message(), "Validation failed (name: is required)");
        assert_eq!(err.to_string(), "VALIDATION: Validation failed");
    }

    #[test]
    fn write_error_exposes_kind() {
        let err = WriteError {
            op: WriteOp::Create,
            entity: EntityKind::Product,
            id: None,
            source: GatewayError::new(ErrorKind::Validation, "name is required"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "failed to create product: VALIDATION: name is required"
        );
    }
}
