//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use inventrack_config::ConfigError;
use inventrack_core::{CoreError, EntityKind, ErrorKind, GatewayError, WriteError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the InvenTrack server")]
    #[diagnostic(
        code(inventrack::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             {message}\n\
             Cached data is still available with: inventrack products list --cached"
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(inventrack::auth_failed),
        help(
            "Verify the email and password for profile '{profile}'.\n\
             Run: inventrack config set-password {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(inventrack::no_credentials),
        help(
            "Configure credentials with: inventrack config init\n\
             Or set INVENTRACK_EMAIL and INVENTRACK_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(inventrack::not_found),
        help("Run: inventrack {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("The server rejected the request: {message}")]
    #[diagnostic(code(inventrack::rejected), help("{details}"))]
    Rejected { message: String, details: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(inventrack::api_error))]
    ApiError { code: String, message: String },

    #[error("Could not write the local cache: {message}")]
    #[diagnostic(
        code(inventrack::storage),
        help("The server change succeeded. Check free space and permissions of --storage-dir.")
    )]
    Storage { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(inventrack::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(inventrack::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: inventrack config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API URL configured")]
    #[diagnostic(
        code(inventrack::no_config),
        help(
            "Create a profile with: inventrack config init\n\
             Or pass --api-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(inventrack::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(inventrack::interactive),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    Prompt(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(inventrack::json), help("Check the JSON input and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(inventrack::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Rejected { .. } | Self::Prompt(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn prompt(err: impl std::fmt::Display) -> Self {
        Self::Prompt(err.to_string())
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn not_found(entity: EntityKind, identifier: String) -> CliError {
    CliError::NotFound {
        resource_type: entity.to_string(),
        identifier,
        list_command: format!("{} list", entity.resource()),
    }
}

fn from_gateway(err: GatewayError, target: Option<(EntityKind, String)>) -> CliError {
    match err.kind {
        ErrorKind::Network => CliError::ConnectionFailed {
            message: err.message,
        },
        ErrorKind::Auth => CliError::AuthFailed {
            profile: "current".into(),
            message: err.message,
        },
        ErrorKind::NotFound => match target {
            Some((entity, id)) => not_found(entity, id),
            None => CliError::ApiError {
                code: "not_found".into(),
                message: err.message,
            },
        },
        ErrorKind::Validation => {
            let details = err
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("\n");
            CliError::Rejected {
                message: err.message,
                details,
            }
        }
        ErrorKind::Server => CliError::ApiError {
            code: err.status.map_or_else(|| "server".into(), |s| s.to_string()),
            message: err.message,
        },
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => CliError::AuthFailed {
                profile: "current".into(),
                message: "not signed in".into(),
            },

            CoreError::Gateway(e) => from_gateway(e, None),

            CoreError::Write(WriteError {
                entity, id, source, ..
            }) => from_gateway(source, id.map(|id| (entity, id.to_string()))),

            CoreError::Persistence(e) => CliError::Storage {
                message: e.to_string(),
            },

            CoreError::NotFound { entity, id } => not_found(entity, id.to_string()),

            CoreError::InvalidPatch { message, .. } => CliError::Validation {
                field: "fields".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see: inventrack config profiles)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inventrack_core::{EntityId, FieldError, WriteOp};

    #[test]
    fn write_not_found_names_the_record() {
        let err = CoreError::Write(WriteError {
            op: WriteOp::Delete,
            entity: EntityKind::Supplier,
            id: Some(EntityId::from(9)),
            source: GatewayError::new(ErrorKind::NotFound, "gone"),
        });
        let cli = CliError::from(err);
        assert_eq!(cli.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(cli.to_string(), "supplier '9' not found");
    }

    #[test]
    fn validation_lists_field_errors() {
        let mut source = GatewayError::new(ErrorKind::Validation, "invalid product");
        source.fields.push(FieldError {
            field: "name".into(),
            message: "is required".into(),
        });
        let cli = CliError::from(CoreError::Gateway(source));
        assert_eq!(cli.exit_code(), exit_code::USAGE);
        match cli {
            CliError::Rejected { details, .. } => assert_eq!(details, "name: is required"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn network_failure_is_connection_exit_code() {
        let cli = CliError::from(CoreError::Gateway(GatewayError::new(
            ErrorKind::Network,
            "connection refused",
        )));
        assert_eq!(cli.exit_code(), exit_code::CONNECTION);
    }
}
