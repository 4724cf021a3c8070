//! Shared helpers for command handlers.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use inventrack_core::store::StoreData;
use inventrack_core::{CoreError, EntityKind, LoadOutcome, Patch, Snapshot};

use crate::cli::EditArgs;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(CliError::prompt)
}

/// Turn a load outcome into an error if the fetch failed.
pub fn check_load(outcome: LoadOutcome) -> Result<(), CliError> {
    match outcome {
        LoadOutcome::Failed(err) => Err(CoreError::Gateway(err).into()),
        _ => Ok(()),
    }
}

/// Tell the user where `--cached` data came from.
pub fn report_cached<D: StoreData>(snap: &Snapshot<D>, quiet: bool) {
    let message = if snap.is_empty() && !snap.has_loaded_once {
        "No cached data for this profile; run without --cached or `inventrack sync`".to_owned()
    } else if let Some(at) = snap.last_loaded {
        format!(
            "Cached snapshot from {} ({} records)",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            snap.len()
        )
    } else {
        format!("Cached snapshot ({} records)", snap.len())
    };
    output::print_status(&message, quiet);
}

/// Comma-separated field names of a patch, for status lines.
pub fn field_list(patch: &Patch) -> String {
    patch.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub fn not_found(entity: EntityKind, identifier: &str) -> CliError {
    CliError::NotFound {
        resource_type: entity.to_string(),
        identifier: identifier.into(),
        list_command: format!("{} list", entity.resource()),
    }
}

/// Case-insensitive substring match for `--filter`.
pub fn matches_filter(name: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| name.to_lowercase().contains(&f.to_lowercase()))
}

/// Read and parse a JSON value from a file.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

fn read_json_object(path: &Path) -> Result<Patch, CliError> {
    match read_json_file(path)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Validation {
            field: "from-file".into(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Parse `FIELD=VALUE` pairs. Values are read as JSON when they parse
/// (`5`, `true`, `null`, `"x"`) and as plain strings otherwise.
pub fn parse_assignments(pairs: &[String]) -> Result<Patch, CliError> {
    let mut patch = Patch::new();
    for pair in pairs {
        let (field, raw) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "set".into(),
            reason: format!("expected FIELD=VALUE, got '{pair}'"),
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(CliError::Validation {
                field: "set".into(),
                reason: format!("missing field name in '{pair}'"),
            });
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        patch.insert(field.to_owned(), value);
    }
    Ok(patch)
}

/// Build the full submitted form for an edit: the current record with the
/// file's fields and then each `--set` laid over it.
pub fn submitted_fields<T: Serialize>(original: &T, edit: &EditArgs) -> Result<Patch, CliError> {
    if edit.set.is_empty() && edit.from_file.is_none() {
        return Err(CliError::Validation {
            field: "set".into(),
            reason: "nothing to change; pass --set FIELD=VALUE or --from-file".into(),
        });
    }

    let mut form = match serde_json::to_value(original)? {
        Value::Object(map) => map,
        _ => Patch::new(),
    };
    if let Some(ref path) = edit.from_file {
        form.extend(read_json_object(path)?);
    }
    form.extend(parse_assignments(&edit.set)?);
    Ok(form)
}

/// Best-effort MIME type from a file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
