// ── Write flows ──
//
// Gateway write first, local mutation second. A write that fails on the
// server never touches the store; a write that succeeds is mirrored into
// it with the same data that was sent. A patch that cannot be merged into
// the cached record is rejected before anything goes over the wire.

use std::sync::Arc;

use inventrack_api::ImageFile;
use serde_json::Value;
use tracing::{debug, info};

use crate::diff::{compute_patch, merge_patch};
use crate::error::CoreError;
use crate::gateway::{Gateway, ProfileGateway};
use crate::model::{CollectionEntity, EntityId, Patch, Profile};
use crate::store::{EntityStore, ProfileStore};

/// Result of submitting an edit form.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome<T> {
    /// Nothing differed from the last-fetched record; no request was made.
    NoChanges,
    /// The server accepted the changed fields.
    Updated {
        /// Exactly the fields sent and merged into the store.
        patch: Patch,
        /// The server's view of the record after the update.
        record: T,
    },
}

impl<T> EditOutcome<T> {
    pub fn is_no_changes(&self) -> bool {
        matches!(self, Self::NoChanges)
    }
}

/// Create on the server, then add the confirmed record to the store.
pub async fn create_record<T, G>(
    store: &EntityStore<T, G>,
    draft: &T::Draft,
) -> Result<Arc<T>, CoreError>
where
    T: CollectionEntity,
    G: Gateway<T>,
{
    let record = store.gateway().create(draft).await?;
    let id = record.id().clone();
    info!(entity = %T::KIND, %id, "created");

    store.add(record)?;
    store
        .get(&id)
        .ok_or(CoreError::NotFound { entity: T::KIND, id })
}

/// Diff `submitted` against `original` and send only what changed.
pub async fn submit_edit<T, G>(
    store: &EntityStore<T, G>,
    original: &T,
    submitted: &Patch,
) -> Result<EditOutcome<T>, CoreError>
where
    T: CollectionEntity,
    G: Gateway<T>,
{
    let patch = compute_patch(original, submitted)?;
    if patch.is_empty() {
        debug!(entity = %T::KIND, id = %original.id(), "no changes to submit");
        return Ok(EditOutcome::NoChanges);
    }

    merge_patch(original, &patch)?;

    let id = original.id();
    let record = store.gateway().update(id, &patch).await?;
    store.update(id, &patch)?;
    info!(entity = %T::KIND, %id, fields = patch.len(), "updated");

    Ok(EditOutcome::Updated { patch, record })
}

/// Delete on the server, then drop the record from the store.
pub async fn delete_record<T, G>(store: &EntityStore<T, G>, id: &EntityId) -> Result<(), CoreError>
where
    T: CollectionEntity,
    G: Gateway<T>,
{
    store.gateway().delete(id).await?;
    store.delete(id)?;
    info!(entity = %T::KIND, %id, "deleted");
    Ok(())
}

// ── Profile ──────────────────────────────────────────────────────────

/// Profile counterpart of [`submit_edit`].
pub async fn submit_profile_edit<G: ProfileGateway>(
    store: &ProfileStore<G>,
    original: &Profile,
    submitted: &Patch,
) -> Result<EditOutcome<Profile>, CoreError> {
    let patch = compute_patch(original, submitted)?;
    if patch.is_empty() {
        debug!("no profile changes to submit");
        return Ok(EditOutcome::NoChanges);
    }

    merge_patch(original, &patch)?;

    let record = store.gateway().update(&original.user_id, &patch).await?;
    store.update(&patch)?;
    info!(user = %original.user_id, fields = patch.len(), "profile updated");

    Ok(EditOutcome::Updated { patch, record })
}

/// Upload a new avatar and point the profile at it.
///
/// Returns the new image URL.
pub async fn upload_avatar<G: ProfileGateway>(
    store: &ProfileStore<G>,
    user_id: &EntityId,
    image: ImageFile,
) -> Result<String, CoreError> {
    let url = store.gateway().upload_image(user_id, image).await?;

    let mut patch = Patch::new();
    patch.insert("avatar_url".into(), Value::String(url.clone()));
    let record = store.gateway().update(user_id, &patch).await?;

    if !store.update(&patch)? {
        store.set(record)?;
    }
    info!(user = %user_id, "avatar updated");
    Ok(url)
}
