// ── Remote data gateway ──
//
// The seam between stores and the network. Stores only ever see
// normalized `GatewayError`s; the HTTP implementation lives in `http`.

mod http;

use std::future::Future;
use std::sync::Arc;

use inventrack_api::ImageFile;

use crate::error::{GatewayError, WriteError};
use crate::model::{CollectionEntity, EntityId, Patch, Profile};

pub use http::{HttpGateway, HttpProfileGateway};

/// Callback invoked with every gateway failure, before the error is
/// returned. Typically wired to a toast or a log line.
pub type ErrorReporter = Arc<dyn Fn(&GatewayError) + Send + Sync>;

/// CRUD access to one collection resource.
pub trait Gateway<T: CollectionEntity>: Send + Sync + 'static {
    /// The full collection. No pagination.
    fn list(&self) -> impl Future<Output = Result<Vec<T>, GatewayError>> + Send;

    fn get(&self, id: &EntityId) -> impl Future<Output = Result<T, GatewayError>> + Send;

    /// Create from a draft; the returned record carries the server's id.
    fn create(&self, draft: &T::Draft) -> impl Future<Output = Result<T, WriteError>> + Send;

    /// Send only the changed fields.
    fn update(
        &self,
        id: &EntityId,
        patch: &Patch,
    ) -> impl Future<Output = Result<T, WriteError>> + Send;

    fn delete(&self, id: &EntityId) -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// Access to the per-user profile resource.
pub trait ProfileGateway: Send + Sync + 'static {
    fn get(&self, user_id: &EntityId)
    -> impl Future<Output = Result<Profile, GatewayError>> + Send;

    fn update(
        &self,
        user_id: &EntityId,
        patch: &Patch,
    ) -> impl Future<Output = Result<Profile, WriteError>> + Send;

    /// Upload an avatar image and return its public URL.
    fn upload_image(
        &self,
        user_id: &EntityId,
        image: ImageFile,
    ) -> impl Future<Output = Result<String, WriteError>> + Send;
}
