// ── HTTP gateways ──
//
// REST implementations over `ApiClient`. Every failure is converted to a
// `GatewayError`, handed to the reporter, and returned.

use std::fmt;
use std::marker::PhantomData;

use inventrack_api::{ApiClient, ImageFile};
use tracing::debug;

use super::{ErrorReporter, Gateway, ProfileGateway};
use crate::error::{GatewayError, WriteError, WriteOp};
use crate::model::{CollectionEntity, Entity, EntityId, EntityKind, Patch, Profile};

/// Shared failure path for both gateways.
#[derive(Clone, Default)]
struct Failures {
    reporter: Option<ErrorReporter>,
}

impl Failures {
    fn read(&self, entity: EntityKind, err: inventrack_api::Error) -> GatewayError {
        let err = GatewayError::from(err);
        debug!(%entity, kind = %err.kind, status = ?err.status, "read failed: {}", err.message);
        self.report(&err);
        err
    }

    fn write(
        &self,
        op: WriteOp,
        entity: EntityKind,
        id: Option<&EntityId>,
        err: inventrack_api::Error,
    ) -> WriteError {
        let source = GatewayError::from(err);
        debug!(%entity, %op, kind = %source.kind, status = ?source.status, "write failed: {}", source.message);
        self.report(&source);
        WriteError {
            op,
            entity,
            id: id.cloned(),
            source,
        }
    }

    fn report(&self, err: &GatewayError) {
        if let Some(reporter) = &self.reporter {
            reporter(err);
        }
    }
}

// ── Collections ──────────────────────────────────────────────────────

/// REST gateway for a collection entity, at `/{resource}`.
pub struct HttpGateway<T> {
    client: ApiClient,
    failures: Failures,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CollectionEntity> HttpGateway<T> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            failures: Failures::default(),
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.failures.reporter = Some(reporter);
        self
    }
}

impl<T> fmt::Debug for HttpGateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.client.base_url().as_str())
            .field("reporter", &self.failures.reporter.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: CollectionEntity> Gateway<T> for HttpGateway<T> {
    async fn list(&self) -> Result<Vec<T>, GatewayError> {
        self.client
            .list(T::KIND.resource())
            .await
            .map_err(|e| self.failures.read(T::KIND, e))
    }

    async fn get(&self, id: &EntityId) -> Result<T, GatewayError> {
        self.client
            .fetch(T::KIND.resource(), &id.to_string())
            .await
            .map_err(|e| self.failures.read(T::KIND, e))
    }

    async fn create(&self, draft: &T::Draft) -> Result<T, WriteError> {
        self.client
            .create(T::KIND.resource(), draft)
            .await
            .map_err(|e| self.failures.write(WriteOp::Create, T::KIND, None, e))
    }

    async fn update(&self, id: &EntityId, patch: &Patch) -> Result<T, WriteError> {
        self.client
            .update(T::KIND.resource(), &id.to_string(), patch)
            .await
            .map_err(|e| self.failures.write(WriteOp::Update, T::KIND, Some(id), e))
    }

    async fn delete(&self, id: &EntityId) -> Result<(), WriteError> {
        self.client
            .remove(T::KIND.resource(), &id.to_string())
            .await
            .map_err(|e| self.failures.write(WriteOp::Delete, T::KIND, Some(id), e))
    }
}

// ── Profile ──────────────────────────────────────────────────────────

/// REST gateway for `/profiles/{userId}` and the avatar upload endpoint.
pub struct HttpProfileGateway {
    client: ApiClient,
    failures: Failures,
}

impl HttpProfileGateway {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            failures: Failures::default(),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.failures.reporter = Some(reporter);
        self
    }
}

impl fmt::Debug for HttpProfileGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProfileGateway")
            .field("base_url", &self.client.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl ProfileGateway for HttpProfileGateway {
    async fn get(&self, user_id: &EntityId) -> Result<Profile, GatewayError> {
        self.client
            .fetch(Profile::KIND.resource(), &user_id.to_string())
            .await
            .map_err(|e| self.failures.read(Profile::KIND, e))
    }

    async fn update(&self, user_id: &EntityId, patch: &Patch) -> Result<Profile, WriteError> {
        self.client
            .update(Profile::KIND.resource(), &user_id.to_string(), patch)
            .await
            .map_err(|e| {
                self.failures
                    .write(WriteOp::Update, Profile::KIND, Some(user_id), e)
            })
    }

    async fn upload_image(&self, user_id: &EntityId, image: ImageFile) -> Result<String, WriteError> {
        self.client
            .upload_profile_image(&user_id.to_string(), image)
            .await
            .map(|upload| upload.image_url)
            .map_err(|e| {
                self.failures
                    .write(WriteOp::Upload, Profile::KIND, Some(user_id), e)
            })
    }
}
