// ── Inventory facade ──
//
// Owns the API client, the session state, the three stores and their
// loaders. Consumers construct one `Inventory` and inject it wherever
// store access is needed.

use std::sync::Arc;

use inventrack_api::{ApiClient, ImageFile, SessionUser};
use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::edit::{self, EditOutcome};
use crate::error::CoreError;
use crate::gateway::{ErrorReporter, HttpGateway, HttpProfileGateway};
use crate::loader::{SessionLoader, SessionState};
use crate::model::{EntityId, Patch, Product, ProductDraft, Profile, Supplier, SupplierDraft};
use crate::store::{
    EntityStore, FileStorage, LoadOutcome, MemoryStorage, ProfileStore, SnapshotStorage,
};

pub type ProductStore = EntityStore<Product, HttpGateway<Product>>;
pub type SupplierStore = EntityStore<Supplier, HttpGateway<Supplier>>;
pub type UserProfileStore = ProfileStore<HttpProfileGateway>;

/// Storage key holding the id of the user the cached snapshots belong to.
const OWNER_KEY: &str = "owner";

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<InventoryInner>`. Stores are usable right
/// after construction (they hold any rehydrated snapshot); network access
/// needs a session from [`login`](Self::login) or
/// [`restore_session`](Self::restore_session).
#[derive(Clone)]
pub struct Inventory {
    inner: Arc<InventoryInner>,
}

struct InventoryInner {
    config: ClientConfig,
    client: ApiClient,
    session: watch::Sender<SessionState>,
    products: Arc<ProductStore>,
    suppliers: Arc<SupplierStore>,
    profile: Arc<UserProfileStore>,
    storage: Arc<dyn SnapshotStorage>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Inventory {
    /// Build from configuration: file-backed snapshots when `storage_dir`
    /// is set, in-memory otherwise. Does not contact the server.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let storage: Arc<dyn SnapshotStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir.clone())?),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage, None)
    }

    /// Build with an explicit storage backend and an optional reporter
    /// that sees every gateway failure.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn SnapshotStorage>,
        reporter: Option<ErrorReporter>,
    ) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.api_url.as_str(), &config.transport())?;

        let mut products = HttpGateway::<Product>::new(client.clone());
        let mut suppliers = HttpGateway::<Supplier>::new(client.clone());
        let mut profile = HttpProfileGateway::new(client.clone());
        if let Some(reporter) = reporter {
            products = products.with_reporter(Arc::clone(&reporter));
            suppliers = suppliers.with_reporter(Arc::clone(&reporter));
            profile = profile.with_reporter(reporter);
        }

        let (session, _) = watch::channel(SessionState::Anonymous);

        Ok(Self {
            inner: Arc::new(InventoryInner {
                products: Arc::new(EntityStore::open(Arc::new(products), Arc::clone(&storage))),
                suppliers: Arc::new(EntityStore::open(Arc::new(suppliers), Arc::clone(&storage))),
                profile: Arc::new(ProfileStore::open(Arc::new(profile), Arc::clone(&storage))),
                storage,
                config,
                client,
                session,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn products(&self) -> &Arc<ProductStore> {
        &self.inner.products
    }

    pub fn suppliers(&self) -> &Arc<SupplierStore> {
        &self.inner.suppliers
    }

    pub fn profile(&self) -> &Arc<UserProfileStore> {
        &self.inner.profile
    }

    // ── Session lifecycle ────────────────────────────────────────────

    pub fn session(&self) -> SessionState {
        self.inner.session.borrow().clone()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionUser, CoreError> {
        let user = self.inner.client.login(email, password).await?;
        self.establish(user.clone())?;
        Ok(user)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
    ) -> Result<SessionUser, CoreError> {
        let user = self.inner.client.signup(email, password, full_name).await?;
        self.establish(user.clone())?;
        Ok(user)
    }

    /// Resume an existing cookie session, if the server still accepts it.
    pub async fn restore_session(&self) -> Result<Option<SessionUser>, CoreError> {
        let Some(user) = self.inner.client.validate_token().await? else {
            debug!("no valid session to restore");
            return Ok(None);
        };
        self.establish(user.clone())?;
        Ok(Some(user))
    }

    /// End the session and clear every store, including persisted
    /// snapshots. A failed server-side logout is logged, not returned.
    pub async fn logout(&self) -> Result<(), CoreError> {
        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "server logout failed (non-fatal)");
        }
        self.inner.session.send_replace(SessionState::Anonymous);
        self.reset_stores()?;
        info!("logged out");
        Ok(())
    }

    /// Publish an authenticated session. Cached data that belongs to a
    /// different user is dropped first.
    fn establish(&self, user: SessionUser) -> Result<(), CoreError> {
        let user_id = EntityId::from(user.id.as_str());
        if self.cached_owner().is_some_and(|owner| owner != user_id) {
            info!(user = %user.id, "cached data belongs to another user, clearing");
            self.reset_stores()?;
        }
        self.inner.storage.write(OWNER_KEY, &user.id)?;

        info!(user = %user.id, email = ?user.email, "session established");
        self.inner
            .session
            .send_replace(SessionState::Authenticated(user));
        Ok(())
    }

    /// Owner of the cached snapshots: the recorded owner key, else the
    /// cached profile's user.
    fn cached_owner(&self) -> Option<EntityId> {
        match self.inner.storage.read(OWNER_KEY) {
            Ok(Some(owner)) => return Some(EntityId::from(owner)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read cache owner"),
        }
        self.inner.profile.profile().map(|p| p.user_id)
    }

    fn reset_stores(&self) -> Result<(), CoreError> {
        // Reset all three even if one fails to clear its storage.
        let results = [
            self.inner.products.reset(),
            self.inner.suppliers.reset(),
            self.inner.profile.reset(),
            self.inner.storage.remove(OWNER_KEY).map_err(CoreError::from),
        ];
        results.into_iter().collect()
    }

    fn require_user(&self) -> Result<SessionUser, CoreError> {
        self.session()
            .user()
            .cloned()
            .ok_or(CoreError::NotAuthenticated)
    }

    // ── Background loading ───────────────────────────────────────────

    /// Spawn the session-gated loaders for all three stores. Returns
    /// `false` without spawning anything if they are already running.
    pub async fn start(&self) -> bool {
        let policy = self.inner.config.loader_policy;
        let cancel = &self.inner.cancel;
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            debug!("session loaders already running");
            return false;
        }

        handles.push(
            SessionLoader::new(
                "products",
                Arc::clone(&self.inner.products),
                self.subscribe_session(),
                policy,
            )
            .spawn(cancel.child_token()),
        );
        handles.push(
            SessionLoader::new(
                "suppliers",
                Arc::clone(&self.inner.suppliers),
                self.subscribe_session(),
                policy,
            )
            .spawn(cancel.child_token()),
        );
        handles.push(
            SessionLoader::new(
                "profile",
                Arc::clone(&self.inner.profile),
                self.subscribe_session(),
                policy,
            )
            .spawn(cancel.child_token()),
        );
        debug!(%policy, "session loaders started");
        true
    }

    /// Stop the loaders and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("inventory shut down");
    }

    /// Load all three stores once, without background loaders.
    pub async fn load_all(&self) -> Result<[LoadOutcome; 3], CoreError> {
        let user = self.require_user()?;
        let user_id = EntityId::from(user.id.as_str());
        let (products, suppliers, profile) = tokio::join!(
            self.inner.products.load(),
            self.inner.suppliers.load(),
            self.inner.profile.load(&user_id),
        );
        Ok([products?, suppliers?, profile?])
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Arc<Product>, CoreError> {
        edit::create_record(&self.inner.products, draft).await
    }

    pub async fn edit_product(
        &self,
        original: &Product,
        submitted: &Patch,
    ) -> Result<EditOutcome<Product>, CoreError> {
        edit::submit_edit(&self.inner.products, original, submitted).await
    }

    pub async fn delete_product(&self, id: &EntityId) -> Result<(), CoreError> {
        edit::delete_record(&self.inner.products, id).await
    }

    pub async fn create_supplier(
        &self,
        draft: &SupplierDraft,
    ) -> Result<Arc<Supplier>, CoreError> {
        edit::create_record(&self.inner.suppliers, draft).await
    }

    pub async fn edit_supplier(
        &self,
        original: &Supplier,
        submitted: &Patch,
    ) -> Result<EditOutcome<Supplier>, CoreError> {
        edit::submit_edit(&self.inner.suppliers, original, submitted).await
    }

    pub async fn delete_supplier(&self, id: &EntityId) -> Result<(), CoreError> {
        edit::delete_record(&self.inner.suppliers, id).await
    }

    pub async fn edit_profile(
        &self,
        original: &Profile,
        submitted: &Patch,
    ) -> Result<EditOutcome<Profile>, CoreError> {
        edit::submit_profile_edit(&self.inner.profile, original, submitted).await
    }

    pub async fn upload_avatar(&self, image: ImageFile) -> Result<String, CoreError> {
        let user = self.require_user()?;
        let user_id = EntityId::from(user.id.as_str());
        edit::upload_avatar(&self.inner.profile, &user_id, image).await
    }
}
