//! Client-side data layer between `inventrack-api` and UI consumers.
//!
//! This crate owns the domain model, the persistent entity stores, and the
//! logic that keeps them in step with the server:
//!
//! - **[`Inventory`]**: Facade owning the API client, session state, the
//!   product / supplier / profile stores, and their background loaders.
//!   Construct one and inject it; there are no globals.
//!
//! - **Gateways** ([`gateway`]): [`Gateway<T>`] and [`ProfileGateway`]
//!   traits with REST implementations. Every failure is classified into an
//!   [`ErrorKind`], handed to an optional [`ErrorReporter`], and returned.
//!
//! - **Stores** ([`store`]): [`EntityStore`] and [`ProfileStore`]: cached
//!   data plus load lifecycle, published through `tokio::sync::watch` and
//!   written to a [`SnapshotStorage`] after every mutation. Loads are
//!   single-flight and generation-tagged so a late response can never
//!   overwrite a reset.
//!
//! - **[`SessionLoader`]**: Watches session and store state and issues
//!   `load()` when the gate opens.
//!
//! - **Edit flows** ([`edit`], [`diff`]): Server write first, store
//!   mutation second; edits send only the fields that changed.

pub mod config;
pub mod diff;
pub mod edit;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod loader;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use edit::EditOutcome;
pub use error::{CoreError, ErrorKind, GatewayError, StorageError, WriteError, WriteOp};
pub use gateway::{ErrorReporter, Gateway, HttpGateway, HttpProfileGateway, ProfileGateway};
pub use inventory::{Inventory, ProductStore, SupplierStore, UserProfileStore};
pub use loader::{LoaderPolicy, SessionLoader, SessionState};
pub use store::{
    EntityCollection, EntityStore, FileStorage, LoadOutcome, LoadState, MemoryStorage,
    ProfileStore, Snapshot, SnapshotStorage,
};
pub use stream::EntityStream;

pub use model::{
    CollectionEntity, Entity, EntityId, EntityKind, Patch, Product, ProductDraft, Profile,
    Supplier, SupplierDraft,
};

// Types consumers need from the transport layer.
pub use inventrack_api::{FieldError, ImageFile, SessionUser};
