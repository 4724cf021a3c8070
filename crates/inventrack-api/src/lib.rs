// inventrack-api: Async Rust client for the InvenTrack REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod resources;
pub mod storage;
pub mod transport;

pub use auth::SessionUser;
pub use client::ApiClient;
pub use error::{Error, FieldError};
pub use storage::{ImageFile, ImageUpload};
pub use transport::{TlsMode, TransportConfig};
