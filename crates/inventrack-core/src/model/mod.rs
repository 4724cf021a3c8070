// ── Domain model ──
//
// Canonical record types shared by gateways, stores and consumers.

mod entity_id;
mod product;
mod profile;
mod supplier;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use entity_id::EntityId;
pub use product::{Product, ProductDraft};
pub use profile::Profile;
pub use supplier::{Supplier, SupplierDraft};

/// A partial record: field name to new JSON value.
pub type Patch = serde_json::Map<String, serde_json::Value>;

/// The three entity types the layer manages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Product,
    Supplier,
    Profile,
}

impl EntityKind {
    /// REST path segment for this entity type.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Supplier => "suppliers",
            Self::Profile => "profiles",
        }
    }

    /// Durable-storage key for this entity type's snapshot.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Supplier => "suppliers",
            Self::Profile => "profile",
        }
    }
}

/// A record the layer can fetch, cache and persist.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;
}

/// An entity that lives in a collection and is created by the server from
/// an identifier-less draft.
pub trait CollectionEntity: Entity {
    type Draft: Serialize + fmt::Debug + Send + Sync;
}
