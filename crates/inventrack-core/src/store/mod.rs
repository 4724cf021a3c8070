// ── Entity stores ──
//
// Observable, persistent caches. Each store owns one durable key and a
// watch channel; consumers read snapshots or subscribe to changes.

mod cell;
mod collection;
mod entity_store;
mod persist;
mod profile_store;

pub use cell::{LoadOutcome, LoadState, Snapshot, StoreData};
pub use collection::EntityCollection;
pub use entity_store::EntityStore;
pub use persist::{FileStorage, MemoryStorage, SNAPSHOT_VERSION, SnapshotStorage};
pub use profile_store::ProfileStore;
