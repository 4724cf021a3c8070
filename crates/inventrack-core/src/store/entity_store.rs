// ── Collection store ──
//
// One per collection entity type. Holds the cached records, their load
// lifecycle, and the gateway used to refresh them.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::cell::{LoadMode, LoadOutcome, LoadState, Snapshot, StoreCell, StoreData};
use super::collection::EntityCollection;
use super::persist::SnapshotStorage;
use crate::diff;
use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{CollectionEntity, Entity, EntityId, Patch};
use crate::stream::EntityStream;

impl<T: Entity> StoreData for EntityCollection<T> {
    fn len(&self) -> usize {
        EntityCollection::len(self)
    }
}

/// Observable, persistent cache of one entity collection.
///
/// Every mutation is applied in memory, published to subscribers, and
/// written to durable storage before the call returns. If the write fails
/// the in-memory state is kept and the call returns
/// [`CoreError::Persistence`].
pub struct EntityStore<T: CollectionEntity, G> {
    cell: StoreCell<EntityCollection<T>>,
    gateway: Arc<G>,
}

impl<T, G> EntityStore<T, G>
where
    T: CollectionEntity,
    G: Gateway<T>,
{
    /// Open the store, rehydrating any valid persisted snapshot.
    pub fn open(gateway: Arc<G>, storage: Arc<dyn SnapshotStorage>) -> Self {
        Self {
            cell: StoreCell::open(T::KIND.storage_key(), storage),
            gateway,
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch the full collection and replace the cached one.
    ///
    /// No-op while a fetch is in flight, or when fresh data is already
    /// present. Rehydrated data counts as stale, so the first load after a
    /// restart always fetches. Failures land on the snapshot's `error` and
    /// are returned as [`LoadOutcome::Failed`]; they are never raised.
    pub async fn load(&self) -> Result<LoadOutcome, CoreError> {
        let gateway = Arc::clone(&self.gateway);
        self.cell
            .load_with(LoadMode::IfNeeded, || async move {
                gateway.list().await.map(|items| items.into_iter().collect::<EntityCollection<T>>())
            })
            .await
    }

    /// Fetch even if data is present. A load already in flight is
    /// superseded.
    pub async fn reload(&self) -> Result<LoadOutcome, CoreError> {
        let gateway = Arc::clone(&self.gateway);
        self.cell
            .load_with(LoadMode::Force, || async move {
                gateway.list().await.map(|items| items.into_iter().collect::<EntityCollection<T>>())
            })
            .await
    }

    // ── Local mutation ───────────────────────────────────────────────

    /// Append a record. A record whose id is already cached replaces the
    /// cached one in place.
    pub fn add(&self, record: T) -> Result<(), CoreError> {
        let id = record.id().clone();
        let mut txn = self.cell.begin();
        if !txn.data.upsert(record) {
            warn!(entity = %T::KIND, %id, "add replaced an existing record");
        }
        txn.commit()?;
        Ok(())
    }

    /// Shallow-merge `patch` into the record with `id`.
    ///
    /// Returns `false` (and changes nothing) when no such record is cached.
    /// An `"id"` key in the patch is ignored.
    pub fn update(&self, id: &EntityId, patch: &Patch) -> Result<bool, CoreError> {
        let mut txn = self.cell.begin();
        let Some(current) = txn.data.get(id).cloned() else {
            debug!(entity = %T::KIND, %id, "update for uncached record ignored");
            return Ok(false);
        };

        let merged = diff::merge_patch(current.as_ref(), patch)?;
        txn.data.upsert(merged);
        txn.commit()?;
        Ok(true)
    }

    /// Remove the record with `id`, returning it if it was cached.
    pub fn delete(&self, id: &EntityId) -> Result<Option<Arc<T>>, CoreError> {
        let mut txn = self.cell.begin();
        if !txn.data.contains(id) {
            return Ok(None);
        }
        let removed = txn.data.remove(id);
        txn.commit()?;
        Ok(removed)
    }

    /// Back to the initial empty state and drop the durable snapshot.
    pub fn reset(&self) -> Result<(), CoreError> {
        self.cell.reset()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.cell.snapshot().data.get(id).cloned()
    }

    pub fn snapshot(&self) -> Arc<Snapshot<EntityCollection<T>>> {
        self.cell.snapshot()
    }

    /// Current records as a cheap `Arc` list.
    pub fn records(&self) -> Vec<Arc<T>> {
        self.cell.snapshot().data.to_vec()
    }

    pub fn status(&self) -> LoadState {
        self.cell.snapshot().status()
    }

    pub fn subscribe(&self) -> EntityStream<EntityCollection<T>> {
        EntityStream::new(self.cell.subscribe())
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Arc<Snapshot<EntityCollection<T>>>> {
        self.cell.subscribe()
    }
}
