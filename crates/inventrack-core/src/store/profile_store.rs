// ── Profile store ──
//
// Same lifecycle as a collection store, over at most one record: the
// signed-in user's profile.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::cell::{LoadMode, LoadOutcome, LoadState, Snapshot, StoreCell};
use super::persist::SnapshotStorage;
use crate::diff;
use crate::error::CoreError;
use crate::gateway::ProfileGateway;
use crate::model::{Entity, EntityId, Patch, Profile};
use crate::stream::EntityStream;

pub struct ProfileStore<G> {
    cell: StoreCell<Option<Profile>>,
    gateway: Arc<G>,
}

impl<G: ProfileGateway> ProfileStore<G> {
    pub fn open(gateway: Arc<G>, storage: Arc<dyn SnapshotStorage>) -> Self {
        Self {
            cell: StoreCell::open(Profile::KIND.storage_key(), storage),
            gateway,
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Fetch the profile for `user_id`.
    ///
    /// A cached profile that belongs to another user is dropped first, so
    /// it is never shown under the wrong session.
    pub async fn load(&self, user_id: &EntityId) -> Result<LoadOutcome, CoreError> {
        {
            let mut txn = self.cell.begin();
            let foreign = txn
                .data
                .as_ref()
                .is_some_and(|p| &p.user_id != user_id);
            if foreign && !txn.loading {
                debug!(%user_id, "dropping cached profile of another user");
                txn.data = None;
                txn.has_loaded_once = false;
                txn.last_loaded = None;
                txn.volatile().stale = false;
                txn.commit()?;
            }
        }

        let gateway = Arc::clone(&self.gateway);
        let user_id = user_id.clone();
        self.cell
            .load_with(LoadMode::IfNeeded, || async move {
                gateway.get(&user_id).await.map(Some)
            })
            .await
    }

    /// Replace the cached profile wholesale.
    pub fn set(&self, profile: Profile) -> Result<(), CoreError> {
        let mut txn = self.cell.begin();
        txn.data = Some(profile);
        txn.commit()?;
        Ok(())
    }

    /// Shallow-merge `patch` into the cached profile. Returns `false` when
    /// nothing is cached.
    pub fn update(&self, patch: &Patch) -> Result<bool, CoreError> {
        let mut txn = self.cell.begin();
        let Some(current) = txn.data.clone() else {
            return Ok(false);
        };
        let merged = diff::merge_patch(&current, patch)?;
        txn.data = Some(merged);
        txn.commit()?;
        Ok(true)
    }

    pub fn reset(&self) -> Result<(), CoreError> {
        self.cell.reset()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.cell.snapshot().data.clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot<Option<Profile>>> {
        self.cell.snapshot()
    }

    pub fn status(&self) -> LoadState {
        self.cell.snapshot().status()
    }

    pub fn subscribe(&self) -> EntityStream<Option<Profile>> {
        EntityStream::new(self.cell.subscribe())
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Arc<Snapshot<Option<Profile>>>> {
        self.cell.subscribe()
    }
}
