// ── Store cell ──
//
// The shared state machine behind every store: one mutex-guarded
// snapshot, a watch channel that publishes it, and a durable key it is
// written to. All mutation goes through a `StoreTxn`, which persists and
// publishes on commit (or on drop if the caller forgets).

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::persist::{self, SnapshotStorage};
use crate::error::{CoreError, GatewayError, StorageError};

/// Data a store can hold: a collection or a single optional record.
pub trait StoreData:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: crate::model::Entity> StoreData for Option<T> {
    fn len(&self) -> usize {
        usize::from(self.is_some())
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Everything a consumer can observe about a store at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot<D> {
    pub data: D,
    /// A fetch is in flight.
    pub loading: bool,
    /// User-facing message from the last failed fetch.
    pub error: Option<String>,
    /// A fetch has succeeded for this data at some point (survives restarts).
    pub has_loaded_once: bool,
    pub last_loaded: Option<DateTime<Utc>>,
    /// Data came from durable storage and has not been confirmed by a
    /// fetch in this process.
    pub stale: bool,
    /// Bumped by every load claim and every reset. A fetch only applies its
    /// result if the generation it claimed is still current.
    pub generation: u64,
}

impl<D: StoreData> Snapshot<D> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn status(&self) -> LoadState {
        if self.loading {
            LoadState::Loading
        } else if self.error.is_some() {
            LoadState::LoadFailed
        } else if self.has_loaded_once {
            LoadState::Loaded
        } else {
            LoadState::Unloaded
        }
    }
}

impl<D: Default> Default for Snapshot<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            loading: false,
            error: None,
            has_loaded_once: false,
            last_loaded: None,
            stale: false,
            generation: 0,
        }
    }
}

/// Coarse lifecycle state derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    LoadFailed,
}

/// What a `load()` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched and applied; carries the number of records now held.
    Loaded(usize),
    /// The fetch failed; the message is also on the snapshot's `error`.
    Failed(GatewayError),
    /// Another fetch was already in flight. Nothing was issued.
    AlreadyLoading,
    /// Data was already present and fresh. Nothing was issued.
    AlreadyLoaded,
    /// The fetch completed after a reset or a newer load; its result was
    /// dropped.
    Superseded,
}

impl LoadOutcome {
    /// Whether this call issued a network request.
    pub fn fetched(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_) | Self::Superseded)
    }
}

/// Whether a load may be skipped when data is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadMode {
    IfNeeded,
    Force,
}

// ── Cell ─────────────────────────────────────────────────────────────

pub(crate) struct StoreCell<D> {
    key: &'static str,
    state: Mutex<Snapshot<D>>,
    tx: watch::Sender<Arc<Snapshot<D>>>,
    storage: Arc<dyn SnapshotStorage>,
}

impl<D: StoreData> StoreCell<D> {
    /// Open the cell, rehydrating from `storage` if a valid snapshot exists.
    pub(crate) fn open(key: &'static str, storage: Arc<dyn SnapshotStorage>) -> Self {
        let mut initial = Snapshot::<D>::default();
        if let Some(saved) = persist::rehydrate::<D>(storage.as_ref(), key) {
            initial.data = saved.data;
            initial.has_loaded_once = saved.has_loaded_once;
            initial.last_loaded = saved.last_loaded;
            initial.stale = true;
        }

        let (tx, _rx) = watch::channel(Arc::new(initial.clone()));
        Self {
            key,
            state: Mutex::new(initial),
            tx,
            storage,
        }
    }

    pub(crate) fn snapshot(&self) -> Arc<Snapshot<D>> {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Snapshot<D>>> {
        self.tx.subscribe()
    }

    /// Lock the state for a mutation. Never hold the transaction across an
    /// `.await`.
    pub(crate) fn begin(&self) -> StoreTxn<'_, D> {
        StoreTxn {
            cell: self,
            guard: self.state.lock().unwrap_or_else(PoisonError::into_inner),
            publish: false,
            persist: false,
            clear_storage: false,
            finished: false,
        }
    }

    /// Fetch-and-apply with single-flight and generation checks.
    ///
    /// The claim (setting `loading` and taking a generation) happens under
    /// the lock, so concurrent callers see each other. The fetch itself
    /// runs unlocked; its result is applied only if no reset or newer load
    /// bumped the generation meanwhile.
    pub(crate) async fn load_with<F, Fut>(
        &self,
        mode: LoadMode,
        fetch: F,
    ) -> Result<LoadOutcome, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<D, GatewayError>>,
    {
        let generation = {
            let mut txn = self.begin();
            if mode == LoadMode::IfNeeded {
                if txn.loading {
                    return Ok(LoadOutcome::AlreadyLoading);
                }
                if !txn.stale && !txn.data.is_empty() {
                    return Ok(LoadOutcome::AlreadyLoaded);
                }
            }
            let state = txn.volatile();
            state.loading = true;
            state.generation += 1;
            let generation = state.generation;
            txn.commit()?;
            generation
        };

        debug!(key = self.key, generation, "load started");
        let result = fetch().await;

        let mut txn = self.begin();
        if txn.generation != generation {
            debug!(
                key = self.key,
                generation,
                current = txn.generation,
                "discarding superseded load result"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(data) => {
                let count = data.len();
                let state = &mut *txn;
                state.data = data;
                state.loading = false;
                state.error = None;
                state.stale = false;
                state.has_loaded_once = true;
                state.last_loaded = Some(Utc::now());
                txn.commit()?;
                debug!(key = self.key, count, "load applied");
                Ok(LoadOutcome::Loaded(count))
            }
            Err(err) => {
                let state = txn.volatile();
                state.loading = false;
                state.error = Some(err.user_message());
                txn.commit()?;
                warn!(key = self.key, error = %err, "load failed");
                Ok(LoadOutcome::Failed(err))
            }
        }
    }

    /// Back to the initial empty state. Drops the durable snapshot and
    /// invalidates any in-flight load.
    pub(crate) fn reset(&self) -> Result<(), CoreError> {
        let mut txn = self.begin();
        let generation = txn.generation + 1;
        *txn = Snapshot {
            generation,
            ..Snapshot::default()
        };
        txn.clear_storage();
        txn.commit()?;
        debug!(key = self.key, "store reset");
        Ok(())
    }
}

// ── Transaction ──────────────────────────────────────────────────────

/// Exclusive access to a store's snapshot.
///
/// Mutable access through `DerefMut` marks the snapshot for persistence
/// and publication. [`volatile`](Self::volatile) marks it for publication
/// only, for fields that are not part of the durable envelope.
pub(crate) struct StoreTxn<'a, D: StoreData> {
    cell: &'a StoreCell<D>,
    guard: MutexGuard<'a, Snapshot<D>>,
    publish: bool,
    persist: bool,
    clear_storage: bool,
    finished: bool,
}

impl<D: StoreData> StoreTxn<'_, D> {
    /// Mutable access to fields that are not persisted
    /// (`loading`, `error`, `stale`, `generation`).
    pub(crate) fn volatile(&mut self) -> &mut Snapshot<D> {
        self.publish = true;
        &mut self.guard
    }

    /// Remove the durable snapshot instead of writing it.
    pub(crate) fn clear_storage(&mut self) {
        self.clear_storage = true;
        self.persist = true;
        self.publish = true;
    }

    /// Persist and publish. The new state is published even if
    /// persistence fails; the storage error is returned.
    pub(crate) fn commit(mut self) -> Result<(), StorageError> {
        self.finished = true;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let result = if self.persist {
            self.write_storage()
        } else {
            Ok(())
        };

        if self.publish {
            self.cell.tx.send_replace(Arc::new((*self.guard).clone()));
        }

        self.publish = false;
        self.persist = false;
        result
    }

    fn write_storage(&self) -> Result<(), StorageError> {
        let key = self.cell.key;
        if self.clear_storage {
            return self.cell.storage.remove(key);
        }
        let encoded = persist::encode(
            key,
            &self.guard.data,
            self.guard.has_loaded_once,
            self.guard.last_loaded,
        )?;
        self.cell.storage.write(key, &encoded)
    }
}

impl<D: StoreData> Deref for StoreTxn<'_, D> {
    type Target = Snapshot<D>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<D: StoreData> DerefMut for StoreTxn<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.publish = true;
        self.persist = true;
        &mut self.guard
    }
}

impl<D: StoreData> Drop for StoreTxn<'_, D> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(key = self.cell.key, error = %e, "failed to persist store snapshot");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{EntityId, Profile};
    use crate::store::MemoryStorage;

    type Cell = StoreCell<Option<Profile>>;

    fn profile(id: i64) -> Profile {
        serde_json::from_value(serde_json::json!({ "user_id": id, "full_name": "Ada" })).unwrap()
    }

    fn cell(storage: &Arc<MemoryStorage>) -> Cell {
        let storage: Arc<dyn SnapshotStorage> = storage.clone();
        StoreCell::open("profile", storage)
    }

    #[test]
    fn mutation_persists_and_publishes() {
        let storage = Arc::new(MemoryStorage::new());
        let cell = cell(&storage);
        let mut rx = cell.subscribe();

        {
            let mut txn = cell.begin();
            txn.data = Some(profile(1));
            txn.commit().unwrap();
        }

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().data.as_ref().unwrap().user_id, EntityId::from(1));
        assert_eq!(storage.keys(), vec!["profile".to_owned()]);
    }

    #[test]
    fn volatile_changes_skip_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let cell = cell(&storage);
        {
            let mut txn = cell.begin();
            txn.volatile().loading = true;
        }
        assert!(cell.snapshot().loading);
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn read_only_txn_publishes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let cell = cell(&storage);
        let rx = cell.subscribe();
        {
            let txn = cell.begin();
            assert!(txn.data.is_none());
        }
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn reopen_marks_rehydrated_data_stale() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let cell = cell(&storage);
            let mut txn = cell.begin();
            txn.data = Some(profile(3));
            txn.has_loaded_once = true;
        }

        let reopened = cell(&storage);
        let snap = reopened.snapshot();
        assert!(snap.stale);
        assert!(snap.has_loaded_once);
        assert_eq!(snap.status(), LoadState::Loaded);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn quota_failure_keeps_memory_state() {
        let storage = Arc::new(MemoryStorage::with_quota(8));
        let cell = cell(&storage);

        let mut txn = cell.begin();
        txn.data = Some(profile(1));
        let err = txn.commit().unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(cell.snapshot().data.is_some());
    }

    #[tokio::test]
    async fn failed_load_records_message() {
        let storage = Arc::new(MemoryStorage::new());
        let cell = cell(&storage);

        let outcome = cell
            .load_with(LoadMode::IfNeeded, || async {
                Err::<Option<Profile>, _>(GatewayError::new(
                    ErrorKind::Network,
                    "connection refused",
                ))
            })
            .await
            .unwrap();

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        let snap = cell.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.status(), LoadState::LoadFailed);
        assert!(snap.error.as_deref().unwrap().contains("Unable to reach the server"));
    }

    #[tokio::test]
    async fn reset_supersedes_in_flight_load() {
        let storage = Arc::new(MemoryStorage::new());
        let cell = Arc::new(cell(&storage));

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let loading = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move {
                cell.load_with(LoadMode::IfNeeded, || async move {
                    release_rx.await.ok();
                    Ok(Some(profile(1)))
                })
                .await
            })
        };

        let mut rx = cell.subscribe();
        rx.wait_for(|s| s.loading).await.unwrap();
        cell.reset().unwrap();
        release_tx.send(()).unwrap();

        let outcome = loading.await.unwrap().unwrap();
        assert_eq!(outcome, LoadOutcome::Superseded);
        assert!(cell.snapshot().data.is_none());
        assert!(!cell.snapshot().loading);
    }
}
