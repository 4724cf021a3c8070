// ── Session-gated loading ──
//
// A loader watches the session and one store, and issues `load()` when
// the gate opens. It reacts to changes pushed through watch channels; it
// never polls.

use std::future::Future;
use std::sync::Arc;

use inventrack_api::SessionUser;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::gateway::{Gateway, ProfileGateway};
use crate::model::{CollectionEntity, EntityId};
use crate::store::{EntityStore, LoadOutcome, ProfileStore, Snapshot, StoreData};

// ── Session state ────────────────────────────────────────────────────

/// Authentication state observable by loaders and consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }
}

// ── Gate ─────────────────────────────────────────────────────────────

/// When a loader may fire more than once in a session.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LoaderPolicy {
    /// Fire whenever the store is empty (or holds only rehydrated data)
    /// and idle. An empty server collection is retried on each later
    /// session or store change.
    #[default]
    WhileEmpty,
    /// As `WhileEmpty`, but at most once per session user.
    OncePerSession,
}

/// The values the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInputs {
    pub authenticated: bool,
    pub len: usize,
    pub loading: bool,
    /// The store holds rehydrated data not yet confirmed by a fetch.
    pub stale: bool,
}

impl GateInputs {
    fn observe<D: StoreData>(session: &SessionState, snapshot: &Snapshot<D>) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            len: snapshot.len(),
            loading: snapshot.loading,
            stale: snapshot.stale,
        }
    }
}

/// The loader's trigger predicate: authenticated, idle, and either empty
/// or holding only rehydrated data that no fetch has confirmed yet.
pub fn should_load(inputs: GateInputs, policy: LoaderPolicy, already_triggered: bool) -> bool {
    let wanted =
        inputs.authenticated && !inputs.loading && (inputs.len == 0 || inputs.stale);
    match policy {
        LoaderPolicy::WhileEmpty => wanted,
        LoaderPolicy::OncePerSession => wanted && !already_triggered,
    }
}

// ── Loadable stores ──────────────────────────────────────────────────

/// A store a loader can drive.
pub trait Loadable: Send + Sync + 'static {
    type Data: StoreData;

    fn watch_snapshots(&self) -> watch::Receiver<Arc<Snapshot<Self::Data>>>;

    fn load_for(
        &self,
        user: &SessionUser,
    ) -> impl Future<Output = Result<LoadOutcome, CoreError>> + Send;
}

impl<T, G> Loadable for EntityStore<T, G>
where
    T: CollectionEntity,
    G: Gateway<T>,
{
    type Data = crate::store::EntityCollection<T>;

    fn watch_snapshots(&self) -> watch::Receiver<Arc<Snapshot<Self::Data>>> {
        self.watch()
    }

    async fn load_for(&self, _user: &SessionUser) -> Result<LoadOutcome, CoreError> {
        self.load().await
    }
}

impl<G: ProfileGateway> Loadable for ProfileStore<G> {
    type Data = Option<crate::model::Profile>;

    fn watch_snapshots(&self) -> watch::Receiver<Arc<Snapshot<Self::Data>>> {
        self.watch()
    }

    async fn load_for(&self, user: &SessionUser) -> Result<LoadOutcome, CoreError> {
        self.load(&EntityId::from(user.id.as_str())).await
    }
}

// ── Loader ───────────────────────────────────────────────────────────

/// Drives one store from the session state.
pub struct SessionLoader<L: Loadable> {
    name: &'static str,
    store: Arc<L>,
    session: watch::Receiver<SessionState>,
    snapshots: watch::Receiver<Arc<Snapshot<L::Data>>>,
    policy: LoaderPolicy,
    /// User id of the session that already triggered a load.
    triggered_for: Option<String>,
}

impl<L: Loadable> SessionLoader<L> {
    pub fn new(
        name: &'static str,
        store: Arc<L>,
        session: watch::Receiver<SessionState>,
        policy: LoaderPolicy,
    ) -> Self {
        let snapshots = store.watch_snapshots();
        Self {
            name,
            store,
            session,
            snapshots,
            policy,
            triggered_for: None,
        }
    }

    /// Check the gate once against the current state, loading if it is
    /// open. Returns the load outcome when one was issued.
    ///
    /// State changes caused by the load itself are marked seen, so a
    /// failed or empty fetch does not immediately re-open the gate.
    pub async fn evaluate(&mut self) -> Result<Option<LoadOutcome>, CoreError> {
        let session = self.session.borrow_and_update().clone();
        let user = session.user().cloned();

        if self
            .triggered_for
            .as_deref()
            .is_some_and(|id| user.as_ref().is_none_or(|u| u.id != id))
        {
            debug!(loader = self.name, "session changed, clearing trigger");
            self.triggered_for = None;
        }

        let snapshot = Arc::clone(&self.snapshots.borrow_and_update());
        let inputs = GateInputs::observe(&session, &snapshot);
        if !should_load(inputs, self.policy, self.triggered_for.is_some()) {
            return Ok(None);
        }
        let Some(user) = user else {
            return Ok(None);
        };

        info!(loader = self.name, user = %user.id, "session-gated load");
        self.triggered_for = Some(user.id.clone());
        let outcome = self.store.load_for(&user).await;
        self.snapshots.mark_unchanged();
        outcome.map(Some)
    }

    /// Evaluate now and after every session or store change, until
    /// cancelled or either channel closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            if let Err(e) = self.evaluate().await {
                warn!(loader = self.name, error = %e, "session-gated load failed");
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = self.session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(loader = self.name, "loader stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(authenticated: bool, len: usize, loading: bool) -> GateInputs {
        GateInputs {
            authenticated,
            len,
            loading,
            stale: false,
        }
    }

    #[test]
    fn gate_requires_auth_empty_and_idle() {
        let p = LoaderPolicy::WhileEmpty;
        assert!(should_load(inputs(true, 0, false), p, false));
        assert!(!should_load(inputs(false, 0, false), p, false));
        assert!(!should_load(inputs(true, 3, false), p, false));
        assert!(!should_load(inputs(true, 0, true), p, false));
    }

    #[test]
    fn while_empty_ignores_trigger_flag() {
        assert!(should_load(
            inputs(true, 0, false),
            LoaderPolicy::WhileEmpty,
            true
        ));
    }

    #[test]
    fn once_per_session_respects_trigger_flag() {
        let p = LoaderPolicy::OncePerSession;
        assert!(should_load(inputs(true, 0, false), p, false));
        assert!(!should_load(inputs(true, 0, false), p, true));
    }

    #[test]
    fn stale_data_opens_gate() {
        let stale = GateInputs {
            stale: true,
            ..inputs(true, 4, false)
        };
        assert!(should_load(stale, LoaderPolicy::WhileEmpty, false));
        assert!(!should_load(
            GateInputs {
                loading: true,
                ..stale
            },
            LoaderPolicy::WhileEmpty,
            false
        ));
    }

    #[test]
    fn policy_parses_kebab_case() {
        assert_eq!(
            "once-per-session".parse::<LoaderPolicy>().ok(),
            Some(LoaderPolicy::OncePerSession)
        );
        assert_eq!(LoaderPolicy::WhileEmpty.to_string(), "while-empty");
    }
}
