pub mod session;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::dao::{kv_store::KeyValueStore, session_repository::SessionRepository};

pub use self::sse::SseHub;
pub use self::state_machine::{Command, DispatchOutcome, Snapshot};
use self::{session::Session, state_machine::SessionStateMachine};

/// Handle shared by every route and background task.
pub type SharedState = Arc<AppState>;

/// Default capacity of the session SSE broadcast channel.
pub const DEFAULT_SSE_CAPACITY: usize = 16;

/// What a single dispatch did, as seen under the session lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Session and version right after the command.
    pub snapshot: Snapshot,
    /// Whether the command changed the session.
    pub outcome: DispatchOutcome,
    /// New value of the degraded flag when this dispatch flipped it.
    pub degraded_changed: Option<bool>,
}

/// Explicit owner of the session state machine, its persistence and its event hub.
///
/// Every consumer receives a [`SharedState`] handle; nothing reaches the session
/// through ambient globals.
pub struct AppState {
    machine: RwLock<SessionStateMachine>,
    repository: SessionRepository,
    sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct the state around an already restored session.
    pub fn new(
        session: Session,
        repository: SessionRepository,
        sse_capacity: usize,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            machine: RwLock::new(SessionStateMachine::new(session)),
            repository,
            sse: SseHub::new(sse_capacity),
            degraded: degraded_tx,
        })
    }

    /// Restore the session stored under `key` (or start fresh) and wrap it in a handle.
    pub async fn restore(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<Arc<str>>,
        sse_capacity: usize,
    ) -> SharedState {
        let repository = SessionRepository::new(store, key);
        let session = repository.load_or_default().await;
        info!(
            key = repository.key(),
            players = session.len(),
            hide_totals = session.hide_totals(),
            "session ready"
        );
        Self::new(session, repository, sse_capacity)
    }

    /// Snapshot the current session and version.
    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Apply `command` and persist the result when it changed the session.
    pub async fn dispatch(&self, command: Command) -> (Snapshot, DispatchOutcome) {
        let report = self.dispatch_with(command, |_| {}).await;
        (report.snapshot, report.outcome)
    }

    /// Like [`AppState::dispatch`], running `on_commit` before the session lock is released.
    ///
    /// The write guard is held across the save and the callback, so stored snapshots
    /// and anything `on_commit` publishes follow the order in which commands were applied.
    pub async fn dispatch_with<F>(&self, command: Command, on_commit: F) -> DispatchReport
    where
        F: FnOnce(&DispatchReport),
    {
        let mut machine = self.machine.write().await;
        let outcome = machine.dispatch(&command);
        debug!(command = command.kind(), ?outcome, "command dispatched");

        let mut degraded_changed = None;
        if outcome.is_changed() {
            let saved = self.repository.save(machine.session()).await;
            if self.update_degraded(!saved) {
                degraded_changed = Some(!saved);
            }
        }

        let report = DispatchReport {
            snapshot: machine.snapshot(),
            outcome,
            degraded_changed,
        };
        on_commit(&report);
        report
    }

    /// Persistence adapter backing this state.
    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    /// Broadcast hub used for the session SSE stream.
    pub fn session_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Whether the last persistence attempt failed.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    ///
    /// Returns whether the flag flipped.
    pub(crate) fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}
