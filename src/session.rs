//! In-memory session registry, one `SessionState` per visitor.
//!
//! Each session sits behind its own mutex so a visitor's submissions are
//! processed one at a time while different visitors never contend. Sessions
//! nobody has touched for the idle timeout are discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;
use crate::preferences::SessionState;

/// How often the background task looks for idle sessions.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to one session's state.
pub type SessionHandle = Arc<Mutex<SessionState>>;

struct SessionSlot {
    handle: SessionHandle,
    last_active: Instant,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Register a new session and return its id.
    ///
    /// Idle sessions are pruned first.
    pub async fn insert(&self, state: SessionState) -> Uuid {
        let id = state.id;
        let mut sessions = self.sessions.write().await;
        self.prune_locked(&mut sessions);
        sessions.insert(
            id,
            SessionSlot {
                handle: Arc::new(Mutex::new(state)),
                last_active: Instant::now(),
            },
        );
        info!(session = %id, active = sessions.len(), "Session started");
        id
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        slot.last_active = Instant::now();
        Ok(Arc::clone(&slot.handle))
    }

    /// A copy of the session's current state.
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionState, SessionError> {
        let handle = self.get(id).await?;
        let state = handle.lock().await;
        Ok(state.clone())
    }

    /// Discard a session.
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!(session = %id, "Session ended");
                Ok(())
            }
            None => {
                debug!(session = %id, "Remove requested for unknown session");
                Err(SessionError::NotFound(id))
            }
        }
    }

    /// Discard sessions idle for longer than the timeout. Returns how many
    /// were removed.
    pub async fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.prune_locked(&mut sessions)
    }

    // A session whose handle is held elsewhere is mid-turn and stays.
    fn prune_locked(&self, sessions: &mut HashMap<Uuid, SessionSlot>) -> usize {
        let before = sessions.len();
        sessions.retain(|id, slot| {
            let keep = slot.last_active.elapsed() < self.idle_timeout
                || Arc::strong_count(&slot.handle) > 1;
            if !keep {
                debug!(session = %id, "Pruning idle session");
            }
            keep
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Spawn a background task that periodically discards idle sessions.
pub fn spawn_pruning_task(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            store.prune_idle().await;
        }
    })
}
