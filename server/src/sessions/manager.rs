//! Registry of open editing sessions.
//!
//! Requests against one session serialize on its mutex; different sessions
//! proceed independently. Sessions nobody touches for a while are swept.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::EditingSession;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<EditingSession>>;

struct SessionEntry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Open sessions, keyed by session ID.
#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Fresh session ID.
    pub fn next_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Store a session and return its handle.
    pub fn insert(&self, session: EditingSession) -> SessionHandle {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, open_sessions = self.sessions.len(), "session opened");
        handle
    }

    /// Look up a session and mark it as seen.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.handle.clone()
        })
    }

    /// Close a session. Returns false if it was not open.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, open_sessions = self.sessions.len(), "session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions not seen for longer than `max_idle`. Returns how many
    /// were dropped.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.sweep_idle_at(Instant::now(), max_idle)
    }

    fn sweep_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) <= max_idle;
            if !keep {
                tracing::info!(session_id = %id, "idle session discarded");
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }
}

/// Sweep idle sessions periodically for the life of the process.
pub fn spawn_idle_sweeper(sessions: Arc<SessionManager>, max_idle: Duration) {
    let period = max_idle.min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let dropped = sessions.sweep_idle(max_idle);
            if dropped > 0 {
                tracing::debug!(dropped, open_sessions = sessions.len(), "idle sweep finished");
            }
        }
    });
}
