//! In-memory interaction sessions.
//!
//! Each visitor gets its own [`Interaction`] behind an async mutex, so a session
//! is never driven by two requests at once. Sessions are not persisted, and a
//! session nobody has touched for the idle timeout is evicted along with its
//! image.

use crate::orchestrator::Interaction;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<Interaction>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Start a session. Idle sessions are pruned first so the map cannot grow
    /// without bound between sweeps.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        Self::prune(&mut sessions, self.idle_timeout);
        sessions.insert(
            id,
            Entry {
                handle: Arc::new(Mutex::new(Interaction::new())),
                last_seen: Instant::now(),
            },
        );
        debug!(session = %id, active = sessions.len(), "Session created");
        id
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop every session idle for longer than the timeout. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let evicted = Self::prune(&mut sessions, self.idle_timeout);
        if evicted > 0 {
            info!(evicted, active = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    fn prune(sessions: &mut HashMap<Uuid, Entry>, idle_timeout: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= idle_timeout);
        before - sessions.len()
    }
}

/// Periodically evict idle sessions for as long as the store is alive.
pub fn spawn_sweeper(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    let weak = Arc::downgrade(&store);
    let period = store.idle_timeout().max(Duration::from_secs(1));
    drop(store);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(store) = weak.upgrade() else {
                break;
            };
            store.evict_idle().await;
        }
    })
}
