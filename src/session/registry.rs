use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::controller::SessionController;
use crate::gateway::PoemGenerationGateway;

pub type SessionId = Uuid;

struct Entry {
    controller: Arc<SessionController>,
    last_seen: Instant,
}

/// In-memory map of browser sessions to their controllers.
///
/// Sessions idle for longer than `idle_ttl` are dropped by [`sweep`], and
/// the least recently used one makes room when `capacity` is reached.
///
/// [`sweep`]: SessionRegistry::sweep
pub struct SessionRegistry {
    gateway: PoemGenerationGateway,
    idle_ttl: Duration,
    capacity: usize,
    sessions: Mutex<HashMap<SessionId, Entry>>,
}

impl SessionRegistry {
    pub fn new(gateway: PoemGenerationGateway, idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            gateway,
            idle_ttl,
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create(&self) -> (SessionId, Arc<SessionController>) {
        let id = Uuid::new_v4();
        let controller = Arc::new(SessionController::new(self.gateway.clone()));

        let mut sessions = self.lock();
        if sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                info!(session = %oldest, capacity = self.capacity, "session evicted to make room");
            }
        }
        sessions.insert(
            id,
            Entry {
                controller: controller.clone(),
                last_seen: Instant::now(),
            },
        );
        drop(sessions);

        info!(session = %id, backend = self.gateway.backend_name(), "session started");
        (id, controller)
    }

    /// Looks a session up and marks it as used.
    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionController>> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.controller.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops idle sessions and returns how many went. A session waiting on
    /// a poem is kept.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_seen) < self.idle_ttl
                || entry.controller.snapshot().is_loading()
        });
        before - sessions.len()
    }

    /// Runs [`sweep`](Self::sweep) every `period` until the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = self.sweep();
                if evicted > 0 {
                    debug!(evicted, remaining = self.len(), "idle sessions swept");
                }
            }
        })
    }
}
