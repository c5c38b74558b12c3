//! Session store — in-memory registry of sessions keyed by session id.
//!
//! The registry is a sharded `DashMap`, so unrelated sessions never wait on a
//! common lock. Each session sits behind its own fair tokio mutex: operations
//! on one session are serialized in lock arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::model::FormModel;
use super::session::Session;
use super::summary::FlowSummary;

/// A registry entry. `retired` is set when the entry is removed from the map
/// so that a caller who fetched the slot just before removal re-fetches.
struct Slot {
    session: Session,
    retired: bool,
}

type SlotHandle = Arc<Mutex<Slot>>;

/// Owns every session. Construct once and share by `Arc`.
pub struct SessionStore {
    model: Arc<FormModel>,
    sessions: DashMap<String, SlotHandle>,
    created: AtomicU64,
}

impl SessionStore {
    /// Create an empty store whose sessions collect `model`.
    pub fn new(model: Arc<FormModel>) -> Arc<Self> {
        Arc::new(Self {
            model,
            sessions: DashMap::new(),
            created: AtomicU64::new(0),
        })
    }

    pub fn model(&self) -> &FormModel {
        &self.model
    }

    /// Fetch the slot for `id`, creating it under the shard lock if missing.
    fn slot(&self, id: &str) -> SlotHandle {
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            info!(session_id = %id, "Session created");
            Arc::new(Mutex::new(Slot {
                session: Session::new(id, &self.model),
                retired: false,
            }))
        });
        Arc::clone(entry.value())
    }

    /// Run `f` inside the critical section of session `id`, creating the
    /// session on first contact.
    pub async fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session, &FormModel) -> R) -> R {
        loop {
            let slot = self.slot(id);
            let mut guard = slot.lock().await;
            if guard.retired {
                debug!(session_id = %id, "Slot retired while waiting, re-fetching");
                continue;
            }
            return f(&mut guard.session, &self.model);
        }
    }

    /// Like [`SessionStore::with_session`] but never creates: `None` if `id`
    /// is unknown.
    pub async fn with_existing<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session, &FormModel) -> R,
    ) -> Option<R> {
        let slot = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        let mut guard = slot.lock().await;
        if guard.retired {
            return None;
        }
        Some(f(&mut guard.session, &self.model))
    }

    /// Snapshot of the session for `id`, created if this is first contact.
    pub async fn get_or_create(&self, id: &str) -> FlowSummary {
        self.with_session(id, |session, model| FlowSummary::capture(session, model))
            .await
    }

    /// Record inbound activity on `id` and return its snapshot.
    ///
    /// Creates the session on first contact. Keeps sessions that receive
    /// messages without changing state out of the idle sweep.
    pub async fn touch(&self, id: &str) -> FlowSummary {
        self.with_session(id, |session, model| {
            session.mark_seen();
            FlowSummary::capture(session, model)
        })
        .await
    }

    /// Snapshot of an existing session, taken under its lock.
    pub async fn summarize(&self, id: &str) -> Option<FlowSummary> {
        self.with_existing(id, |session, model| FlowSummary::capture(session, model))
            .await
    }

    /// Reset a known session to its initial state. Returns false for unknown ids.
    pub async fn reset(&self, id: &str) -> bool {
        let found = self
            .with_existing(id, |session, model| session.reset(model))
            .await
            .is_some();
        if found {
            info!(session_id = %id, "Session reset");
        }
        found
    }

    /// Drop a session entirely.
    pub async fn remove(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, slot)) => {
                slot.lock().await.retired = true;
                info!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    /// Remove sessions with no inbound activity for at least `idle_timeout`.
    ///
    /// Sessions whose lock is currently held are skipped until the next sweep.
    /// Returns the number of sessions evicted.
    pub fn evict_idle(&self, idle_timeout: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(idle_timeout)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut evicted = 0;
        self.sessions.retain(|id, slot| {
            let Ok(mut guard) = slot.try_lock() else {
                return true;
            };
            if guard.session.last_seen > cutoff {
                return true;
            }
            guard.retired = true;
            evicted += 1;
            debug!(session_id = %id, "Session evicted");
            false
        });

        if evicted > 0 {
            info!(count = evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Total sessions ever created by this store.
    pub fn created_total(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

/// Spawn a background task that periodically evicts idle sessions.
pub fn spawn_eviction_task(
    store: Arc<SessionStore>,
    idle_timeout: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            store.evict_idle(idle_timeout);
        }
    })
}
