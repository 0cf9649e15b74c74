use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use edbot_core::{ChatSession, Resources};
use edbot_llm::LlmProvider;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub(crate) const MAX_SESSIONS: usize = 10_000;
pub(crate) const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub(crate) type SharedSession<P> = Arc<Mutex<ChatSession<P>>>;

struct SessionEntry<P: LlmProvider> {
    session: SharedSession<P>,
    last_used: Instant,
}

impl<P: LlmProvider> SessionEntry<P> {
    /// A handler still holding the session keeps it alive regardless of age.
    fn is_live(&self, now: Instant, idle_timeout: Duration) -> bool {
        Arc::strong_count(&self.session) > 1
            || now.duration_since(self.last_used) < idle_timeout
    }
}

/// In-memory sessions keyed by id. Each session is locked for a whole turn,
/// so submissions to one session run one at a time.
///
/// Sessions untouched for `idle_timeout` are evicted once the store reaches
/// its limit.
pub(crate) struct SessionStore<P: LlmProvider> {
    sessions: RwLock<HashMap<Uuid, SessionEntry<P>>>,
    limit: usize,
    idle_timeout: Duration,
}

impl<P: LlmProvider> SessionStore<P> {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            limit,
            idle_timeout: SESSION_IDLE_TIMEOUT,
        }
    }

    #[must_use]
    pub(crate) fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Open a fresh session, or `None` when the store is full of live sessions.
    pub(crate) async fn create(
        &self,
        resources: Arc<Resources<P>>,
    ) -> Option<(Uuid, SharedSession<P>)> {
        self.create_at(resources, Instant::now()).await
    }

    pub(crate) async fn create_at(
        &self,
        resources: Arc<Resources<P>>,
        now: Instant,
    ) -> Option<(Uuid, SharedSession<P>)> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.limit {
            let before = sessions.len();
            sessions.retain(|_, entry| entry.is_live(now, self.idle_timeout));
            let evicted = before - sessions.len();
            if evicted > 0 {
                tracing::debug!(evicted, "evicted idle sessions");
            }
        }
        if sessions.len() >= self.limit {
            tracing::warn!(limit = self.limit, "session limit reached");
            return None;
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(resources)));
        sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&session),
                last_used: now,
            },
        );
        Some((id, session))
    }

    pub(crate) async fn get(&self, id: Uuid) -> Option<SharedSession<P>> {
        self.get_at(id, Instant::now()).await
    }

    /// Look up a session and mark it used at `now`.
    pub(crate) async fn get_at(&self, id: Uuid, now: Instant) -> Option<SharedSession<P>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_used = now;
        Some(Arc::clone(&entry.session))
    }

    /// Drop a session; `false` if it did not exist.
    pub(crate) async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub(crate) async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
