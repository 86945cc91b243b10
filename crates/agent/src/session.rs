use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use legaltune_core::{ConversationId, SessionState};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct SessionEntry {
    state: Arc<Mutex<SessionState>>,
    last_seen: Instant,
}

/// In-memory per-conversation state. Each conversation's state sits behind
/// its own lock so requests of one chat serialize while different chats run
/// concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ConversationId, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the conversation's state, creating it on first contact, and
    /// marks the conversation as active.
    pub async fn session(&self, conversation: ConversationId) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(conversation).or_insert_with(|| {
            debug!(conversation_id = %conversation, "creating session");
            SessionEntry { state: Arc::new(Mutex::new(SessionState::default())), last_seen: Instant::now() }
        });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.state)
    }

    pub async fn snapshot(&self, conversation: ConversationId) -> Option<SessionState> {
        let state = {
            let sessions = self.sessions.lock().await;
            Arc::clone(&sessions.get(&conversation)?.state)
        };
        let snapshot = state.lock().await.clone();
        Some(snapshot)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops sessions untouched for longer than `idle_ttl`. Sessions with a
    /// request in flight are kept.
    pub async fn prune_idle(&self, idle_ttl: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() <= idle_ttl || Arc::strong_count(&entry.state) > 1
        });
        before - sessions.len()
    }
}
