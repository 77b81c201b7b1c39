use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::conversation::models::{Conversation, ConversationSeed, Message, Role};

/// Shared, lockable handle to one session's conversation.
///
/// Holding the lock serializes turns on that session; other sessions are
/// unaffected.
pub type SessionHandle = Arc<Mutex<Conversation>>;

/// Keyed storage of conversations.
///
/// `append` and `update_system_prompt` each take the session lock for one
/// write. A turn that already holds the lock writes through its
/// `SessionHandle` instead, since the lock is not reentrant.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the session's conversation, seeding a new one on first use.
    async fn get_or_create(&self, session_id: &str) -> SessionHandle;

    /// Returns the session's conversation without creating it.
    async fn get(&self, session_id: &str) -> Option<SessionHandle>;

    /// Drops sessions idle for longer than `max_idle` that nobody is using.
    /// Returns how many were removed.
    async fn evict_idle(&self, max_idle: Duration) -> usize;

    async fn session_count(&self) -> usize;

    async fn append(&self, session_id: &str, role: Role, content: String) {
        let handle = self.get_or_create(session_id).await;
        handle.lock().await.append(role, content);
    }

    async fn update_system_prompt(&self, session_id: &str, content: String) {
        let handle = self.get_or_create(session_id).await;
        handle.lock().await.update_system_prompt(content);
    }

    /// History without the system prompt; empty for unknown sessions.
    async fn history(&self, session_id: &str) -> Vec<Message> {
        match self.get(session_id).await {
            Some(handle) => handle.lock().await.history().to_vec(),
            None => Vec::new(),
        }
    }
}

struct SessionEntry {
    conversation: SessionHandle,
    last_seen: Instant,
}

/// Process-local store. Contents are lost on restart.
pub struct InMemoryConversationStore {
    seed: ConversationSeed,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl InMemoryConversationStore {
    pub fn new(seed: ConversationSeed) -> Self {
        Self {
            seed,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_seen = now;
            return entry.conversation.clone();
        }

        info!("Creating conversation for session '{session_id}'");
        let conversation = Arc::new(Mutex::new(Conversation::new(&self.seed)));
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                conversation: conversation.clone(),
                last_seen: now,
            },
        );
        conversation
    }

    async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(session_id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.conversation.clone()
        })
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let now = Instant::now();

        sessions.retain(|session_id, entry| {
            let idle = now.duration_since(entry.last_seen) >= max_idle;
            let in_use = Arc::strong_count(&entry.conversation) > 1;
            if idle && !in_use {
                debug!("Evicting idle session '{session_id}'");
                return false;
            }
            true
        });

        before - sessions.len()
    }

    async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
