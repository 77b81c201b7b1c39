pub mod handlers;
pub mod prompts;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::conversation::models::{Message, Role};
use crate::conversation::store::ConversationStore;
use crate::errors::AppError;
use crate::formatter::enforce_format;
use crate::llm_client::ChatModel;
use prompts::{build_system_prompt, PromptContext};

/// One candidate answer, as submitted.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub session_id: &'a str,
    pub user_text: &'a str,
    pub topic: &'a str,
    pub resume_text: Option<&'a str>,
}

#[derive(Debug)]
pub struct TurnOutcome {
    /// Formatted assistant reply.
    pub reply: String,
    /// Conversation after the turn, system prompt excluded.
    pub history: Vec<Message>,
}

/// Runs interview turns against the conversation store and the chat model.
pub struct InterviewCoach {
    store: Arc<dyn ConversationStore>,
    model: Option<Arc<dyn ChatModel>>,
}

impl InterviewCoach {
    /// `model` is `None` when no completion credential is configured; every
    /// turn then fails with `NotConfigured` while history stays readable.
    pub fn new(store: Arc<dyn ConversationStore>, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Processes one turn.
    ///
    /// The session stays locked from prompt assembly until the reply is
    /// stored, so turns on one session never interleave. Nothing is written
    /// unless the model call succeeds.
    pub async fn respond(&self, turn: Turn<'_>) -> Result<TurnOutcome, AppError> {
        if turn.user_text.trim().is_empty() {
            return Err(AppError::EmptyInput);
        }
        let model = self.model.as_ref().ok_or(AppError::NotConfigured)?;

        let handle = self.store.get_or_create(turn.session_id).await;
        let mut conversation = handle.lock().await;

        let system_prompt = build_system_prompt(PromptContext {
            topic: turn.topic,
            resume_text: turn.resume_text,
            include_format_reminder: true,
        });

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.extend_from_slice(conversation.messages());
        if let Some(system) = messages.first_mut() {
            system.content = system_prompt.clone();
        }
        messages.push(Message::new(Role::User, turn.user_text));

        debug!(
            "Session '{}': sending {} messages (topic={})",
            turn.session_id,
            messages.len(),
            turn.topic
        );

        let raw = model.complete(&messages).await.map_err(|e| {
            warn!("Session '{}': completion failed: {e}", turn.session_id);
            AppError::from(e)
        })?;
        let reply = enforce_format(&raw);

        if conversation.system_prompt() != system_prompt {
            debug!("Session '{}': system prompt updated", turn.session_id);
            conversation.update_system_prompt(system_prompt);
        }
        conversation.append(Role::User, turn.user_text);
        conversation.append(Role::Assistant, reply.clone());

        info!(
            "Session '{}': turn {} complete ({} chars)",
            turn.session_id,
            conversation.user_turns(),
            reply.chars().count()
        );

        Ok(TurnOutcome {
            reply,
            history: conversation.history().to_vec(),
        })
    }

    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.store.history(session_id).await
    }

    /// `Interviewer:` / `You:` transcript of a known session.
    pub async fn transcript(&self, session_id: &str) -> Result<String, AppError> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NoConversation(session_id.to_string()))?;
        let transcript = handle.lock().await.transcript();
        Ok(transcript)
    }
}
