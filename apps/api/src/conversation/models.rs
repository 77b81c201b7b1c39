use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Initial content every new conversation starts with.
#[derive(Debug, Clone)]
pub struct ConversationSeed {
    pub system_prompt: String,
    pub greeting: String,
}

/// Ordered message log of one interview session.
///
/// Index 0 is always the system instruction. It is replaced in place on every
/// turn and is never part of [`Conversation::history`].
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(seed: &ConversationSeed) -> Self {
        Self {
            messages: vec![
                Message::new(Role::System, seed.system_prompt.clone()),
                Message::new(Role::Assistant, seed.greeting.clone()),
            ],
        }
    }

    /// Every message, system prompt included, as sent to the model.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    pub fn update_system_prompt(&mut self, content: impl Into<String>) {
        self.messages[0].content = content.into();
    }

    /// Messages after the system prompt, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Number of answers the candidate has given so far.
    pub fn user_turns(&self) -> usize {
        self.history()
            .iter()
            .filter(|m| m.role == Role::User)
            .count()
    }

    /// Plain-text transcript: `Interviewer:` for assistant messages, `You:` otherwise.
    pub fn transcript(&self) -> String {
        self.history()
            .iter()
            .map(|m| {
                let speaker = match m.role {
                    Role::Assistant => "Interviewer",
                    _ => "You",
                };
                format!("{speaker}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
