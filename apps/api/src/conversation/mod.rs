// Conversation state: role-tagged messages per session and the store that owns them.

pub mod models;
pub mod store;
