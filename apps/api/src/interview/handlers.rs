use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::conversation::models::Message;
use crate::errors::AppError;
use crate::interview::prompts::GENERAL_TOPIC;
use crate::interview::Turn;
use crate::state::AppState;

const DEFAULT_SESSION_ID: &str = "default";
const TRANSCRIPT_FILE_NAME: &str = "interview_transcript.txt";

fn session_or_default(session_id: &Option<String>) -> &str {
    session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let topic = req
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(GENERAL_TOPIC);

    let outcome = state
        .coach
        .respond(Turn {
            session_id: session_or_default(&req.session_id),
            user_text: &req.message,
            topic,
            resume_text: req.resume_text.as_deref(),
        })
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.reply,
        messages: outcome.history,
    }))
}

/// POST /api/get-history
/// Unknown sessions yield an empty list rather than an error.
pub async fn handle_get_history(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Json<HistoryResponse> {
    let messages = state.coach.history(session_or_default(&req.session_id)).await;
    Json(HistoryResponse { messages })
}

/// POST /api/download-transcript
pub async fn handle_download_transcript(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let transcript = state
        .coach
        .transcript(session_or_default(&req.session_id))
        .await?;
    Ok(Json(TranscriptResponse { transcript }))
}

/// GET /api/transcript/:session_id
/// Same transcript as a downloadable text file.
pub async fn handle_transcript_file(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transcript = state.coach.transcript(&session_id).await?;
    let disposition = format!("attachment; filename=\"{TRANSCRIPT_FILE_NAME}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults_when_missing_or_blank() {
        assert_eq!(session_or_default(&None), "default");
        assert_eq!(session_or_default(&Some("  ".to_string())), "default");
        assert_eq!(session_or_default(&Some(" abc ".to_string())), "abc");
    }

    #[test]
    fn test_chat_request_fields_are_optional() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.message.is_empty());
        assert!(req.session_id.is_none() && req.topic.is_none() && req.resume_text.is_none());
    }
}
