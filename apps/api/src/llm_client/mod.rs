//! LLM Client: the single point of entry for all chat-completion calls.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
//! No other module builds provider requests; the orchestrator only sees the
//! `ChatModel` trait.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::conversation::models::Message;

pub mod stream;

use stream::{FragmentStream, StreamError};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed event stream: {0}")]
    Stream(#[from] StreamError),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that can turn a message sequence into the assistant's next reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<CompletionChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletion {
    /// Content of the first choice, if the provider sent any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Completion client for OpenAI-compatible providers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

impl LlmClient {
    /// Builds a client from the app config. Returns `Ok(None)` when no API key
    /// is configured; the chat endpoint then answers `NotConfigured`.
    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.groq_api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            base_url: config.groq_base_url.clone(),
            model: config.groq_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: config.stream,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_streaming(&self) -> bool {
        self.stream
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        };

        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, accept)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Single-shot completion returning the whole reply at once.
    pub async fn call(&self, messages: &[Message]) -> Result<String, LlmError> {
        let response = self.send(messages, false).await?;
        let completion: ChatCompletion = serde_json::from_str(&response.text().await?)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion
            .text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    /// Opens a streamed completion. Fragments are pulled with
    /// [`FragmentStream::next_fragment`].
    pub async fn call_streaming(&self, messages: &[Message]) -> Result<FragmentStream, LlmError> {
        let response = self.send(messages, true).await?;
        Ok(FragmentStream::from_response(response))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        debug!(
            "Sending {} messages to {} (stream={})",
            messages.len(),
            self.model,
            self.stream
        );

        if !self.stream {
            return self.call(messages).await;
        }

        let reply = self.call_streaming(messages).await?.collect_text().await?;
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{header::CONTENT_TYPE, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::conversation::models::Role;

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn client_for(base_url: String, stream: bool) -> LlmClient {
        let config = Config::from_lookup(|key| match key {
            "GROQ_API_KEY" => Some("gsk_test".to_string()),
            "GROQ_BASE_URL" => Some(base_url.clone()),
            "LLM_STREAM" => Some(stream.to_string()),
            _ => None,
        })
        .unwrap();
        LlmClient::from_config(&config).unwrap().unwrap()
    }

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::new(Role::System, "You are an interviewer."),
            Message::new(Role::User, "I like Rust."),
        ]
    }

    #[test]
    fn test_missing_key_yields_no_client() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(LlmClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_completion_text_reads_first_choice() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1}
        }))
        .unwrap();
        assert_eq!(completion.text(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_non_streaming_call_returns_content() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["stream"], json!(false));
                assert_eq!(body["messages"][0]["role"], json!("system"));
                assert_eq!(body["messages"][1]["content"], json!("I like Rust."));
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Why Rust?"}}],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 2}
                }))
            }),
        );
        let client = client_for(spawn_provider(router).await, false);

        let reply = client.complete(&sample_messages()).await.unwrap();
        assert_eq!(reply, "Why Rust?");
    }

    #[tokio::test]
    async fn test_streaming_call_concatenates_fragments() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                let body = concat!(
                    "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Why \"}}]}\n\n",
                    ": keep-alive\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Rust?\"}}]}\n\n",
                    "data: [DONE]\n\n",
                );
                ([(CONTENT_TYPE, "text/event-stream")], body)
            }),
        );
        let client = client_for(spawn_provider(router).await, true);

        let reply = client.complete(&sample_messages()).await.unwrap();
        assert_eq!(reply, "Why Rust?");
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "Rate limit reached", "type": "tokens"}})),
                )
                    .into_response()
            }),
        );
        let client = client_for(spawn_provider(router).await, false);

        match client.complete(&sample_messages()).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_reply_is_empty_content() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(json!({"choices": [{"message": {"role": "assistant", "content": "  "}}]}))
            }),
        );
        let client = client_for(spawn_provider(router).await, false);

        assert!(matches!(
            client.complete(&sample_messages()).await,
            Err(LlmError::EmptyContent)
        ));
    }
}
