/// LLM Client — the single point of entry for all Groq API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Groq API directly.
/// All completion requests MUST go through this module.
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the Groq Cloud API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error(
        "GROQ_API_KEY environment variable is not set. Create an API key in Groq Cloud \
         and export it before running the service."
    )]
    MissingApiKey,

    #[error("Groq authentication failed. Confirm that GROQ_API_KEY is present and valid.")]
    Authentication,

    #[error("request timed out after {seconds} seconds. Try a shorter prompt or lower max_tokens.")]
    Timeout { seconds: f64 },

    #[error("Groq rejected the request (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Message role on the chat completion wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message in a conversation transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Requests a JSON-object-shaped completion. Not every model honors it;
/// the orchestrator handles the rejection path.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object",
        }
    }
}

/// One chat completion request as sent to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Per-attempt time budget in seconds; applied to the HTTP call, never serialized.
    #[serde(skip)]
    pub timeout: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletion {
    /// Extracts the text content of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct GroqErrorEnvelope {
    error: GroqErrorBody,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
}

/// Completion capability seam. Production code uses [`GroqClient`]; tests
/// inject stubs to script endpoint behavior.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError>;
}

/// The single completion client used by all generation calls.
/// Wraps the Groq chat completions API (OpenAI-compatible wire format).
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, GROQ_BASE_URL.to_string())
    }

    /// Point the client at an alternative endpoint. Used by tests.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let timeout = request.timeout;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs_f64(timeout))
            .json(&request)
            .send()
            .await
            .map_err(|err| classify_transport_error(err, timeout))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::Authentication);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Surface the endpoint's own message when the body is the usual envelope.
            let message = serde_json::from_str::<GroqErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|err| classify_transport_error(err, timeout))?;

        if let Some(usage) = &completion.usage {
            debug!(
                "chat completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(completion)
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: f64) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout { seconds: timeout }
    } else {
        LlmError::Http(err)
    }
}

static CLIENT: OnceLock<GroqClient> = OnceLock::new();

/// Read the Groq API key from the environment.
pub fn ensure_api_key() -> Result<String, LlmError> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::MissingApiKey),
    }
}

/// Return the process-wide Groq client, creating it on first use.
///
/// The `OnceLock` guarantees at most one client is constructed even when the
/// first calls race; every caller observes the same handle afterwards.
pub fn get_client() -> Result<&'static GroqClient, LlmError> {
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let api_key = ensure_api_key()?;
    Ok(CLIENT.get_or_init(|| GroqClient::new(api_key)))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            messages: vec![
                ChatMessage::system("You produce JSON."),
                ChatMessage::user("Draft a profile."),
            ],
            temperature: 0.3,
            max_tokens: 64,
            response_format: Some(ResponseFormat::json_object()),
            timeout: 5.0,
        }
    }

    fn client_for(server: &MockServer) -> GroqClient {
        GroqClient::with_base_url("gsk-test".to_string(), server.uri())
    }

    #[tokio::test]
    async fn chat_returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
            })))
            .mount(&server)
            .await;

        let completion = client_for(&server).chat(request()).await.unwrap();
        assert_eq!(completion.text(), Some("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid API Key"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).chat(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication));
    }

    #[tokio::test]
    async fn bad_request_surfaces_endpoint_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "response_format is not supported for this model"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).chat(request()).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("response_format"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn server_error_keeps_raw_body_as_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).chat(request()).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let mut slow = request();
        slow.timeout = 0.2;
        let err = client_for(&server).chat(slow).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
    }

    #[test]
    #[serial]
    fn get_client_memoizes_exactly_one_handle() {
        temp_env::with_var(API_KEY_ENV, None::<&str>, || {
            assert!(matches!(get_client(), Err(LlmError::MissingApiKey)));
            assert!(matches!(get_client(), Err(LlmError::MissingApiKey)));
        });
        temp_env::with_var(API_KEY_ENV, Some("   "), || {
            assert!(matches!(get_client(), Err(LlmError::MissingApiKey)));
        });
        temp_env::with_var(API_KEY_ENV, Some("gsk-test"), || {
            let addresses: Vec<usize> = std::thread::scope(|scope| {
                (0..8)
                    .map(|_| scope.spawn(|| get_client().unwrap() as *const GroqClient as usize))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .collect()
            });
            assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
        });
    }
}
