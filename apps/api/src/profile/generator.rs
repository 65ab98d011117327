//! Completion Orchestrator — drives the chat completion loop that turns a
//! natural-language prompt into a parsed JSON profile.
//!
//! Model output is not guaranteed to be well-formed JSON even when asked, so
//! parse failures are retried with a reinforced instruction up to a bounded
//! attempt count. Endpoint failures are never retried: authentication and
//! timeout outcomes would recur unchanged, and other provider errors carry
//! their own diagnostics.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::{
    get_client, ChatCompletion, ChatMessage, ChatRequest, CompletionClient, LlmError,
    ResponseFormat,
};
use crate::profile::json::strip_code_fences;
use crate::profile::prompts::{build_system_prompt, JSON_REMINDER};
use crate::profile::schema;

pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
/// Kept low for faster responses on free tiers.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_RETRIES: u32 = 2;
/// 25 seconds, staying under the 30 second free tier ceiling.
pub const DEFAULT_TIMEOUT_SECS: f64 = 25.0;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("failed to parse JSON from model response after {attempts} attempts")]
    ParseExhausted {
        attempts: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("failed to read schema file {path}: {source}")]
    SchemaIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parameters for one profile generation call. Constructed at the hosting
/// boundary (HTTP handler or CLI), which enforces the value ranges.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Option<Value>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retries: u32,
    pub timeout: f64,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            schema: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A successfully generated profile.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// The parsed JSON document.
    pub profile: Value,
    /// The cleaned response text exactly as parsed.
    pub raw: String,
    /// The model identifier that produced it.
    pub model: String,
}

/// Generate an HR profile for the given request.
///
/// A supplied schema must be a JSON object; when absent the default template
/// is used. When no client is injected the process-wide Groq client is used.
pub async fn generate_profile(
    mut request: GenerationRequest,
    client: Option<&dyn CompletionClient>,
) -> Result<GenerationResult, ProfileError> {
    match &request.schema {
        Some(supplied) => schema::ensure_object(supplied)?,
        None => request.schema = Some(schema::default_schema()?.clone()),
    }

    let (profile, raw) = match client {
        Some(client) => call_completion(client, &request).await?,
        None => call_completion(get_client()?, &request).await?,
    };

    Ok(GenerationResult {
        profile,
        raw,
        model: request.model,
    })
}

/// Invoke the chat completion endpoint and parse the JSON response.
///
/// Runs `retries + 1` sequential attempts. A parse failure appends a
/// corrective system reminder to the transcript before the next attempt;
/// endpoint failures abort immediately with their own error kind.
pub async fn call_completion(
    client: &dyn CompletionClient,
    request: &GenerationRequest,
) -> Result<(Value, String), ProfileError> {
    let system_prompt = build_system_prompt(request.schema.as_ref());
    let mut transcript = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(request.prompt.clone()),
    ];

    let mut last_error: Option<serde_json::Error> = None;
    for attempt in 0..=request.retries {
        let completion = send_attempt(client, request, &transcript).await?;
        let cleaned = strip_code_fences(completion.text().unwrap_or_default());
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(parsed) => return Ok((parsed, cleaned)),
            Err(err) => {
                debug!("attempt {attempt} returned invalid JSON: {err}");
                last_error = Some(err);
                transcript.push(ChatMessage::system(JSON_REMINDER));
            }
        }
    }

    Err(ProfileError::ParseExhausted {
        attempts: request.retries + 1,
        source: last_error.expect("last_error is set after every failed attempt"),
    })
}

/// One attempt: send with JSON mode requested; when the endpoint rejects the
/// `response_format` option, resend once without it. The resend shares the
/// attempt slot and is not retried further.
async fn send_attempt(
    client: &dyn CompletionClient,
    request: &GenerationRequest,
    transcript: &[ChatMessage],
) -> Result<ChatCompletion, LlmError> {
    let chat_request = ChatRequest {
        model: request.model.clone(),
        messages: transcript.to_vec(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format: Some(ResponseFormat::json_object()),
        timeout: request.timeout,
    };

    match client.chat(chat_request.clone()).await {
        Ok(completion) => Ok(completion),
        Err(LlmError::Api {
            status: 400,
            message,
        }) if message.contains("response_format") => {
            debug!("model rejected response_format; resending without JSON mode");
            client
                .chat(ChatRequest {
                    response_format: None,
                    ..chat_request
                })
                .await
        }
        Err(err) => Err(err),
    }
}
