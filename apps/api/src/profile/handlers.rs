//! Axum route handlers for the Profile Generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::profile::generator::{
    generate_profile, GenerationRequest, DEFAULT_MAX_TOKENS, DEFAULT_RETRIES, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::state::AppState;

/// Maximum tokens a caller may request in one generation.
pub const MAX_TOKENS_LIMIT: u32 = 4096;
/// Retry ceiling; more attempts only burn quota against a misbehaving model.
pub const RETRIES_LIMIT: u32 = 5;
/// Accepted per-request timeout range in seconds.
pub const TIMEOUT_RANGE_SECS: (f64, f64) = (5.0, 60.0);

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateProfileRequest {
    pub prompt: String,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub timeout: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateProfileResponse {
    pub profile: Value,
    pub raw: String,
    pub model: String,
}

impl GenerateProfileRequest {
    /// Applies defaults and enforces the accepted value ranges.
    fn into_generation_request(self, default_model: &str) -> Result<GenerationRequest, AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt cannot be empty".to_string()));
        }

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Validation(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        let max_tokens = self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 || max_tokens > MAX_TOKENS_LIMIT {
            return Err(AppError::Validation(format!(
                "max_tokens must be between 1 and {MAX_TOKENS_LIMIT}"
            )));
        }

        let retries = self.retries.unwrap_or(DEFAULT_RETRIES);
        if retries > RETRIES_LIMIT {
            return Err(AppError::Validation(format!(
                "retries must be at most {RETRIES_LIMIT}"
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let (min_timeout, max_timeout) = TIMEOUT_RANGE_SECS;
        if !(min_timeout..=max_timeout).contains(&timeout) {
            return Err(AppError::Validation(format!(
                "timeout must be between {min_timeout} and {max_timeout} seconds"
            )));
        }

        Ok(GenerationRequest {
            prompt: self.prompt,
            schema: self.schema,
            model: self.model.unwrap_or_else(|| default_model.to_string()),
            temperature,
            max_tokens,
            retries,
            timeout,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/profiles/generate
///
/// Generates an HR job profile from a natural-language prompt, optionally
/// shaped by a caller-supplied schema template.
pub async fn handle_generate_profile(
    State(state): State<AppState>,
    Json(request): Json<GenerateProfileRequest>,
) -> Result<Json<GenerateProfileResponse>, AppError> {
    let request = request.into_generation_request(&state.config.model)?;
    let result = generate_profile(request, None).await?;

    Ok(Json(GenerateProfileResponse {
        profile: result.profile,
        raw: result.raw,
        model: result.model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(prompt: &str) -> GenerateProfileRequest {
        GenerateProfileRequest {
            prompt: prompt.to_string(),
            schema: None,
            model: None,
            temperature: None,
            max_tokens: None,
            retries: None,
            timeout: None,
        }
    }

    #[test]
    fn defaults_are_applied() {
        let request = body("Hire a data analyst")
            .into_generation_request("test-model")
            .unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.retries, DEFAULT_RETRIES);
        assert_eq!(request.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn explicit_model_wins_over_the_default() {
        let mut payload = body("Hire a data analyst");
        payload.model = Some("other-model".to_string());
        let request = payload.into_generation_request("test-model").unwrap();
        assert_eq!(request.model, "other-model");
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let err = body("   ").into_generation_request("test-model").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let mut payload = body("Hire a data analyst");
        payload.temperature = Some(2.5);
        let err = payload.into_generation_request("test-model").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut payload = body("Hire a data analyst");
        payload.max_tokens = Some(0);
        let err = payload.into_generation_request("test-model").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn retries_above_the_ceiling_are_rejected() {
        let mut payload = body("Hire a data analyst");
        payload.retries = Some(RETRIES_LIMIT + 1);
        let err = payload.into_generation_request("test-model").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn timeout_below_the_minimum_is_rejected() {
        let mut payload = body("Hire a data analyst");
        payload.timeout = Some(1.0);
        let err = payload.into_generation_request("test-model").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
