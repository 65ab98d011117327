use axum::Json;
use serde_json::{json, Value};

use crate::llm_client;

/// GET /health
/// Reports service status plus whether the Groq credential is usable.
pub async fn health_handler() -> Json<Value> {
    let (status, groq_api) = match llm_client::get_client() {
        Ok(_) => ("ok", "configured".to_string()),
        Err(err) => ("degraded", format!("error: {err}")),
    };

    Json(json!({
        "status": status,
        "service": "hr-profile-api",
        "version": env!("CARGO_PKG_VERSION"),
        "groq_api": groq_api,
    }))
}
