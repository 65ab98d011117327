use anyhow::{Context, Result};

use crate::profile::generator::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// Every value has a default; the Groq credential is checked lazily by the
/// client accessor so a missing key degrades health instead of aborting boot.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier used when a request does not name one.
    pub model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            model: std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
