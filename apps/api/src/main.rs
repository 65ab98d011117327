use std::net::SocketAddr;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::config::Config;
use api::llm_client;
use api::profile::schema;
use api::routes::build_router;
use api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HR Profile API v{}", env!("CARGO_PKG_VERSION"));

    // The default schema template must be readable before accepting traffic.
    let default_schema =
        schema::default_schema().context("failed to load the default profile schema")?;
    info!(
        "Default profile schema loaded ({} top-level fields)",
        default_schema
            .as_object()
            .map(|fields| fields.len())
            .unwrap_or(0)
    );

    match llm_client::get_client() {
        Ok(_) => info!("Groq client initialized (model: {})", config.model),
        Err(err) => warn!("Groq client unavailable: {err}"),
    }

    let state = AppState {
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
