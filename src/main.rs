use anyhow::{Context, Result};
use callscribe::{create_router, AppState, Config, WsSpeechBackend};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callscribe=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::load("config/callscribe")?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("recognition gateway: {}", cfg.speech.url);
    info!("language: {}", cfg.speech.language_code);
    info!("webhook endpoints: /status and /transcription");

    let speech = Arc::new(WsSpeechBackend::new(cfg.speech.url.clone()));
    let state = AppState::new(cfg.clone(), speech);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
