//! # TaskChat API Server
//!
//! Task management and chat API: accounts, todo tasks, conversation threads,
//! and a chat endpoint backed by an OpenAI-compatible model.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskchat-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use taskchat_api::{
    app::{build_router, AppState},
    config::Settings,
};
use taskchat_shared::{
    db::{
        pool::{close_pool, create_pool, DatabaseConfig},
        schema::ensure_schema,
    },
    llm::{OpenAiClient, OpenAiConfig},
};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(settings.debug);

    tracing::info!(
        "{} API Server v{} starting...",
        settings.app_name,
        env!("CARGO_PKG_VERSION")
    );

    for name in settings.placeholder_secrets() {
        tracing::warn!(setting = name, "Setting still holds its placeholder default");
    }

    let pool = create_pool(DatabaseConfig {
        max_connections: settings.database_max_connections,
        ..DatabaseConfig::with_url(settings.effective_database_url())
    })
    .await
    .context("Failed to connect to database")?;

    ensure_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    let chat_model = OpenAiClient::new(OpenAiConfig {
        api_key: settings.openai_api_key.clone(),
        model: settings.openai_model.clone(),
        base_url: settings.openai_base_url.clone(),
    })?;

    let bind_address = settings.bind_address();
    let state = AppState::new(pool.clone(), settings, Arc::new(chat_model))?;
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Human-readable logs in debug mode, JSON lines otherwise
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "taskchat_api=debug,taskchat_shared=debug,tower_http=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(debug.then(fmt::layer))
        .with((!debug).then(|| fmt::layer().json()))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
