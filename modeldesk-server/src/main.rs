//! Modeldesk Server
//!
//! Admin console for configuring AI model providers and platform branding.

mod api;
mod error;
mod state;

use std::sync::Arc;

use modeldesk_core::{AppConfig, CredentialValidator, Database, StaticSecret};
use tokio::net::TcpListener;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modeldesk=debug".parse()?)
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Modeldesk v{}", modeldesk_core::VERSION);

    let config = AppConfig::load()?;

    let secret = StaticSecret::new(config.secrets.passphrase.clone());
    if secret.is_default() {
        tracing::warn!(
            "Using the built-in secret passphrase; set MODELDESK__SECRETS__PASSPHRASE to protect stored keys"
        );
    }

    let db_path = config.database_path()?;
    let db = Database::open_at(db_path)?;
    db.migrate()?;
    tracing::info!(path = %db.path().display(), "Database ready");

    let validator = CredentialValidator::with_timeout(config.probe.timeout());
    let state = Arc::new(AppState::new(
        db,
        &secret,
        validator,
        config.storage.env_file.clone(),
    ));

    let listener = TcpListener::bind(config.bind_address()).await?;
    let url = format!("http://{}", listener.local_addr()?);
    tracing::info!(%url, "Modeldesk console listening");

    if config.server.open_browser {
        if let Err(e) = webbrowser::open(&url) {
            tracing::warn!(error = %e, "Failed to open browser");
        }
    }

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Modeldesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
