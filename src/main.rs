// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc};

use chrono::Duration;
use tokio::signal;
use tracing::{info, warn};

use receipt_splitter_server::{
    api::{cors_layer, router},
    auth::TokenIssuer,
    config::AppConfig,
    logging::init_tracing,
    providers::{GoogleVisionClient, OpenAiClient},
    state::AppState,
    storage::Database,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is normal outside local development
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; login and protected routes will return 500");
    }
    if config.google_api_key.is_empty() || config.openai_api_key.is_empty() {
        warn!("GOOGLE_API_KEY or OPENAI_API_KEY is not set; /receipts/parse will fail");
    }

    let db = Database::open(&config.database_path)?;
    let tokens = TokenIssuer::new(config.jwt_secret.clone())
        .with_ttl(Duration::hours(config.jwt_expiry_hours));
    let vision = GoogleVisionClient::new(
        config.vision_api_base_url.clone(),
        config.google_api_key.clone(),
        config.upstream_timeout,
    )?;
    let openai = OpenAiClient::new(
        config.openai_api_base_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.upstream_timeout,
    )?;

    let state = AppState::new(db, tokens, Arc::new(vision), Arc::new(openai));
    let app = router(state, cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Receipt splitter listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
