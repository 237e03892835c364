mod config;
mod error;
mod routes;
mod signature;
mod state;
mod telemetry;
mod whatsapp;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use kharcha_core::{CategoryTable, Classifier};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::whatsapp::WhatsAppClient;

// Cloud API notifications are small; anything larger is not from Meta.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    telemetry::init_tracing(config.log_format)?;

    let table = match &config.category_table_path {
        Some(path) => CategoryTable::from_path(path)
            .with_context(|| format!("failed to load category table from {}", path.display()))?,
        None => CategoryTable::builtin(),
    };
    tracing::info!(
        categories = table.len(),
        source = %config
            .category_table_path
            .as_ref()
            .map_or("builtin".to_string(), |p| p.display().to_string()),
        "Category table loaded"
    );

    if !config.whatsapp_configured() {
        tracing::warn!("WHATSAPP_TOKEN or PHONE_NUMBER_ID is not set; replies will not be sent");
    }
    if config.verify_token.is_none() {
        tracing::warn!("VERIFY_TOKEN is not set; webhook verification will always fail");
    }
    if config.app_secret.is_none() {
        tracing::warn!("WHATSAPP_APP_SECRET is not set; webhook signatures are not checked");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .context("failed to build HTTP client")?;
    let sender = Arc::new(WhatsAppClient::new(http, &config));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;
    let request_timeout = config.request_timeout;

    let state = AppState::new(config, Classifier::new(table), sender);
    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Expense relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("Shutdown signal received, finishing in-flight requests");
}
