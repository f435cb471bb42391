//! HTTP receiver for Telegram webhook deliveries.
//!
//! Every POST to the webhook path is answered with `200 {"status":"ok"}`,
//! whether or not the body parses and whether or not the reply goes out.
//! Telegram redelivers anything it does not see acknowledged.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::telegram::Update;

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    status: &'static str,
}

impl Ack {
    pub const fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// Parse the raw body and dispatch it. Takes bytes rather than `Json<_>`
/// so a malformed body or missing content type still gets acknowledged,
/// and keeps the rejection so an oversized or unreadable body does too.
async fn receive(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Json<Ack> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Unreadable webhook body: {}", rejection.body_text());
            return Json(Ack::ok());
        }
    };

    debug!("Webhook payload: {}", String::from_utf8_lossy(&body));

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let outcome = state.dispatcher.dispatch(&update).await;
            debug!("Update {:?} handled: {:?}", update.update_id, outcome);
        }
        Err(e) => {
            warn!(
                "Malformed webhook payload ({}): {}",
                e,
                String::from_utf8_lossy(&body)
            );
        }
    }

    Json(Ack::ok())
}

pub fn router(dispatcher: Arc<Dispatcher>, webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(health))
        .route(webhook_path, post(receive))
        .with_state(AppState { dispatcher })
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &ServerConfig, dispatcher: Arc<Dispatcher>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_addr()?;
    let app = router(dispatcher, &config.webhook_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        "Webhook receiver listening on http://{}{}",
        listener.local_addr().unwrap_or(addr),
        config.webhook_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Webhook receiver stopped");
    Ok(())
}
