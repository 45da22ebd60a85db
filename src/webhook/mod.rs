//! HTTP server for the bot.
//!
//! # Endpoints
//!
//! - `POST /webhook` - GitHub webhook deliveries
//! - `GET /` - banner
//! - `GET /health` - liveness probe

use std::sync::Arc;

pub mod dispatch;
pub mod handler;

pub use dispatch::{BotSettings, Dispatcher};
pub use handler::webhook_handler;

use crate::signature::SignaturePolicy;

/// Shared application state, passed to handlers via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    signature_policy: SignaturePolicy,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(signature_policy: SignaturePolicy, dispatcher: Dispatcher) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                signature_policy,
                dispatcher,
            }),
        }
    }

    pub fn signature_policy(&self) -> &SignaturePolicy {
        &self.inner.signature_policy
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }
}

pub async fn root_handler() -> &'static str {
    "GitHub Bot is running"
}

pub async fn health_handler() -> &'static str {
    "OK"
}

/// Largest webhook body accepted, matching GitHub's 25 MB payload cap.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/webhook",
            post(webhook_handler).layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES)),
        )
        .with_state(app_state)
}
