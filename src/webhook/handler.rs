//! Inbound webhook endpoint.
//!
//! Authenticates the raw body, then parses and dispatches it. Apart from a
//! bad signature every delivery is acknowledged with 200: GitHub redelivers
//! failed requests, and duplicate comments are worse than a logged error.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use super::AppState;

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
        }
    }
}

/// Acknowledgement body returned for every authenticated delivery.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    fn ok() -> Json<Ack> {
        Json(Ack {
            ok: true,
            error: None,
        })
    }

    fn failed(error: impl ToString) -> Json<Ack> {
        Json(Ack {
            ok: false,
            error: Some(error.to_string()),
        })
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK `{"ok": true}`: handled, or nothing to do for this event
/// - 200 OK `{"ok": false, "error": ...}`: accepted but processing failed
/// - 401 Unauthorized: signature check failed
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, WebhookError> {
    let delivery = header(&headers, HEADER_DELIVERY).unwrap_or("-");
    let event = header(&headers, HEADER_EVENT);
    let span = info_span!("webhook", event = event.unwrap_or("-"), delivery);

    async {
        // Verify the untouched body before any parsing.
        if !app_state
            .signature_policy()
            .check(&body, header(&headers, HEADER_SIGNATURE))
        {
            warn!("rejected webhook delivery with invalid signature");
            return Err(WebhookError::InvalidSignature);
        }

        let Some(event) = event else {
            warn!("delivery without event header");
            return Ok(Ack::failed("missing X-GitHub-Event header"));
        };

        let payload: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "invalid JSON body");
                return Ok(Ack::failed(format!("invalid JSON body: {e}")));
            }
        };

        match app_state.dispatcher().dispatch(event, payload).await {
            Ok(outcome) => {
                info!(?outcome, "delivery processed");
                Ok(Ack::ok())
            }
            Err(e) => {
                error!(error = %e, "delivery failed");
                Ok(Ack::failed(e))
            }
        }
    }
    .instrument(span)
    .await
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignaturePolicy;
    use crate::test_support::{FakeAi, FakeGitHub};
    use crate::webhook::{BotSettings, Dispatcher};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn app_state(policy: SignaturePolicy) -> AppState {
        let dispatcher = Dispatcher::new(
            Arc::new(FakeAi::replying("ok")),
            Arc::new(FakeGitHub::default()),
            BotSettings {
                default_label: "ai-reviewed".to_string(),
                auto_apply_fix: false,
            },
        );
        AppState::new(policy, dispatcher)
    }

    #[tokio::test]
    async fn test_rejected_delivery_is_logged_with_event_and_delivery() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, "issues".parse().unwrap());
        headers.insert(HEADER_DELIVERY, "delivery-42".parse().unwrap());
        headers.insert(HEADER_SIGNATURE, "sha256=00".parse().unwrap());

        let result = webhook_handler(
            State(app_state(SignaturePolicy::Enforce(b"secret".to_vec()))),
            headers,
            Bytes::from_static(b"{}"),
        )
        .await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("invalid signature"));
        assert!(output.contains("event=\"issues\""));
        assert!(output.contains("delivery=\"delivery-42\""));
    }
}
