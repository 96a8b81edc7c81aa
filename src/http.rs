//! HTTP surface: the single inbound webhook endpoint.
//!
//! Routing stays thin: parse the body by content type, detect the gateway,
//! and hand off to the pipeline. Status codes come from the error taxonomy.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    routing::post,
};
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::{self, Notification};
use crate::pipeline::{Ack, Processor};
use crate::ratelimit::{AttemptLimiter, GovernorAttemptLimiter};
use crate::store::{InMemoryPaymentStore, PaymentStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub processor: Arc<Processor>,
}

impl AppState {
    /// State with the default in-process backends.
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            config,
            Arc::new(InMemoryPaymentStore::new()),
            Arc::new(GovernorAttemptLimiter::new()),
        )
    }

    /// State with injected store and limiter backends.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn PaymentStore>,
        limiter: Arc<dyn AttemptLimiter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            processor: Arc::new(Processor::new(store, limiter)),
        }
    }
}

/// Build the router for the webhook endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/payments/confirm", post(confirm_payment))
        .with_state(state)
}

/// Confirm a payment from an inbound gateway notification.
async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>> {
    let notification = parse_notification(&headers, &body);
    let kind = gateway::detect(&notification)?;

    tracing::debug!(gateway = %kind, "Notification detected");

    let gateway = gateway::for_kind(kind, &state.config);
    let ack = state.processor.process(gateway.as_ref(), &notification).await?;
    Ok(Json(ack))
}

fn parse_notification(headers: &HeaderMap, body: &[u8]) -> Notification {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let notification = if is_json {
        Notification::from_json(body)
    } else {
        Notification::from_form(body)
    };

    match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(auth) => notification.with_authorization(auth),
        None => notification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_notification_json_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let n = parse_notification(&headers, br#"{"merchant_id": 42}"#);
        assert!(n.is_json());
        assert!(n.has("merchant_id"));
    }

    #[test]
    fn test_parse_notification_form_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let n = parse_notification(&headers, b"project=10&invoice=55");
        assert!(!n.is_json());
        assert_eq!(n.int_field("project"), Some(10));
    }

    #[test]
    fn test_parse_notification_defaults_to_form() {
        let headers = HeaderMap::new();
        let n = parse_notification(&headers, b"project=10");
        assert!(!n.is_json());
    }

    #[test]
    fn test_parse_notification_captures_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        let n = parse_notification(&headers, b"project=10");
        assert_eq!(n.authorization(), Some("abc123"));
    }
}
