use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use kharcha_core::{format_reply, Classification, Extractor};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    signature::{verify_signature, SIGNATURE_HEADER},
    state::AppState,
    whatsapp::WebhookPayload,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .route("/test", post(classify_text))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Meta subscription handshake: echo the challenge when the token matches.
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> AppResult<String> {
    let mode = params.mode.as_deref().filter(|m| !m.is_empty());
    let token = params.verify_token.as_deref().filter(|t| !t.is_empty());
    let (Some(mode), Some(token)) = (mode, token) else {
        return Err(AppError::BadRequest(
            "Missing hub.mode or hub.verify_token".to_string(),
        ));
    };

    if mode == "subscribe" && state.config.verify_token.as_deref() == Some(token) {
        tracing::info!("Webhook verified successfully");
        Ok(params.challenge.unwrap_or_default())
    } else {
        Err(AppError::Forbidden("Webhook verification failed".to_string()))
    }
}

/// Inbound notifications: classify each text message and reply to its sender.
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    if let Some(secret) = state.config.app_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, header) {
            return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    for message in payload.text_messages() {
        tracing::info!(from = %message.from, "Received message");
        tracing::debug!(from = %message.from, text = %message.body, "Message body");

        let result = state.classifier.classify(message.body);
        let reply = format_reply(&result, message.body);
        let rule = amount_rule(message.body);

        match state.sender.send_text(message.from, &reply).await {
            Ok(response) => tracing::info!(
                to = %message.from,
                category = %result.category,
                confidence = result.confidence,
                amount_rule = %rule,
                response = %response,
                "Sent reply"
            ),
            Err(e) => tracing::error!(to = %message.from, error = %e, "Failed to send reply"),
        }
    }

    Ok(Json(json!({ "status": "success" })))
}

/// Name of the amount rule that fired, for logs.
fn amount_rule(text: &str) -> String {
    Extractor::extract_with_pattern(text)
        .map_or_else(|| "none".to_string(), |(_, pattern)| pattern.to_string())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "WhatsApp Expense Bot",
        "categories": state.classifier.table().len(),
        "now": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    text: Option<String>,
}

/// Classify arbitrary text without going through WhatsApp.
///
/// The body is parsed by hand so malformed input gets the same JSON error
/// body as every other handler error.
async fn classify_text(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Classification>> {
    let request: ClassifyRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;
    let text = request
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("No text provided".to_string()))?;
    Ok(Json(state.classifier.classify(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::signature::sign;
    use crate::whatsapp::mock::MockSender;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use kharcha_core::Classifier;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig {
            verify_token: Some("verify-me".to_string()),
            ..AppConfig::default()
        }
    }

    fn app_with(config: AppConfig, sender: Arc<MockSender>) -> Router {
        router(AppState::new(config, Classifier::default(), sender))
    }

    fn app() -> (Router, Arc<MockSender>) {
        let sender = Arc::new(MockSender::default());
        (app_with(test_config(), sender.clone()), sender)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn text_notification(from: &str, text: &str) -> String {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{
                "field": "messages",
                "value": { "messages": [{
                    "from": from,
                    "type": "text",
                    "text": { "body": text }
                }] }
            }] }]
        })
        .to_string()
    }

    // ── Verification handshake ────────────────────────────────────────────────

    #[tokio::test]
    async fn verify_echoes_challenge() {
        let (app, _) = app();
        let (status, body) = send(
            app,
            get_request("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"1158201444");
    }

    #[tokio::test]
    async fn verify_rejects_wrong_token() {
        let (app, _) = app();
        let (status, _) = send(
            app,
            get_request("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verify_rejects_wrong_mode() {
        let (app, _) = app();
        let (status, _) = send(
            app,
            get_request("/webhook?hub.mode=unsubscribe&hub.verify_token=verify-me"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verify_without_params_is_bad_request() {
        let (app, _) = app();
        let (status, _) = send(app.clone(), get_request("/webhook")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(app, get_request("/webhook?hub.mode=subscribe&hub.verify_token=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_fails_when_no_token_configured() {
        let app = app_with(AppConfig::default(), Arc::new(MockSender::default()));
        let (status, _) = send(
            app,
            get_request("/webhook?hub.mode=subscribe&hub.verify_token=anything"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // ── Inbound messages ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn text_message_gets_categorized_reply() {
        let (app, sender) = app();
        let (status, body) = send(
            app,
            post_json("/webhook", &text_notification("919812345678", "Uber ride cost 180")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "success");

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "919812345678");
        assert!(sent[0].1.contains("📊 *Category:* 🚕 Transport"));
        assert!(sent[0].1.contains("💵 *Amount:* ₹180.00"));
    }

    #[tokio::test]
    async fn other_objects_are_acknowledged_without_reply() {
        let (app, sender) = app();
        let (status, _) = send(app, post_json("/webhook", r#"{"object":"page","entry":[]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_request() {
        let (app, sender) = app();
        let (status, body) = send(app, post_json("/webhook", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("Invalid webhook payload"));
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_send_still_acknowledges_webhook() {
        let sender = Arc::new(MockSender::failing());
        let app = app_with(test_config(), sender.clone());
        let (status, _) = send(app, post_json("/webhook", &text_notification("1", "lunch 120"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn signature_required_when_secret_configured() {
        let sender = Arc::new(MockSender::default());
        let config = AppConfig {
            app_secret: Some("app-secret".to_string()),
            ..test_config()
        };
        let app = app_with(config, sender.clone());
        let body = text_notification("1", "netflix 649");

        let (status, _) = send(app.clone(), post_json("/webhook", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(sender.sent().is_empty());

        let mut signed = post_json("/webhook", &body);
        signed.headers_mut().insert(
            SIGNATURE_HEADER,
            sign("app-secret", body.as_bytes()).parse().unwrap(),
        );
        let (status, _) = send(app, signed).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sender.sent().len(), 1);
    }

    // ── Health and test endpoint ──────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_healthy() {
        let (app, _) = app();
        let (status, body) = send(app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["categories"], 9);
    }

    #[tokio::test]
    async fn test_endpoint_returns_classification() {
        let (app, sender) = app();
        let (status, body) = send(
            app,
            post_json("/test", r#"{"text":"paid Rs. 99.50 for netflix subscription"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result: Classification = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.category, "Bills");
        assert_eq!(result.confidence, 4);
        assert_eq!(
            result.amount.map(|a| a.amount()),
            Some(rust_decimal::Decimal::new(9950, 2))
        );
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_requires_text() {
        let (app, _) = app();
        for body in [r#"{}"#, r#"{"text":""}"#] {
            let (status, resp) = send(app.clone(), post_json("/test", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let json: Value = serde_json::from_slice(&resp).unwrap();
            assert_eq!(json["error"], "No text provided");
        }
    }

    #[tokio::test]
    async fn test_endpoint_malformed_body_is_json_error() {
        let (app, _) = app();
        for body in [r#"{"text":123}"#, "", "not json"] {
            let (status, resp) = send(app.clone(), post_json("/test", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            let json: Value = serde_json::from_slice(&resp).unwrap();
            assert!(json["error"].as_str().unwrap().starts_with("Invalid request body"));
        }

        let plain = Request::builder()
            .method("POST")
            .uri("/test")
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"text":"lunch 120"}"#))
            .unwrap();
        let (status, resp) = send(app, plain).await;
        assert_eq!(status, StatusCode::OK);
        let result: Classification = serde_json::from_slice(&resp).unwrap();
        assert_eq!(result.category, "Food");
    }

    #[test]
    fn amount_rule_names_the_matching_pattern() {
        assert_eq!(amount_rule("Uber ride cost 180"), "spend_verb");
        assert_eq!(amount_rule("₹२५० pizza"), "rupee_sign");
        assert_eq!(amount_rule("dinner with friends"), "none");
    }
}
