use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("WhatsApp credentials are not configured (WHATSAPP_TOKEN / PHONE_NUMBER_ID)")]
    NotConfigured,
    #[error("WhatsApp API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WhatsApp API error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Outbound side of the relay. Handlers only see this trait so they can be
/// exercised without the network.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send a plain text message; returns the provider's response body.
    async fn send_text(&self, to: &str, body: &str) -> Result<Value, WhatsAppError>;
}

// ── Inbound webhook payload ───────────────────────────────────────────────────

/// Cloud API webhook notification. Only the fields the relay reads are modeled.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

/// A text message ready for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage<'a> {
    pub from: &'a str,
    pub body: &'a str,
}

impl WebhookPayload {
    pub const BUSINESS_ACCOUNT: &'static str = "whatsapp_business_account";

    /// Text messages in notification order. Status updates, media and
    /// messages without a sender are skipped.
    pub fn text_messages(&self) -> Vec<TextMessage<'_>> {
        if self.object.as_deref() != Some(Self::BUSINESS_ACCOUNT) {
            return Vec::new();
        }
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .filter(|change| change.field.as_deref() == Some("messages"))
            .flat_map(|change| change.value.messages.iter())
            .filter(|message| message.kind.as_deref() == Some("text"))
            .filter_map(|message| {
                let from = message.from.as_deref().filter(|f| !f.is_empty())?;
                let body = message.text.as_ref().map_or("", |t| t.body.as_str());
                Some(TextMessage { from, body })
            })
            .collect()
    }
}

// ── Outbound client ───────────────────────────────────────────────────────────

pub struct WhatsAppClient {
    http: reqwest::Client,
    messages_url: Option<String>,
    access_token: Option<String>,
}

impl WhatsAppClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            messages_url: config.messages_url(),
            access_token: config.whatsapp_token.clone(),
        }
    }
}

/// Body for a free-form text reply (valid inside the 24-hour window).
pub fn text_message_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body }
    })
}

#[async_trait]
impl ReplySender for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<Value, WhatsAppError> {
        let (Some(url), Some(token)) = (self.messages_url.as_deref(), self.access_token.as_deref())
        else {
            return Err(WhatsAppError::NotConfigured);
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&text_message_payload(to, body))
            .send()
            .await?;

        let status = response.status();
        let resp_body: Value = response
            .json()
            .await
            .unwrap_or_else(|_| json!({ "error": "failed to parse response" }));

        if status.is_success() {
            Ok(resp_body)
        } else {
            let message = resp_body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown WhatsApp API error")
                .to_string();
            Err(WhatsAppError::Api { status, message })
        }
    }
}

// ── Test double ───────────────────────────────────────────────────────────────
