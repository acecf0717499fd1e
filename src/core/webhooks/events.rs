//! Webhook event builders
//!
//! Every payload sent to a destination is an envelope
//! `{ event, session_id, timestamp, data }`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session event types forwarded to webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Inbound or outbound message
    Message,
    /// Delivery/read receipt for a message
    MessageStatus,
    /// Session connection opened, closed or reconnecting
    ConnectionUpdate,
    /// New pairing QR code
    QrUpdate,
}

impl WebhookEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::Message => "message",
            WebhookEventType::MessageStatus => "message_status",
            WebhookEventType::ConnectionUpdate => "connection_update",
            WebhookEventType::QrUpdate => "qr_update",
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap event data in the delivery envelope
pub fn envelope(
    session_id: &str,
    event: WebhookEventType,
    data: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "event": event,
        "session_id": session_id,
        "timestamp": Utc::now(),
        "data": data,
    })
}

/// Build message event
pub fn message(session_id: &str, message: serde_json::Value) -> serde_json::Value {
    envelope(session_id, WebhookEventType::Message, message)
}

/// Build message status event
pub fn message_status(session_id: &str, message_id: &str, status: &str) -> serde_json::Value {
    envelope(
        session_id,
        WebhookEventType::MessageStatus,
        serde_json::json!({
            "message_id": message_id,
            "status": status,
        }),
    )
}

/// Build connection update event
pub fn connection_update(session_id: &str, connected: bool) -> serde_json::Value {
    envelope(
        session_id,
        WebhookEventType::ConnectionUpdate,
        serde_json::json!({
            "connection": if connected { "open" } else { "close" },
        }),
    )
}

/// Build QR update event
pub fn qr_update(session_id: &str, qr: &str) -> serde_json::Value {
    envelope(
        session_id,
        WebhookEventType::QrUpdate,
        serde_json::json!({ "qr": qr }),
    )
}
