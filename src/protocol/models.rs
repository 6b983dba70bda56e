//! Response structs exchanged with the session API.

use crate::LicenseChainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Structured answer to any session API request.
///
/// `success == false` is an application-level outcome (bad key, unknown
/// variable), not a transport failure; `message` carries the reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Whether the service accepted the request.
    pub success: bool,

    /// Human-readable reason, mostly set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Session identifier issued by the handshake.
    #[serde(
        default,
        rename = "sessionId",
        alias = "sessionid",
        alias = "session_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<String>,

    /// Authenticated user, returned by license login and user lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSnapshot>,

    /// Operation-specific payload (variable value, statistics, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// User listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserSnapshot>>,

    /// Chat messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,

    /// File contents for downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl GatewayResponse {
    /// A successful response with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// An unsuccessful response carrying `message`.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// The `data` field as a string, if the service sent a scalar.
    pub fn data_as_string(&self) -> Option<String> {
        match self.data.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// The `data` field as a JSON object, if it is one.
    pub fn data_as_object(&self) -> Option<Map<String, Value>> {
        match self.data.as_ref()? {
            Value::Object(map) => Some(map.clone()),
            _ => None,
        }
    }
}

/// Snapshot of the authenticated end user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// User identifier.
    pub id: String,

    /// Subscription names, in the order the service lists them.
    #[serde(default)]
    pub subscriptions: Vec<String>,

    /// User variables.
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Arbitrary per-user data.
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

/// A chat message on an application channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier.
    #[serde(default)]
    pub id: String,

    /// Author.
    #[serde(default)]
    pub username: String,

    /// Message body.
    #[serde(default)]
    pub message: String,

    /// Channel name.
    #[serde(default)]
    pub channel: String,

    /// Send time, when the service provides one.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A verified inbound webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event identifier.
    pub id: String,

    /// Event type, e.g. `license.created`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event body.
    #[serde(default)]
    pub data: Value,

    /// Emission time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Parse a raw JSON body into a gateway response.
pub fn parse_gateway_response(body: &[u8]) -> Result<GatewayResponse, LicenseChainError> {
    serde_json::from_slice(body).map_err(|e| {
        LicenseChainError::protocol(format!("Failed to parse service response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_RESPONSE: &str = r#"{"success": true, "sessionId": "S1"}"#;

    const LOGIN_RESPONSE: &str = r#"{
        "success": true,
        "message": "Logged in",
        "user": {
            "id": "U1",
            "subscriptions": ["pro", "beta"],
            "variables": {"theme": "dark"},
            "data": {"seats": 3}
        }
    }"#;

    const REJECTED_RESPONSE: &str = r#"{"success": false, "message": "Invalid license key"}"#;

    #[test]
    fn test_parse_init_response() {
        let response = parse_gateway_response(INIT_RESPONSE.as_bytes()).unwrap();
        assert!(response.success);
        assert_eq!(response.session_id.as_deref(), Some("S1"));
        assert!(response.user.is_none());
    }

    #[test]
    fn test_session_id_aliases() {
        let lower = parse_gateway_response(br#"{"success":true,"sessionid":"a"}"#).unwrap();
        let snake = parse_gateway_response(br#"{"success":true,"session_id":"b"}"#).unwrap();
        assert_eq!(lower.session_id.as_deref(), Some("a"));
        assert_eq!(snake.session_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_parse_login_response() {
        let response = parse_gateway_response(LOGIN_RESPONSE.as_bytes()).unwrap();
        let user = response.user.unwrap();
        assert_eq!(user.id, "U1");
        assert_eq!(user.subscriptions, vec!["pro", "beta"]);
        assert_eq!(user.variables.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(user.data.get("seats"), Some(&Value::from(3)));
    }

    #[test]
    fn test_parse_minimal_user() {
        let response =
            parse_gateway_response(br#"{"success":true,"user":{"id":"U2"}}"#).unwrap();
        let user = response.user.unwrap();
        assert!(user.subscriptions.is_empty());
        assert!(user.variables.is_empty());
        assert!(user.data.is_empty());
    }

    #[test]
    fn test_parse_rejected_response() {
        let response = parse_gateway_response(REJECTED_RESPONSE.as_bytes()).unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Invalid license key"));
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_gateway_response(b"not json");
        assert!(matches!(result, Err(LicenseChainError::Protocol { .. })));
    }

    #[test]
    fn test_data_accessors() {
        let mut response = GatewayResponse::ok();
        response.data = Some(Value::from("blue"));
        assert_eq!(response.data_as_string().as_deref(), Some("blue"));
        assert!(response.data_as_object().is_none());

        response.data = Some(serde_json::json!({"users": 10}));
        assert_eq!(response.data_as_object().unwrap()["users"], Value::from(10));

        response.data = Some(Value::Null);
        assert!(response.data_as_string().is_none());
    }

    #[test]
    fn test_parse_chat_messages() {
        let body = br#"{
            "success": true,
            "messages": [
                {"id": "m1", "username": "alice", "message": "hi", "channel": "general",
                 "timestamp": "2025-01-15T12:00:00Z"},
                {"id": "m2", "username": "bob", "message": "yo", "channel": "general"}
            ]
        }"#;
        let response = parse_gateway_response(body).unwrap();
        let messages = response.messages.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].timestamp.is_some());
        assert!(messages[1].timestamp.is_none());
    }
}
