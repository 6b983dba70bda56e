//! Reqwest-based HTTP gateway for the session API.
//!
//! Every operation is a JSON POST to `<base_url>/api/1.0/`; the payload's
//! `type` field selects the operation on the service side.

use crate::client::gateway::TransportGateway;
use crate::config::ClientConfig;
use crate::protocol::models::{parse_gateway_response, GatewayResponse};
use crate::LicenseChainError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

/// Path of the session API below the base URL.
pub const API_PATH: &str = "/api/1.0/";

/// HTTP gateway backed by a blocking reqwest client.
#[derive(Debug)]
pub struct HttpGateway {
    client: Client,
    endpoint: String,
    user_agent: String,
}

impl HttpGateway {
    /// Create a gateway from config.
    ///
    /// The configured timeout applies to every request.
    pub fn new(config: &ClientConfig) -> Result<Self, LicenseChainError> {
        config.validate()?;

        let user_agent = build_user_agent(config);
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent.clone())
            .build()
            .map_err(|e| LicenseChainError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), API_PATH),
            user_agent,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// User-Agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl TransportGateway for HttpGateway {
    fn send(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError> {
        tracing::debug!(operation, endpoint = %self.endpoint, "sending request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .map_err(|e| LicenseChainError::transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| LicenseChainError::Transport {
                message: format!("Failed to read body: {}", e),
                status: Some(status),
            })?;

        tracing::debug!(operation, status, "received response");
        interpret_response(status, &body)
    }
}

/// Map an HTTP status and body onto the gateway contract.
///
/// - 2xx: the body must be a structured response, otherwise `Protocol`.
/// - 429 and 5xx: `Transport`, so the caller may retry.
/// - Other statuses: a structured body is returned as is (the service's own
///   rejection); anything else is `Protocol`.
pub fn interpret_response(status: u16, body: &[u8]) -> Result<GatewayResponse, LicenseChainError> {
    if (200..300).contains(&status) {
        return parse_gateway_response(body).map_err(|e| LicenseChainError::Protocol {
            message: e.to_string(),
            status: Some(status),
        });
    }

    let parsed = parse_gateway_response(body).ok();

    if status == 429 || status >= 500 {
        let message = parsed
            .and_then(|r| r.message)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(LicenseChainError::Transport {
            message,
            status: Some(status),
        });
    }

    match parsed {
        Some(response) => Ok(response),
        None => Err(LicenseChainError::Protocol {
            message: format!("HTTP {}: {}", status, body_snippet(body)),
            status: Some(status),
        }),
    }
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(200).collect()
}

/// Build a User-Agent string from config.
///
/// Format: `<product>/licensechain-<version>`
pub fn build_user_agent(config: &ClientConfig) -> String {
    format!(
        "{}/licensechain-{}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION")
    )
}
