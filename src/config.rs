//! LicenseChain configuration.

use crate::LicenseChainError;
use std::fmt;
use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.licensechain.app";

/// Application credential issued by the licensing service.
///
/// The secret never leaves the process in plaintext: it is only fed into the
/// handshake digest and the webhook HMAC.
#[derive(Clone)]
pub struct Credential {
    app_name: String,
    owner_id: String,
    app_secret: String,
}

impl Credential {
    /// Create a credential from its three parts.
    pub fn new(
        app_name: impl Into<String>,
        owner_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            owner_id: owner_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Application name as registered with the service.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Owner (account) identifier.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub(crate) fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// Validate the credential for obvious errors.
    pub fn validate(&self) -> Result<(), LicenseChainError> {
        if self.app_name.is_empty() {
            return Err(LicenseChainError::Config(
                "app_name cannot be empty".to_string(),
            ));
        }
        if self.owner_id.is_empty() {
            return Err(LicenseChainError::Config(
                "owner_id cannot be empty".to_string(),
            ));
        }
        if self.app_secret.is_empty() {
            return Err(LicenseChainError::Config(
                "app_secret cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("app_name", &self.app_name)
            .field("owner_id", &self.owner_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Transport and retry settings for a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, without the API path.
    pub base_url: String,

    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,

    /// Attempts per request, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles after every failed attempt.
    pub initial_delay: Duration,

    /// User-Agent product identifier (e.g., "myapp-pro").
    pub user_agent_product: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            user_agent_product: "licensechain-rust".to_string(),
        }
    }
}

impl ClientConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), LicenseChainError> {
        if self.base_url.is_empty() {
            return Err(LicenseChainError::Config(
                "base_url cannot be empty".to_string(),
            ));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(LicenseChainError::Config(format!(
                "base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(LicenseChainError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(LicenseChainError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
