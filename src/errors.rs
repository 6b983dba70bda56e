//! LicenseChain error types.

use thiserror::Error;

/// Errors raised by the session controller, the transport gateway, and
/// webhook verification.
#[derive(Debug, Error)]
pub enum LicenseChainError {
    /// Construction parameters are invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A session operation was attempted before a successful `init()`.
    #[error("Client not initialized, call init() first")]
    NotInitialized,

    /// A user-scoped operation was attempted without a license login.
    #[error("User not logged in")]
    NotLoggedIn,

    /// The handshake was rejected or could not reach the service.
    #[error("Initialization failed: {message}")]
    InitFailed {
        /// Server-supplied reason, or a description of the underlying failure.
        message: String,
        /// The transport or protocol failure behind this error, if any.
        #[source]
        source: Option<Box<LicenseChainError>>,
    },

    /// The service refused the license key.
    #[error("License login rejected: {message}")]
    LoginRejected {
        /// Server-supplied reason.
        message: String,
    },

    /// Network, timeout, or server-side unavailability. Eligible for retry.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// HTTP status, when the service answered at all.
        status: Option<u16>,
    },

    /// A well-formed but unusable answer from the service. Never retried.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the failure.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// Webhook payload failed HMAC verification.
    #[error("Webhook signature mismatch")]
    SignatureMismatch,
}

impl LicenseChainError {
    /// Build a `Transport` error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Build a `Protocol` error without an HTTP status.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            status: None,
        }
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// Only transport failures qualify. An `InitFailed` caused by a transport
    /// failure also qualifies so callers can tell "try later" apart from
    /// "credentials rejected".
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::InitFailed {
                source: Some(source),
                ..
            } => source.is_retryable(),
            _ => false,
        }
    }

    /// HTTP status observed alongside the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } | Self::Protocol { status, .. } => *status,
            Self::InitFailed {
                source: Some(source),
                ..
            } => source.status(),
            _ => None,
        }
    }

    /// Stable error code string, matching the codes the service's SDKs use.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NotLoggedIn => "NOT_LOGGED_IN",
            Self::InitFailed { .. } => "INIT_FAILED",
            Self::LoginRejected { .. } => "AUTHENTICATION_ERROR",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::Transport { status, .. } => match status {
                Some(429) => "RATE_LIMIT_ERROR",
                Some(s) if *s >= 500 => "SERVER_ERROR",
                _ => "NETWORK_ERROR",
            },
            Self::Protocol { status, .. } => match status {
                Some(400) => "VALIDATION_ERROR",
                Some(401) | Some(403) => "AUTHENTICATION_ERROR",
                Some(404) => "NOT_FOUND_ERROR",
                Some(429) => "RATE_LIMIT_ERROR",
                Some(s) if *s >= 500 => "SERVER_ERROR",
                _ => "UNKNOWN_ERROR",
            },
        }
    }
}
