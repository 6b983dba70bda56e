//! # LicenseChain
//!
//! **Session client for the [LicenseChain](https://licensechain.app) licensing service.**
//!
//! A [`SessionController`] performs a credential handshake, authenticates an
//! end user by license key, and then exposes session-scoped operations
//! (variables, logs, files, chat, user administration). Inbound webhooks are
//! authenticated with HMAC-SHA256 before anything decodes them.
//!
//! ## Features
//!
//! - **Guarded lifecycle** - `Uninitialized -> Initialized -> LoggedIn -> LoggedOut`,
//!   operations called in the wrong phase fail without touching the network
//! - **Secret-free handshake** - only a SHA-256 digest of the credential is sent
//! - **Exponential backoff** - transport failures are retried, rejections are not
//! - **Constant-time webhook verification** - `sha256=<hex>` signatures
//! - **Always-succeeding logout** - local state is cleared even when offline
//!
//! ## Quickstart
//!
//! ```no_run
//! use licensechain::{ClientConfig, Credential, SessionController};
//!
//! fn main() -> Result<(), licensechain::LicenseChainError> {
//!     let credential = Credential::new("MyApp", "owner-id", "app-secret");
//!     let mut session = SessionController::connect(credential, ClientConfig::default())?;
//!
//!     session.init()?;
//!     let user = session.license_login("LICENSE-KEY-HERE")?;
//!     println!("Logged in as {}", user.id);
//!
//!     session.set_var("theme", "dark")?;
//!     session.logout();
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! The client protects the application secret in transit (it is never sent)
//! and rejects forged webhook callbacks. It does **not** prevent binary
//! patching, and the hardware id it reports is an advisory fingerprint.
//! The handshake digest is static per credential, so a captured handshake
//! can be replayed.
//!
//! See [`ClientConfig`] for transport and retry settings.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Policy layer
pub mod policy;

// Host details
pub mod platform;

// Session (main public API)
pub mod session;

// Webhook authentication
pub mod webhook;

// Re-exports for public API
pub use client::gateway::TransportGateway;
pub use client::http::HttpGateway;
pub use clock::{Clock, SystemClock};
pub use config::{ClientConfig, Credential};
pub use errors::LicenseChainError;
pub use policy::backoff::BackoffPolicy;
pub use protocol::models::{ChatMessage, GatewayResponse, UserSnapshot, WebhookEvent};
pub use session::controller::{SessionController, DEFAULT_CHANNEL};
pub use session::state::{SessionPhase, SessionState};
pub use webhook::WebhookEnvelope;

#[cfg(any(test, feature = "test-seams"))]
pub use client::gateway::MockGateway;
#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
