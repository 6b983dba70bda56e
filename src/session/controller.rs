//! Session Controller - the main public API for LicenseChain.
//!
//! The `SessionController` owns one logical session with the service:
//! - Handshake (`init`) turning the application credential into a session id
//! - License login authenticating an end user within that session
//! - Session-scoped operations guarded by the lifecycle phase
//! - Best-effort logout that always clears local state
//!
//! Operations take `&mut self` or `&self` and are meant to be called
//! sequentially. Wrap the controller in a mutex if several threads share it.

use crate::client::gateway::TransportGateway;
use crate::client::http::HttpGateway;
use crate::clock::Clock;
use crate::config::{ClientConfig, Credential};
use crate::crypto::digest::credential_hash;
use crate::crypto::random::secure_token;
use crate::platform::{hardware_id, pc_user};
use crate::policy::backoff::BackoffPolicy;
use crate::protocol::models::{ChatMessage, GatewayResponse, UserSnapshot, WebhookEvent};
use crate::protocol::payload::{init_payload, license_payload, session_payload};
use crate::session::state::{SessionPhase, SessionState};
use crate::webhook::{self, WebhookEnvelope};
use crate::LicenseChainError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Length of the client key material advertised during the handshake.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Chat channel used when the caller has no preference.
pub const DEFAULT_CHANNEL: &str = "general";

/// Main session controller for LicenseChain.
///
/// Create one instance per logical session. Two controllers never share
/// state.
pub struct SessionController<G: TransportGateway> {
    credential: Credential,
    gateway: G,
    backoff: BackoffPolicy,
    max_attempts: u32,
    initial_delay: Duration,
    state: SessionState,
}

impl SessionController<HttpGateway> {
    /// Create a controller talking HTTP to the configured service.
    ///
    /// # Errors
    /// Returns `Config` if the credential or configuration is invalid, or
    /// the HTTP client cannot be built.
    pub fn connect(credential: Credential, config: ClientConfig) -> Result<Self, LicenseChainError> {
        let gateway = HttpGateway::new(&config)?;
        Self::new(credential, gateway, &config)
    }
}

impl<G: TransportGateway> SessionController<G> {
    /// Create a controller over any gateway, sleeping on the system clock
    /// between retries.
    pub fn new(
        credential: Credential,
        gateway: G,
        config: &ClientConfig,
    ) -> Result<Self, LicenseChainError> {
        Self::with_backoff(credential, gateway, config, BackoffPolicy::default())
    }

    /// Create a controller whose retry delays run on `clock`.
    pub fn with_clock(
        credential: Credential,
        gateway: G,
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LicenseChainError> {
        Self::with_backoff(credential, gateway, config, BackoffPolicy::new(clock))
    }

    fn with_backoff(
        credential: Credential,
        gateway: G,
        config: &ClientConfig,
        backoff: BackoffPolicy,
    ) -> Result<Self, LicenseChainError> {
        credential.validate()?;
        config.validate()?;

        Ok(Self {
            credential,
            gateway,
            backoff,
            max_attempts: config.max_attempts,
            initial_delay: config.initial_delay,
            state: SessionState::default(),
        })
    }

    // ---- lifecycle -------------------------------------------------------

    /// Perform the handshake and establish a session.
    ///
    /// Returns `Ok(true)` without contacting the service when a session
    /// already exists. After `logout()` a new handshake is performed.
    ///
    /// # Errors
    /// - `InitFailed` - the service rejected the handshake, answered without
    ///   a session id, or could not be reached (`is_retryable()` tells these
    ///   apart). The phase is unchanged.
    pub fn init(&mut self) -> Result<bool, LicenseChainError> {
        if self.state.has_session() {
            tracing::debug!("session already initialized, skipping handshake");
            return Ok(true);
        }

        let hash = credential_hash(
            self.credential.app_name(),
            self.credential.owner_id(),
            self.credential.app_secret(),
        );
        let payload = init_payload(
            &hash,
            &secure_token(ENCRYPTION_KEY_LEN),
            self.credential.app_name(),
            self.credential.owner_id(),
        );

        tracing::debug!(app = self.credential.app_name(), "starting handshake");

        let response = self
            .exchange("init", &payload)
            .map_err(|e| LicenseChainError::InitFailed {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;

        if !response.success {
            return Err(LicenseChainError::InitFailed {
                message: response
                    .message
                    .unwrap_or_else(|| "Initialization rejected".to_string()),
                source: None,
            });
        }

        let session_id = response
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LicenseChainError::InitFailed {
                message: "Handshake response carried no session id".to_string(),
                source: Some(Box::new(LicenseChainError::protocol(
                    "missing sessionId in init response",
                ))),
            })?;

        tracing::debug!(session = short_id(&session_id), "session initialized");
        self.state.initialize(session_id);
        Ok(true)
    }

    /// Authenticate an end user by license key.
    ///
    /// Allowed while `Initialized` or `LoggedIn`; logging in again replaces
    /// the stored user snapshot.
    ///
    /// # Errors
    /// - `NotInitialized` - no live session (the service is not contacted)
    /// - `LoginRejected` - the service refused the key; phase unchanged
    /// - `Transport` - the service stayed unreachable after retries
    /// - `Protocol` - the service accepted the key but sent no user
    pub fn license_login(&mut self, license_key: &str) -> Result<UserSnapshot, LicenseChainError> {
        let session_id = self.ensure_initialized()?;
        let payload = license_payload(license_key, &hardware_id(), session_id);

        tracing::debug!(session = short_id(session_id), "license login");
        let response = self.exchange("license", &payload)?;

        if !response.success {
            return Err(LicenseChainError::LoginRejected {
                message: response
                    .message
                    .unwrap_or_else(|| "License login failed".to_string()),
            });
        }

        let user = response.user.ok_or_else(|| {
            LicenseChainError::protocol("License login response carried no user")
        })?;

        tracing::debug!(user = %user.id, "logged in");
        self.state.log_in(user.clone());
        Ok(user)
    }

    /// End the user session.
    ///
    /// Returns `true` immediately when not logged in. Otherwise the service
    /// is told about the logout, and local state is cleared whatever it
    /// answers, so the client is never stuck believing it is logged in.
    pub fn logout(&mut self) -> bool {
        if self.state.phase() != SessionPhase::LoggedIn {
            return true;
        }

        if let Some(session_id) = self.state.session_id() {
            let payload = session_payload("logout", session_id, no_fields());
            match self.exchange("logout", &payload) {
                Ok(response) if response.success => {
                    tracing::debug!(session = short_id(session_id), "logged out")
                }
                Ok(response) => tracing::warn!(
                    message = response.message.as_deref().unwrap_or(""),
                    "service refused logout, clearing local session anyway"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    "logout request failed, clearing local session anyway"
                ),
            }
        }

        self.state.log_out();
        true
    }

    // ---- local state -----------------------------------------------------

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Current session id, if a session is live.
    pub fn session_id(&self) -> Option<&str> {
        self.state.session_id()
    }

    /// Whether a handshake has established a live session.
    pub fn is_initialized(&self) -> bool {
        self.state.has_session()
    }

    /// Whether a user is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.state.phase() == SessionPhase::LoggedIn
    }

    /// Snapshot of the logged-in user.
    pub fn user_data(&self) -> Option<&UserSnapshot> {
        self.state.user()
    }

    /// Subscriptions of the logged-in user.
    pub fn subscriptions(&self) -> Option<&[String]> {
        self.state.user().map(|u| u.subscriptions.as_slice())
    }

    /// Variables of the logged-in user.
    pub fn variables(&self) -> Option<&HashMap<String, String>> {
        self.state.user().map(|u| &u.variables)
    }

    /// Arbitrary data of the logged-in user.
    pub fn data(&self) -> Option<&HashMap<String, Value>> {
        self.state.user().map(|u| &u.data)
    }

    /// The application credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ---- session-scoped operations ---------------------------------------

    /// Set a user variable.
    pub fn set_var(&self, name: &str, data: &str) -> Result<bool, LicenseChainError> {
        let response = self.user_request(
            "setvar",
            vec![("var", Value::from(name)), ("data", Value::from(data))],
        )?;
        Ok(response.success)
    }

    /// Read a user variable. `None` if the service has no value for it.
    pub fn get_var(&self, name: &str) -> Result<Option<String>, LicenseChainError> {
        let response = self.user_request("getvar", vec![("var", Value::from(name))])?;
        Ok(if response.success {
            response.data_as_string()
        } else {
            None
        })
    }

    /// Record a log line on the service, tagged with the OS user.
    pub fn log_message(&self, message: &str) -> Result<bool, LicenseChainError> {
        let response = self.user_request(
            "log",
            vec![
                ("pcuser", Value::from(pc_user())),
                ("message", Value::from(message)),
            ],
        )?;
        Ok(response.success)
    }

    /// Download an application file. `None` if the service refuses.
    pub fn download_file(&self, file_id: &str) -> Result<Option<String>, LicenseChainError> {
        let response = self.user_request("file", vec![("fileid", Value::from(file_id))])?;
        Ok(if response.success {
            response.contents
        } else {
            None
        })
    }

    /// Application-wide statistics. Needs a session but no logged-in user.
    pub fn app_stats(&self) -> Result<Option<Map<String, Value>>, LicenseChainError> {
        let response = self.app_request("app", no_fields())?;
        Ok(if response.success {
            response.data_as_object()
        } else {
            None
        })
    }

    /// Users currently online.
    pub fn online_users(&self) -> Result<Option<Vec<UserSnapshot>>, LicenseChainError> {
        let response = self.user_request("online", no_fields())?;
        Ok(user_list(response))
    }

    /// Messages on a chat channel (see [`DEFAULT_CHANNEL`]).
    pub fn chat_get(&self, channel: &str) -> Result<Option<Vec<ChatMessage>>, LicenseChainError> {
        let response = self.user_request("chatget", vec![("channel", Value::from(channel))])?;
        Ok(if response.success {
            Some(response.messages.unwrap_or_default())
        } else {
            None
        })
    }

    /// Post a message on a chat channel.
    pub fn chat_send(&self, message: &str, channel: &str) -> Result<bool, LicenseChainError> {
        let response = self.user_request(
            "chatsend",
            vec![
                ("message", Value::from(message)),
                ("channel", Value::from(channel)),
            ],
        )?;
        Ok(response.success)
    }

    /// Ban a user.
    pub fn ban_user(&self, username: &str) -> Result<bool, LicenseChainError> {
        self.user_admin("ban", username)
    }

    /// Lift a ban.
    pub fn unban_user(&self, username: &str) -> Result<bool, LicenseChainError> {
        self.user_admin("unban", username)
    }

    /// Delete a user.
    pub fn delete_user(&self, username: &str) -> Result<bool, LicenseChainError> {
        self.user_admin("deleteuser", username)
    }

    /// All users of the application.
    pub fn all_users(&self) -> Result<Option<Vec<UserSnapshot>>, LicenseChainError> {
        let response = self.user_request("allusers", no_fields())?;
        Ok(user_list(response))
    }

    /// Look up one user. `None` if unknown.
    pub fn get_user(&self, username: &str) -> Result<Option<UserSnapshot>, LicenseChainError> {
        let response = self.user_request("getuser", vec![("user", Value::from(username))])?;
        Ok(if response.success { response.user } else { None })
    }

    /// Replace a user's data.
    pub fn update_user(
        &self,
        username: &str,
        data: Map<String, Value>,
    ) -> Result<bool, LicenseChainError> {
        let response = self.user_request(
            "edituser",
            vec![("user", Value::from(username)), ("data", Value::Object(data))],
        )?;
        Ok(response.success)
    }

    /// Webhook configuration data for the application.
    pub fn webhook_data(&self) -> Result<Option<Map<String, Value>>, LicenseChainError> {
        let response = self.user_request("webhook", no_fields())?;
        Ok(if response.success {
            response.data_as_object()
        } else {
            None
        })
    }

    // ---- webhooks --------------------------------------------------------

    /// Verify a callback signed with the application secret.
    pub fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> bool {
        webhook::verify(payload, signature_header, self.credential.app_secret())
    }

    /// Verify, then decode a callback signed with the application secret.
    pub fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Option<Map<String, Value>> {
        webhook::parse(payload, signature_header, self.credential.app_secret())
    }

    /// Verify and decode a callback into a typed event.
    pub fn open_webhook(&self, envelope: &WebhookEnvelope) -> Result<WebhookEvent, LicenseChainError> {
        envelope.open(self.credential.app_secret())
    }

    // ---- internals -------------------------------------------------------

    fn ensure_initialized(&self) -> Result<&str, LicenseChainError> {
        self.state
            .session_id()
            .ok_or(LicenseChainError::NotInitialized)
    }

    fn ensure_logged_in(&self) -> Result<&str, LicenseChainError> {
        let session_id = self.ensure_initialized()?;
        if self.state.phase() != SessionPhase::LoggedIn {
            return Err(LicenseChainError::NotLoggedIn);
        }
        Ok(session_id)
    }

    fn user_request(
        &self,
        operation: &str,
        fields: Vec<(&str, Value)>,
    ) -> Result<GatewayResponse, LicenseChainError> {
        let session_id = self.ensure_logged_in()?;
        self.exchange(operation, &session_payload(operation, session_id, fields))
    }

    fn app_request(
        &self,
        operation: &str,
        fields: Vec<(&str, Value)>,
    ) -> Result<GatewayResponse, LicenseChainError> {
        let session_id = self.ensure_initialized()?;
        self.exchange(operation, &session_payload(operation, session_id, fields))
    }

    fn user_admin(&self, operation: &str, username: &str) -> Result<bool, LicenseChainError> {
        let response = self.user_request(operation, vec![("user", Value::from(username))])?;
        Ok(response.success)
    }

    /// Send through the gateway, retrying transport failures only.
    ///
    /// Protocol failures are carried through the policy inside `Ok` so they
    /// surface on the first occurrence.
    fn exchange(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError> {
        self.backoff.execute(
            || match self.gateway.send(operation, payload) {
                Err(e) if e.is_retryable() => Err(e),
                other => Ok(other),
            },
            self.max_attempts,
            self.initial_delay,
        )?
    }
}

fn no_fields() -> Vec<(&'static str, Value)> {
    Vec::new()
}

fn user_list(response: GatewayResponse) -> Option<Vec<UserSnapshot>> {
    if response.success {
        Some(response.users.unwrap_or_default())
    } else {
        None
    }
}

/// Session ids are bearer tokens; log only a prefix.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::gateway::MockGateway;
    use crate::clock::MockClock;
    use crate::crypto::signing::webhook_signature;
    use serde_json::json;

    const APP: &str = "MyApp";
    const OWNER: &str = "owner-1";
    const SECRET: &str = "s3cret";

    fn credential() -> Credential {
        Credential::new(APP, OWNER, SECRET)
    }

    fn build(gateway: MockGateway) -> (SessionController<MockGateway>, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new());
        let controller = SessionController::with_clock(
            credential(),
            gateway,
            &ClientConfig::default(),
            clock.clone(),
        )
        .unwrap();
        (controller, clock)
    }

    fn init_ok(session_id: &str) -> GatewayResponse {
        GatewayResponse {
            session_id: Some(session_id.to_string()),
            ..GatewayResponse::ok()
        }
    }

    fn login_ok(user_id: &str) -> GatewayResponse {
        GatewayResponse {
            user: Some(UserSnapshot {
                id: user_id.to_string(),
                subscriptions: vec!["pro".to_string()],
                variables: HashMap::from([("theme".to_string(), "dark".to_string())]),
                data: HashMap::new(),
            }),
            ..GatewayResponse::ok()
        }
    }

    fn logged_in(extra: Vec<GatewayResponse>) -> SessionController<MockGateway> {
        let mut gateway = MockGateway::new().respond(init_ok("S1")).respond(login_ok("U1"));
        for response in extra {
            gateway = gateway.respond(response);
        }
        let (mut controller, _) = build(gateway);
        controller.init().unwrap();
        controller.license_login("ABC123").unwrap();
        controller
    }

    #[test]
    fn test_new_rejects_invalid_credential() {
        let result = SessionController::new(
            Credential::new(APP, OWNER, ""),
            MockGateway::new(),
            &ClientConfig::default(),
        );
        assert!(matches!(result, Err(LicenseChainError::Config(_))));
    }

    #[test]
    fn test_init_sends_handshake() {
        let (mut controller, _) = build(MockGateway::new().respond(init_ok("S1")));

        assert!(controller.init().unwrap());
        assert_eq!(controller.phase(), SessionPhase::Initialized);
        assert_eq!(controller.session_id(), Some("S1"));

        let calls = controller.gateway().calls();
        assert_eq!(calls.len(), 1);
        let (operation, payload) = &calls[0];
        assert_eq!(operation, "init");
        assert_eq!(payload["type"], "init");
        assert_eq!(payload["ver"], "1.0");
        assert_eq!(payload["hash"], credential_hash(APP, OWNER, SECRET));
        assert_eq!(payload["name"], APP);
        assert_eq!(payload["ownerid"], OWNER);
        let enckey = payload["enckey"].as_str().unwrap();
        assert_eq!(enckey.len(), ENCRYPTION_KEY_LEN);
        // The secret itself never goes on the wire.
        assert!(!payload.to_string().contains(SECRET));
    }

    #[test]
    fn test_init_is_idempotent() {
        let (mut controller, _) = build(MockGateway::new().respond(init_ok("S1")));
        assert!(controller.init().unwrap());
        assert!(controller.init().unwrap());
        assert_eq!(controller.gateway().call_count(), 1);
    }

    #[test]
    fn test_init_rejected() {
        let (mut controller, clock) =
            build(MockGateway::new().respond(GatewayResponse::rejected("Unknown application")));

        let err = controller.init().unwrap_err();
        match &err {
            LicenseChainError::InitFailed { message, source } => {
                assert_eq!(message, "Unknown application");
                assert!(source.is_none());
            }
            other => panic!("expected InitFailed, got {:?}", other),
        }
        assert!(!err.is_retryable());
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_init_without_session_id_fails() {
        let (mut controller, _) = build(MockGateway::new().respond(GatewayResponse::ok()));
        assert!(matches!(
            controller.init(),
            Err(LicenseChainError::InitFailed { .. })
        ));
        assert!(!controller.is_initialized());
    }

    #[test]
    fn test_init_transport_failure_retried_then_surfaced() {
        let gateway = MockGateway::new()
            .fail(LicenseChainError::transport("refused #1"))
            .fail(LicenseChainError::transport("refused #2"))
            .fail(LicenseChainError::transport("refused #3"));
        let (mut controller, clock) = build(gateway);

        let err = controller.init().unwrap_err();
        assert!(err.is_retryable());
        match err {
            LicenseChainError::InitFailed {
                source: Some(source),
                ..
            } => assert!(source.to_string().contains("refused #3")),
            other => panic!("expected InitFailed with source, got {:?}", other),
        }
        assert_eq!(controller.gateway().call_count(), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    }

    #[test]
    fn test_init_recovers_after_transient_failure() {
        let gateway = MockGateway::new()
            .fail(LicenseChainError::transport("timeout"))
            .respond(init_ok("S1"));
        let (mut controller, clock) = build(gateway);

        assert!(controller.init().unwrap());
        assert_eq!(controller.session_id(), Some("S1"));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1000)]);
    }

    #[test]
    fn test_protocol_failure_not_retried() {
        let gateway = MockGateway::new()
            .fail(LicenseChainError::protocol("garbled"))
            .respond(init_ok("S1"));
        let (mut controller, clock) = build(gateway);

        assert!(matches!(
            controller.init(),
            Err(LicenseChainError::InitFailed { .. })
        ));
        assert_eq!(controller.gateway().call_count(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_login_requires_init() {
        let (mut controller, _) = build(MockGateway::new());
        assert!(matches!(
            controller.license_login("ABC123"),
            Err(LicenseChainError::NotInitialized)
        ));
        assert_eq!(controller.gateway().call_count(), 0);
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    }

    #[test]
    fn test_login_payload_and_state() {
        let controller = logged_in(vec![]);

        assert!(controller.is_logged_in());
        assert_eq!(controller.user_data().map(|u| u.id.as_str()), Some("U1"));
        assert_eq!(controller.subscriptions(), Some(&["pro".to_string()][..]));
        assert_eq!(
            controller.variables().and_then(|v| v.get("theme")).map(String::as_str),
            Some("dark")
        );

        let calls = controller.gateway().calls();
        let (operation, payload) = &calls[1];
        assert_eq!(operation, "license");
        assert_eq!(payload["type"], "license");
        assert_eq!(payload["key"], "ABC123");
        assert_eq!(payload["sessionid"], "S1");
        assert!(!payload["hwid"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_login_rejected_keeps_phase() {
        let gateway = MockGateway::new()
            .respond(init_ok("S1"))
            .respond(GatewayResponse::rejected("Invalid license key"));
        let (mut controller, clock) = build(gateway);
        controller.init().unwrap();

        match controller.license_login("BAD") {
            Err(LicenseChainError::LoginRejected { message }) => {
                assert_eq!(message, "Invalid license key")
            }
            other => panic!("expected LoginRejected, got {:?}", other),
        }
        assert_eq!(controller.phase(), SessionPhase::Initialized);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_login_transport_failure_surfaces_unwrapped() {
        let gateway = MockGateway::new()
            .respond(init_ok("S1"))
            .fail(LicenseChainError::transport("down"))
            .fail(LicenseChainError::transport("down"))
            .fail(LicenseChainError::transport("still down"));
        let (mut controller, _) = build(gateway);
        controller.init().unwrap();

        match controller.license_login("ABC123") {
            Err(LicenseChainError::Transport { message, .. }) => assert_eq!(message, "still down"),
            other => panic!("expected Transport, got {:?}", other),
        }
        assert_eq!(controller.phase(), SessionPhase::Initialized);
    }

    #[test]
    fn test_login_without_user_is_protocol_error() {
        let gateway = MockGateway::new()
            .respond(init_ok("S1"))
            .respond(GatewayResponse::ok());
        let (mut controller, _) = build(gateway);
        controller.init().unwrap();

        assert!(matches!(
            controller.license_login("ABC123"),
            Err(LicenseChainError::Protocol { .. })
        ));
        assert!(!controller.is_logged_in());
    }

    #[test]
    fn test_relogin_replaces_snapshot() {
        let mut controller = logged_in(vec![login_ok("U2")]);
        let user = controller.license_login("XYZ789").unwrap();
        assert_eq!(user.id, "U2");
        assert_eq!(controller.user_data().map(|u| u.id.as_str()), Some("U2"));
        assert_eq!(controller.session_id(), Some("S1"));
    }

    #[test]
    fn test_user_operations_guarded() {
        let (mut controller, _) = build(MockGateway::new().respond(init_ok("S1")));

        assert!(matches!(
            controller.set_var("a", "b"),
            Err(LicenseChainError::NotInitialized)
        ));
        assert!(matches!(
            controller.app_stats(),
            Err(LicenseChainError::NotInitialized)
        ));

        controller.init().unwrap();
        let calls_after_init = controller.gateway().call_count();

        assert!(matches!(
            controller.get_var("a"),
            Err(LicenseChainError::NotLoggedIn)
        ));
        assert!(matches!(
            controller.chat_get(DEFAULT_CHANNEL),
            Err(LicenseChainError::NotLoggedIn)
        ));
        assert!(matches!(
            controller.ban_user("mallory"),
            Err(LicenseChainError::NotLoggedIn)
        ));
        assert!(matches!(
            controller.download_file("f1"),
            Err(LicenseChainError::NotLoggedIn)
        ));
        assert_eq!(controller.phase(), SessionPhase::Initialized);
        assert_eq!(controller.gateway().call_count(), calls_after_init);
    }

    #[test]
    fn test_app_stats_needs_only_session() {
        let stats = GatewayResponse {
            data: Some(json!({"numUsers": 12, "numOnline": 3})),
            ..GatewayResponse::ok()
        };
        let (mut controller, _) =
            build(MockGateway::new().respond(init_ok("S1")).respond(stats));
        controller.init().unwrap();

        let stats = controller.app_stats().unwrap().unwrap();
        assert_eq!(stats["numUsers"], 12);
        let calls = controller.gateway().calls();
        assert_eq!(calls[1].1, json!({"type": "app", "sessionid": "S1"}));
    }

    #[test]
    fn test_variables_round_trip() {
        let get = GatewayResponse {
            data: Some(Value::from("dark")),
            ..GatewayResponse::ok()
        };
        let controller = logged_in(vec![
            GatewayResponse::ok(),
            get,
            GatewayResponse::rejected("Variable not found"),
        ]);

        assert!(controller.set_var("theme", "dark").unwrap());
        assert_eq!(controller.get_var("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(controller.get_var("missing").unwrap(), None);

        let calls = controller.gateway().calls();
        assert_eq!(
            calls[2].1,
            json!({"type": "setvar", "var": "theme", "data": "dark", "sessionid": "S1"})
        );
    }

    #[test]
    fn test_server_failures_are_typed_results() {
        let controller = logged_in(vec![
            GatewayResponse::rejected("no"),
            GatewayResponse::rejected("no"),
            GatewayResponse::rejected("no"),
            GatewayResponse::rejected("no"),
        ]);

        assert!(!controller.log_message("hello").unwrap());
        assert_eq!(controller.download_file("f1").unwrap(), None);
        assert_eq!(controller.get_user("ghost").unwrap(), None);
        assert_eq!(controller.online_users().unwrap(), None);
    }

    #[test]
    fn test_user_admin_payloads() {
        let controller = logged_in(vec![
            GatewayResponse::ok(),
            GatewayResponse::ok(),
            GatewayResponse::ok(),
            GatewayResponse::ok(),
        ]);

        assert!(controller.ban_user("mallory").unwrap());
        assert!(controller.unban_user("mallory").unwrap());
        let mut data = Map::new();
        data.insert("plan".to_string(), Value::from("gold"));
        assert!(controller.update_user("alice", data).unwrap());
        assert!(controller.delete_user("mallory").unwrap());

        let calls = controller.gateway().calls();
        let ops: Vec<&str> = calls[2..].iter().map(|(op, _)| op.as_str()).collect();
        assert_eq!(ops, vec!["ban", "unban", "edituser", "deleteuser"]);
        assert_eq!(calls[4].1["data"]["plan"], "gold");
        assert!(calls[2..].iter().all(|(_, p)| p["sessionid"] == "S1"));
    }

    #[test]
    fn test_chat_and_listing_operations() {
        let chat = GatewayResponse {
            messages: Some(vec![ChatMessage {
                id: "m1".to_string(),
                username: "alice".to_string(),
                message: "hi".to_string(),
                channel: "general".to_string(),
                timestamp: None,
            }]),
            ..GatewayResponse::ok()
        };
        let users = GatewayResponse {
            users: Some(vec![UserSnapshot {
                id: "U9".to_string(),
                ..UserSnapshot::default()
            }]),
            ..GatewayResponse::ok()
        };
        let file = GatewayResponse {
            contents: Some("file-bytes".to_string()),
            ..GatewayResponse::ok()
        };
        let controller = logged_in(vec![chat, GatewayResponse::ok(), users, file]);

        let messages = controller.chat_get(DEFAULT_CHANNEL).unwrap().unwrap();
        assert_eq!(messages[0].username, "alice");
        assert!(controller.chat_send("hello", "support").unwrap());
        assert_eq!(controller.all_users().unwrap().unwrap()[0].id, "U9");
        assert_eq!(
            controller.download_file("f1").unwrap().as_deref(),
            Some("file-bytes")
        );

        let calls = controller.gateway().calls();
        assert_eq!(calls[2].1["channel"], "general");
        assert_eq!(calls[3].1["channel"], "support");
        assert_eq!(calls[5].1["fileid"], "f1");
    }

    #[test]
    fn test_log_message_carries_pc_user() {
        let controller = logged_in(vec![GatewayResponse::ok()]);
        assert!(controller.log_message("started").unwrap());
        let calls = controller.gateway().calls();
        assert_eq!(calls[2].1["message"], "started");
        assert!(calls[2].1["pcuser"].is_string());
    }

    #[test]
    fn test_logout_when_not_logged_in() {
        let (mut controller, _) = build(MockGateway::new().respond(init_ok("S1")));
        assert!(controller.logout());
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);

        controller.init().unwrap();
        assert!(controller.logout());
        assert_eq!(controller.phase(), SessionPhase::Initialized);
        assert_eq!(controller.gateway().call_count(), 1);
    }

    #[test]
    fn test_logout_clears_state() {
        let mut controller = logged_in(vec![GatewayResponse::ok()]);
        assert!(controller.logout());
        assert_eq!(controller.phase(), SessionPhase::LoggedOut);
        assert!(!controller.is_logged_in());
        assert!(controller.session_id().is_none());
        assert!(controller.user_data().is_none());

        let calls = controller.gateway().calls();
        assert_eq!(calls[2].1, json!({"type": "logout", "sessionid": "S1"}));
    }

    #[test]
    fn test_logout_clears_state_when_unreachable() {
        let mut controller = logged_in(vec![]);
        // Script exhausted: every logout attempt fails at the transport level.
        assert!(controller.logout());
        assert_eq!(controller.phase(), SessionPhase::LoggedOut);
        assert!(controller.session_id().is_none());
    }

    #[test]
    fn test_logout_clears_state_when_refused() {
        let mut controller = logged_in(vec![GatewayResponse::rejected("session expired")]);
        assert!(controller.logout());
        assert_eq!(controller.phase(), SessionPhase::LoggedOut);
    }

    #[test]
    fn test_init_after_logout_starts_new_session() {
        let mut controller = logged_in(vec![GatewayResponse::ok(), init_ok("S2")]);
        controller.logout();

        assert!(matches!(
            controller.license_login("ABC123"),
            Err(LicenseChainError::NotInitialized)
        ));

        assert!(controller.init().unwrap());
        assert_eq!(controller.session_id(), Some("S2"));
        assert_eq!(controller.phase(), SessionPhase::Initialized);
    }

    #[test]
    fn test_local_accessors_empty_before_login() {
        let (controller, _) = build(MockGateway::new());
        assert!(controller.user_data().is_none());
        assert!(controller.subscriptions().is_none());
        assert!(controller.variables().is_none());
        assert!(controller.data().is_none());
    }

    #[test]
    fn test_webhooks_use_app_secret() {
        let (controller, _) = build(MockGateway::new());
        let payload = br#"{"id":"evt_1","type":"license.created","data":{}}"#;
        let signature = webhook_signature(SECRET, payload);

        assert!(controller.verify_webhook(payload, &signature));
        assert!(controller.parse_webhook(payload, &signature).is_some());
        assert!(controller.parse_webhook(payload, "sha256=00").is_none());

        let event = controller
            .open_webhook(&WebhookEnvelope::new(payload.to_vec(), signature))
            .unwrap();
        assert_eq!(event.event_type, "license.created");
        // Webhooks never need or touch the session.
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdefghijkl"), "abcdefgh");
        assert_eq!(short_id("abc"), "abc");
    }
}
