//! Session state machine.
//!
//! ```text
//! Uninitialized --init--> Initialized --login--> LoggedIn --logout--> LoggedOut
//!                             ^                    |  ^                  |
//!                             |                    +--+ (re-login)       |
//!                             +----------------------init----------------+
//! ```
//!
//! The session id exists exactly in `Initialized` and `LoggedIn`; the user
//! snapshot exists exactly in `LoggedIn`. Both invariants hold by
//! construction because the data lives inside the variants.

use crate::protocol::models::UserSnapshot;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No handshake yet.
    Uninitialized,
    /// Handshake done, no user authenticated.
    Initialized,
    /// A user is authenticated via license login.
    LoggedIn,
    /// The user logged out; a new handshake is required.
    LoggedOut,
}

/// Authoritative session state, owned by one controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No handshake yet.
    #[default]
    Uninitialized,
    /// Handshake done.
    Initialized {
        /// Server-issued session id.
        session_id: String,
    },
    /// User authenticated.
    LoggedIn {
        /// Server-issued session id.
        session_id: String,
        /// Snapshot returned by the license login.
        user: UserSnapshot,
    },
    /// Logged out; session id and user cleared.
    LoggedOut,
}

impl SessionState {
    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Uninitialized => SessionPhase::Uninitialized,
            Self::Initialized { .. } => SessionPhase::Initialized,
            Self::LoggedIn { .. } => SessionPhase::LoggedIn,
            Self::LoggedOut => SessionPhase::LoggedOut,
        }
    }

    /// Session id, present in `Initialized` and `LoggedIn`.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Initialized { session_id } | Self::LoggedIn { session_id, .. } => {
                Some(session_id)
            }
            _ => None,
        }
    }

    /// User snapshot, present in `LoggedIn`.
    pub fn user(&self) -> Option<&UserSnapshot> {
        match self {
            Self::LoggedIn { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Whether a handshake has established a live session.
    pub fn has_session(&self) -> bool {
        self.session_id().is_some()
    }

    /// Store a fresh session id after a successful handshake.
    pub(crate) fn initialize(&mut self, session_id: String) {
        *self = Self::Initialized { session_id };
    }

    /// Store the user snapshot, keeping the current session id.
    ///
    /// No-op without a live session; the controller guards before calling.
    pub(crate) fn log_in(&mut self, user: UserSnapshot) {
        if let Some(session_id) = self.session_id().map(str::to_string) {
            *self = Self::LoggedIn { session_id, user };
        }
    }

    /// Drop the session id and user snapshot.
    pub(crate) fn log_out(&mut self) {
        *self = Self::LoggedOut;
    }
}
