//! Session lifecycle example.
//!
//! This example demonstrates the handshake, license login, a few
//! session-scoped calls and logout, with the error cases a caller
//! typically distinguishes.
//!
//! # Running
//!
//! ```bash
//! export LICENSE_KEY="your-license-key"
//! cargo run --example session_lifecycle
//! ```
//!
//! # Note
//!
//! The application secret should be a compile-time constant embedded in your
//! binary. It never goes over the wire: the handshake only sends its digest.

use licensechain::{ClientConfig, Credential, LicenseChainError, SessionController, DEFAULT_CHANNEL};

// These would be your actual application credentials in production.
const APP_NAME: &str = "example-app";
const OWNER_ID: &str = "00000000-0000-0000-0000-000000000000";
const APP_SECRET: &str = "replace-with-your-app-secret";

fn main() {
    // License key from user (this CAN come from environment/config)
    let license_key = match std::env::var("LICENSE_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set LICENSE_KEY environment variable");
            std::process::exit(2);
        }
    };

    let credential = Credential::new(APP_NAME, OWNER_ID, APP_SECRET);
    let mut session = match SessionController::connect(credential, ClientConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = session.init() {
        if e.is_retryable() {
            eprintln!("Licensing service unreachable, try again later: {}", e);
        } else {
            eprintln!("Application rejected by the licensing service: {}", e);
        }
        std::process::exit(1);
    }

    match session.license_login(&license_key) {
        Ok(user) => {
            println!("✓ Logged in as {}", user.id);
            println!("  Subscriptions: {:?}", user.subscriptions);
        }
        Err(LicenseChainError::LoginRejected { message }) => {
            eprintln!("License rejected: {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Login error [{}]: {}", e.error_code(), e);
            std::process::exit(1);
        }
    }

    match session.get_var("theme") {
        Ok(Some(theme)) => println!("  Theme: {}", theme),
        Ok(None) => println!("  No theme stored"),
        Err(e) => eprintln!("  Could not read variable: {}", e),
    }

    if let Ok(Some(messages)) = session.chat_get(DEFAULT_CHANNEL) {
        println!("  {} chat message(s) in #{}", messages.len(), DEFAULT_CHANNEL);
    }

    // Always succeeds; local state is cleared even if the service is gone.
    session.logout();
    println!("Logged out");
}
