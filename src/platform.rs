//! Host fingerprint and OS user lookup for login and log requests.
//!
//! The hardware id is advisory. It is built from the machine name, OS version
//! and logical core count, so two identical machines collide and a renamed
//! host changes id. Never treat it as a device identity.

use crate::crypto::random::filler_token;
use sysinfo::System;

/// Best-effort host fingerprint: `<host name>-<OS version>-<logical cores>`.
///
/// Falls back to `unknown-hwid-<8 random chars>` when the host name cannot be
/// read.
pub fn hardware_id() -> String {
    match System::host_name() {
        Some(host) if !host.is_empty() => {
            let os = System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string());
            format_hardware_id(&host, &os, logical_cores())
        }
        _ => format!("unknown-hwid-{}", filler_token(8)),
    }
}

fn format_hardware_id(host: &str, os: &str, cores: usize) -> String {
    format!("{}-{}-{}", host, os, cores)
}

fn logical_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Name of the OS user running the process, or `unknown`.
pub fn pc_user() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
