//! Request payload builders.
//!
//! Every request is a flat JSON object whose `type` names the operation.
//! Once a session exists, requests also carry `sessionid`.

use serde_json::{json, Map, Value};

/// Handshake protocol version.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Build the handshake payload.
pub fn init_payload(hash: &str, enckey: &str, app_name: &str, owner_id: &str) -> Value {
    json!({
        "type": "init",
        "ver": PROTOCOL_VERSION,
        "hash": hash,
        "enckey": enckey,
        "name": app_name,
        "ownerid": owner_id,
    })
}

/// Build the license login payload, tagged with the current session.
pub fn license_payload(license_key: &str, hwid: &str, session_id: &str) -> Value {
    session_payload(
        "license",
        session_id,
        [
            ("key", Value::from(license_key)),
            ("hwid", Value::from(hwid)),
        ],
    )
}

/// Merge operation fields with `type` and `sessionid`.
///
/// `type` and `sessionid` always win over same-named operation fields.
pub fn session_payload<I, K>(operation: &str, session_id: &str, fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let mut body: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.into(), v))
        .collect();
    body.insert("type".to_string(), Value::from(operation));
    body.insert("sessionid".to_string(), Value::from(session_id));
    Value::Object(body)
}
