//! The transport seam the session controller talks through.

use crate::protocol::models::GatewayResponse;
use crate::LicenseChainError;
use serde_json::Value;

/// Request/response exchange with the licensing service.
///
/// Implementations return `Ok` for any structured answer, including
/// `success == false`. `Err(Transport)` means the exchange itself failed and
/// may be retried; `Err(Protocol)` means the service answered with something
/// unusable and must not be retried.
pub trait TransportGateway {
    /// Send `payload` for `operation` and return the structured answer.
    fn send(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError>;
}

impl<G: TransportGateway + ?Sized> TransportGateway for Box<G> {
    fn send(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError> {
        (**self).send(operation, payload)
    }
}

impl<G: TransportGateway + ?Sized> TransportGateway for &G {
    fn send(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError> {
        (**self).send(operation, payload)
    }
}

/// Scripted in-memory gateway for tests.
///
/// Answers are consumed in order; once the script runs out every call fails
/// with a transport error. Every call is recorded.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
pub struct MockGateway {
    script: std::sync::Mutex<std::collections::VecDeque<Result<GatewayResponse, LicenseChainError>>>,
    calls: std::sync::Mutex<Vec<(String, Value)>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockGateway {
    /// Create a gateway with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a structured answer.
    pub fn respond(self, response: GatewayResponse) -> Self {
        self.push(Ok(response))
    }

    /// Queue a failure.
    pub fn fail(self, error: LicenseChainError) -> Self {
        self.push(Err(error))
    }

    fn push(self, answer: Result<GatewayResponse, LicenseChainError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(answer);
        }
        self
    }

    /// Recorded `(operation, payload)` pairs, in call order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl TransportGateway for MockGateway {
    fn send(&self, operation: &str, payload: &Value) -> Result<GatewayResponse, LicenseChainError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((operation.to_string(), payload.clone()));
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(LicenseChainError::transport("no scripted response")))
    }
}
