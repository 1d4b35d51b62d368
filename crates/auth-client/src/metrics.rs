//! Client-side counters
//!
//! - `api_requests_total` (counter): labels `method`, `status`
//! - `api_token_refresh_total` (counter): label `outcome`
//! - `api_network_errors_total` (counter): label `kind`
//!
//! Calls are no-ops until the host application installs a recorder.

use crate::transport::TransportError;

/// Result of one refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success,
    /// Reused a credential rotated by a concurrent refresh.
    Reused,
    /// No refresh credential was stored.
    Missing,
    /// The refresh endpoint answered 401.
    Rejected,
    Network,
    Error,
}

impl RefreshOutcome {
    pub fn label(self) -> &'static str {
        match self {
            RefreshOutcome::Success => "success",
            RefreshOutcome::Reused => "reused",
            RefreshOutcome::Missing => "missing",
            RefreshOutcome::Rejected => "rejected",
            RefreshOutcome::Network => "network",
            RefreshOutcome::Error => "error",
        }
    }
}

/// Record a request that received a response.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!("api_requests_total", "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
}

pub fn record_refresh(outcome: RefreshOutcome) {
    metrics::counter!("api_token_refresh_total", "outcome" => outcome.label()).increment(1);
}

/// Record a request that received no response.
pub fn record_network_error(error: &TransportError) {
    metrics::counter!("api_network_errors_total", "kind" => error.label()).increment(1);
}
