//! Network transport seam
//!
//! The client never talks to an HTTP library directly. A `Transport` sends a
//! descriptor and returns whatever the server answered, any status included;
//! only the absence of a response is an error. `ReqwestTransport` is the
//! production implementation and `testing::ScriptedTransport` the test double.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Boxed future returned by transports, dyn-compatible for `Arc<dyn Transport>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A call that produced no server response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    /// The request could not be constructed; nothing was sent.
    #[error("request could not be built: {0}")]
    Build(String),

    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Label for the network error counter.
    pub fn label(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Build(_) => "build",
            TransportError::Other(_) => "other",
        }
    }
}

pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest", "scripted")
    fn id(&self) -> &str;

    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<ApiResponse, TransportError>>;
}
