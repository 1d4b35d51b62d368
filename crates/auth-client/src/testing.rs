//! Scripted transport for tests
//!
//! Routes each request through a closure and records every request it sees,
//! so tests can assert how many times an endpoint was hit and with which
//! credential.

use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::transport::{BoxFuture, Transport, TransportError};

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

pub struct ScriptedTransport {
    handler: Box<Handler>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, so concurrent calls overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests sent to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<ApiResponse, TransportError>> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.handler)(request)
        })
    }
}

/// Response with a JSON body.
pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ApiResponse::new(
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        headers,
        Bytes::from(body.to_string()),
    )
}

/// Response with no body.
pub fn empty_response(status: u16) -> ApiResponse {
    ApiResponse::new(
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        HeaderMap::new(),
        Bytes::new(),
    )
}
