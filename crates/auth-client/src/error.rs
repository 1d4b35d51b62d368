//! Error taxonomy for authenticated API calls
//!
//! Three kinds reach callers from the wire: `Network` (no response at all),
//! `Authentication` (the session is gone and credentials were cleared), and
//! `Http` (any other non-success status, passed through untouched). `Decode`,
//! `InvalidRequest` and `Storage` cover local failures around the wire.

use std::fmt;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::transport::TransportError;

/// A non-success response, kept intact for the caller.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpError {
    pub fn from_response(request: &ApiRequest, response: ApiResponse) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            method: request.method().clone(),
            path: request.path().to_owned(),
            status,
            headers,
            body,
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the error body, e.g. `{"error": "..."}` payloads.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(e.to_string()))
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} returned {}", self.method, self.path, self.status)
    }
}

/// Errors from the authenticated client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network unavailable: {0}")]
    Network(String),

    #[error("session expired, please log in again: {0}")]
    Authentication(String),

    #[error("{0}")]
    Http(Box<HttpError>),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("credential storage failed: {0}")]
    Storage(String),
}

/// Coarse error category for caller-side handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry later; credentials are untouched.
    Network,
    /// Logged out; send the user to the login entry point.
    Authentication,
    /// Server verdict the caller owns.
    Http,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Http(_) => ErrorKind::Http,
            Error::Decode(_) | Error::InvalidRequest(_) | Error::Storage(_) => ErrorKind::Other,
        }
    }

    /// Status of a passed-through HTTP error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(e) => Some(e.status),
            _ => None,
        }
    }

    pub(crate) fn http(request: &ApiRequest, response: ApiResponse) -> Self {
        Error::Http(Box::new(HttpError::from_response(request, response)))
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Build(msg) => Error::InvalidRequest(msg),
            other => Error::Network(other.to_string()),
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
