//! Authenticated HTTP client for the recipe backend
//!
//! Wraps a `Transport` with a small pipeline that attaches the stored bearer
//! credential, classifies failures, and performs at most one transparent
//! refresh-and-retry per request. Callers match on `ErrorKind`, not on
//! HTTP status.
//!
//! Request flow:
//! 1. Caller builds a request through a verb (`get`, `post`, `upload`, ...)
//! 2. `attach_auth` adds `Authorization: Bearer <access>` when logged in
//! 3. The transport sends it; only "no response" is a transport error
//! 4. A 401 on a fresh request triggers `TokenRefresher::refresh` and one replay
//! 5. Rejected refreshes clear the `CredentialStore` and surface `Authentication`

pub mod client;
pub mod constants;
pub mod error;
pub mod http;
pub mod metrics;
pub mod refresh;
pub mod request;
pub mod response;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use client::{AuthenticatedClient, ClientOptions};
pub use constants::*;
pub use error::{Error, ErrorKind, HttpError, Result};
pub use http::ReqwestTransport;
pub use refresh::{RefreshPolicy, TokenRefresher};
pub use request::{ApiRequest, FormPart, MultipartForm, PartValue, RequestBody};
pub use response::ApiResponse;
pub use transport::{BoxFuture, Transport, TransportError};

pub use reqwest::{Method, StatusCode};
