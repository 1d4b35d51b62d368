//! Authenticated client pipeline
//!
//! `send(request) -> attach_auth -> transport.send -> classify_and_maybe_retry`
//!
//! A 401 on a request that has not been replayed yet triggers exactly one
//! refresh and one replay. Everything else is classified and returned.

use std::sync::Arc;
use std::time::Duration;

use credential_store::CredentialStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE};
use crate::error::{Error, Result};
use crate::http::ReqwestTransport;
use crate::metrics;
use crate::refresh::{RefreshPolicy, TokenRefresher};
use crate::request::{ApiRequest, MultipartForm};
use crate::response::ApiResponse;
use crate::transport::Transport;

/// Client settings resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Send the development tunnel bypass header on every call.
    pub tunnel_bypass: bool,
    pub refresh_policy: RefreshPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            tunnel_bypass: false,
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl ClientOptions {
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.tunnel_bypass {
            headers.insert(
                HeaderName::from_static(TUNNEL_BYPASS_HEADER),
                HeaderValue::from_static(TUNNEL_BYPASS_VALUE),
            );
        }
        headers
    }
}

pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    refresher: TokenRefresher,
    default_headers: HeaderMap,
}

impl AuthenticatedClient {
    /// Client over the production reqwest transport.
    pub fn new(options: &ClientOptions, store: CredentialStore) -> Result<Self> {
        let transport = ReqwestTransport::new(&options.base_url, options.timeout)?;
        Ok(Self::with_transport(Arc::new(transport), store, options))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: CredentialStore,
        options: &ClientOptions,
    ) -> Self {
        let default_headers = options.default_headers();
        let refresher = TokenRefresher::new(transport.clone(), store.clone(), options.refresh_policy)
            .with_default_headers(default_headers.clone());
        debug!(
            transport = transport.id(),
            store = store.backend_id(),
            policy = ?options.refresh_policy,
            "authenticated client ready"
        );
        Self {
            transport,
            store,
            refresher,
            default_headers,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// New descriptor carrying the default headers.
    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, path).headers_from(&self.default_headers)
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let request = query
            .iter()
            .fold(self.request(Method::GET, path), |r, (k, v)| r.query(*k, *v));
        self.send(request).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(self.request(Method::DELETE, path)).await
    }

    /// POST a multipart form; the transport sets the boundary content type.
    pub async fn upload(&self, path: &str, form: MultipartForm) -> Result<ApiResponse> {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse> {
        let body = serde_json::to_value(body)
            .map_err(|e| Error::InvalidRequest(format!("serializing body: {e}")))?;
        self.send(self.request(method, path).json(body)).await
    }

    /// Run a request through the pipeline.
    #[instrument(skip_all, fields(request_id = %request.id(), method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        self.attach_auth(&mut request).await?;
        let response = self.dispatch(&request).await?;
        self.classify_and_maybe_retry(request, response).await
    }

    async fn attach_auth(&self, request: &mut ApiRequest) -> Result<()> {
        match self.store.get_access().await {
            Some(token) => {
                request.set_bearer(token.expose())?;
                debug!("attached access credential");
            }
            None => debug!("no access credential, sending unauthenticated"),
        }
        Ok(())
    }

    /// Send through the transport. No response at all is a network error.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        match self.transport.send(request).await {
            Ok(response) => {
                metrics::record_request(request.method().as_str(), response.status().as_u16());
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "request got no response");
                metrics::record_network_error(&e);
                Err(e.into())
            }
        }
    }

    async fn classify_and_maybe_retry(
        &self,
        mut request: ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return into_result(&request, response);
        }
        if request.is_retried() {
            debug!("401 on a replayed request, not refreshing again");
            return into_result(&request, response);
        }

        request.mark_retried();
        let stale = request.bearer().map(str::to_owned);
        let token = match self.refresher.refresh(stale.as_deref()).await {
            Ok(token) => token,
            Err(e) => {
                if matches!(e, Error::Authentication(_)) {
                    self.store.clear().await;
                }
                return Err(e);
            }
        };

        request.set_bearer(token.expose())?;
        debug!("replaying request with refreshed credential");
        let response = self.dispatch(&request).await?;
        into_result(&request, response)
    }

    /// Exchange the refresh credential from the login redirect for a session.
    pub async fn login(&self, refresh_token: &str) -> Result<()> {
        self.refresher.exchange_login(refresh_token).await
    }

    pub async fn logout(&self) {
        self.store.clear().await;
        info!("logged out");
    }

    pub async fn is_logged_in(&self) -> bool {
        self.store.is_logged_in().await
    }
}

fn into_result(request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::http(request, response))
    }
}
