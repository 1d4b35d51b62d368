//! reqwest-backed transport
//!
//! Joins the configured base URL with the descriptor's path, applies query
//! pairs, headers, and body, and enforces a per-call timeout. Every status
//! comes back as `Ok`; timeouts, refused connections and truncated bodies
//! come back as `TransportError`.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::{ApiRequest, MultipartForm, PartValue, RequestBody};
use crate::response::ApiResponse;
use crate::transport::{BoxFuture, Transport, TransportError};

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url, timeout)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidRequest(format!("invalid base URL {base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Resolve the full URL for a request. Absolute paths (pagination
    /// `next` links) are used as-is.
    pub fn url_for(&self, request: &ApiRequest) -> std::result::Result<Url, TransportError> {
        let path = request.path();
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!(
                "{}/{}",
                self.base_url.as_str().trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        let mut url =
            Url::parse(&raw).map_err(|e| TransportError::Build(format!("invalid URL {raw}: {e}")))?;
        if !request.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_pairs());
        }
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

fn build_form(form: &MultipartForm) -> std::result::Result<Form, TransportError> {
    let mut out = Form::new();
    for part in form.parts() {
        out = match &part.value {
            PartValue::Text(value) => out.text(part.name.clone(), value.clone()),
            PartValue::File {
                file_name,
                content_type,
                data,
            } => {
                let file = Part::bytes(data.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|e| {
                        TransportError::Build(format!("invalid content type {content_type}: {e}"))
                    })?;
                out.part(part.name.clone(), file)
            }
        };
    }
    Ok(out)
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
    ) -> BoxFuture<'a, std::result::Result<ApiResponse, TransportError>> {
        Box::pin(async move {
            let url = self.url_for(request)?;
            debug!(method = %request.method(), %url, "sending request");

            let mut headers = request.headers().clone();
            if matches!(request.body(), RequestBody::Multipart(_)) {
                // reqwest appends the boundary content type
                headers.remove(CONTENT_TYPE);
            }
            let mut builder = self
                .client
                .request(request.method().clone(), url)
                .headers(headers)
                .timeout(self.timeout);
            builder = match request.body() {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(value),
                RequestBody::Multipart(form) => builder.multipart(build_form(form)?),
            };

            let response = builder.send().await.map_err(|e| self.classify(e))?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| self.classify(e))?;
            Ok(ApiResponse::new(status, headers, body))
        })
    }
}
