//! Token endpoint interactions
//!
//! Two calls go straight through the transport, never through the client
//! pipeline, so a failing refresh can't trigger another refresh:
//! 1. Refresh: `{ "refresh": R }` -> `{ "access": A }` at `REFRESH_PATH`
//! 2. Login exchange: `{ "refresh_token": R }` -> `{ "access_token", "refresh_token" }`
//!    at `LOGIN_EXCHANGE_PATH`, used once when the login redirect lands

use std::sync::Arc;

use common::Secret;
use credential_store::CredentialStore;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{LOGIN_EXCHANGE_PATH, REFRESH_PATH};
use crate::error::{Error, Result};
use crate::metrics::{self, RefreshOutcome};
use crate::request::ApiRequest;
use crate::transport::Transport;

/// How concurrent 401s coordinate their refresh calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Every failing request refreshes on its own. Safe only when the
    /// backend accepts the same refresh credential repeatedly.
    #[default]
    Independent,
    /// One refresh at a time; requests that waited reuse the credential the
    /// first one obtained.
    SingleFlight,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Refresh endpoint response. `refresh` is only present when the backend
/// rotates refresh credentials.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Serialize)]
struct LoginExchangeRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct TokenRefresher {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    policy: RefreshPolicy,
    default_headers: HeaderMap,
    gate: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(transport: Arc<dyn Transport>, store: CredentialStore, policy: RefreshPolicy) -> Self {
        Self {
            transport,
            store,
            policy,
            default_headers: HeaderMap::new(),
            gate: Mutex::new(()),
        }
    }

    /// Headers sent with token endpoint calls (e.g. the tunnel bypass header).
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Obtain a new access credential.
    ///
    /// `stale` is the credential the failing request carried. Under
    /// `SingleFlight`, a caller that finds a different credential in the store
    /// after waiting its turn reuses it instead of refreshing again.
    pub async fn refresh(&self, stale: Option<&str>) -> Result<Secret<String>> {
        match self.policy {
            RefreshPolicy::Independent => self.refresh_now().await,
            RefreshPolicy::SingleFlight => {
                let _turn = self.gate.lock().await;
                if let Some(current) = self.store.get_access().await {
                    if stale != Some(current.expose().as_str()) {
                        debug!("reusing credential rotated by a concurrent refresh");
                        metrics::record_refresh(RefreshOutcome::Reused);
                        return Ok(current);
                    }
                }
                self.refresh_now().await
            }
        }
    }

    /// Run the refresh protocol once against the token endpoint.
    async fn refresh_now(&self) -> Result<Secret<String>> {
        let Some(refresh) = self.store.get_refresh().await else {
            warn!("no refresh credential stored");
            metrics::record_refresh(RefreshOutcome::Missing);
            return Err(Error::Authentication("no refresh credential stored".into()));
        };

        let body = serde_json::to_value(RefreshRequest {
            refresh: refresh.expose(),
        })
        .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let request = ApiRequest::post(REFRESH_PATH)
            .headers_from(&self.default_headers)
            .json(body);

        debug!(request_id = %request.id(), "refreshing access credential");
        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "refresh request got no response");
                metrics::record_network_error(&e);
                metrics::record_refresh(RefreshOutcome::Network);
                return Err(e.into());
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                warn!("refresh credential rejected, clearing session");
                metrics::record_refresh(RefreshOutcome::Rejected);
                self.store.clear().await;
                Err(Error::Authentication("refresh credential rejected".into()))
            }
            status if status.is_success() => {
                let tokens: RefreshResponse = response.json().inspect_err(|_| {
                    metrics::record_refresh(RefreshOutcome::Error);
                })?;
                // The replay still uses the fresh credential if persisting fails
                if let Err(e) = self.store.set_access(&tokens.access).await {
                    warn!(error = %e, "failed to persist refreshed access credential");
                }
                if let Some(rotated) = tokens.refresh.as_deref() {
                    if let Err(e) = self.store.set_refresh(rotated).await {
                        warn!(error = %e, "failed to persist rotated refresh credential");
                    }
                }
                metrics::record_refresh(RefreshOutcome::Success);
                info!(rotated = tokens.refresh.is_some(), "access credential refreshed");
                Ok(Secret::new(tokens.access))
            }
            status => {
                warn!(%status, "refresh endpoint failed");
                metrics::record_refresh(RefreshOutcome::Error);
                Err(Error::http(&request, response))
            }
        }
    }

    /// Exchange the refresh credential delivered by the login redirect for a
    /// fresh pair and store both.
    pub async fn exchange_login(&self, refresh_token: &str) -> Result<()> {
        let body = serde_json::to_value(LoginExchangeRequest { refresh_token })
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let request = ApiRequest::post(LOGIN_EXCHANGE_PATH)
            .headers_from(&self.default_headers)
            .json(body);

        let response = self.transport.send(&request).await.inspect_err(|e| {
            metrics::record_network_error(e);
        })?;

        let status = response.status();
        if status.is_client_error() {
            warn!(%status, "login exchange rejected, clearing session");
            self.store.clear().await;
            return Err(Error::Authentication(format!(
                "invalid or expired login link ({status})"
            )));
        }
        if !status.is_success() {
            return Err(Error::http(&request, response));
        }

        let tokens: LoginExchangeResponse = response.json()?;
        self.store
            .set_pair(&tokens.access_token, &tokens.refresh_token)
            .await
            .map_err(|e| Error::Storage(format!("failed to store session: {e}")))?;
        info!("session stored from login exchange");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, empty_response, json_response};
    use crate::transport::TransportError;
    use std::time::Duration;

    fn refresher(
        transport: ScriptedTransport,
        policy: RefreshPolicy,
    ) -> (TokenRefresher, Arc<ScriptedTransport>, CredentialStore) {
        let transport = Arc::new(transport);
        let store = CredentialStore::in_memory();
        let refresher = TokenRefresher::new(transport.clone(), store.clone(), policy);
        (refresher, transport, store)
    }

    #[tokio::test]
    async fn refresh_sends_stored_refresh_credential() {
        let (refresher, transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(json_response(200, serde_json::json!({"access": "A2"})))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let token = refresher.refresh(Some("A1")).await.unwrap();
        assert_eq!(token.expose(), "A2");
        assert_eq!(store.get_access().await.unwrap().expose(), "A2");
        assert_eq!(store.get_refresh().await.unwrap().expose(), "R1");

        let sent = transport.requests_to(REFRESH_PATH);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method(), &reqwest::Method::POST);
        assert!(sent[0].bearer().is_none(), "refresh call must not carry a bearer");
        let crate::RequestBody::Json(body) = sent[0].body() else {
            panic!("refresh body must be JSON")
        };
        assert_eq!(body, &serde_json::json!({"refresh": "R1"}));
    }

    #[tokio::test]
    async fn missing_refresh_credential_makes_no_call() {
        let (refresher, transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(empty_response(200))),
            RefreshPolicy::Independent,
        );
        store.set_access("A1").await.unwrap();

        let err = refresher.refresh(Some("A1")).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn rejected_refresh_clears_both_credentials() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(json_response(401, serde_json::json!({"detail": "Token is invalid or expired"})))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.refresh(Some("A1")).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(store.get_access().await.is_none());
        assert!(store.get_refresh().await.is_none());
    }

    #[tokio::test]
    async fn no_response_is_network_error_and_keeps_session() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Err(TransportError::Timeout(Duration::from_secs(10)))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.refresh(Some("A1")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(store.get_refresh().await.unwrap().expose(), "R1");
    }

    #[tokio::test]
    async fn server_error_passes_through_and_keeps_session() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(empty_response(503))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.refresh(Some("A1")).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(store.get_access().await.unwrap().expose(), "A1");
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(json_response(200, serde_json::json!({"token": "A2"})))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.refresh(Some("A1")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(store.get_access().await.unwrap().expose(), "A1");
    }

    #[tokio::test]
    async fn rotated_refresh_credential_is_stored() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| {
                Ok(json_response(200, serde_json::json!({"access": "A2", "refresh": "R2"})))
            }),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        refresher.refresh(Some("A1")).await.unwrap();
        assert_eq!(store.get_refresh().await.unwrap().expose(), "R2");
    }

    #[tokio::test]
    async fn single_flight_reuses_rotated_credential() {
        let (refresher, transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(json_response(200, serde_json::json!({"access": "A3"})))),
            RefreshPolicy::SingleFlight,
        );
        // Another request already refreshed A1 -> A2
        store.set_pair("A2", "R1").await.unwrap();

        let token = refresher.refresh(Some("A1")).await.unwrap();
        assert_eq!(token.expose(), "A2");
        assert!(transport.requests().is_empty());

        // The credential that failed is the current one: refresh for real
        let token = refresher.refresh(Some("A2")).await.unwrap();
        assert_eq!(token.expose(), "A3");
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn login_exchange_stores_pair() {
        let (refresher, transport, store) = refresher(
            ScriptedTransport::new(|_| {
                Ok(json_response(
                    200,
                    serde_json::json!({"access_token": "A1", "refresh_token": "R2"}),
                ))
            }),
            RefreshPolicy::Independent,
        );

        refresher.exchange_login("R1").await.unwrap();
        assert_eq!(store.get_access().await.unwrap().expose(), "A1");
        assert_eq!(store.get_refresh().await.unwrap().expose(), "R2");

        let sent = transport.requests_to(LOGIN_EXCHANGE_PATH);
        assert_eq!(sent.len(), 1);
        let crate::RequestBody::Json(body) = sent[0].body() else {
            panic!("login exchange body must be JSON")
        };
        assert_eq!(body, &serde_json::json!({"refresh_token": "R1"}));
    }

    #[tokio::test]
    async fn login_exchange_rejection_is_authentication_error() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| {
                Ok(json_response(400, serde_json::json!({"error": "Invalid or expired refresh token"})))
            }),
            RefreshPolicy::Independent,
        );

        let err = refresher.exchange_login("stale").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!store.is_logged_in().await);
    }

    #[tokio::test]
    async fn login_exchange_rejection_clears_existing_session() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(empty_response(400))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.exchange_login("stale").await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(store.get_access().await.is_none());
        assert!(store.get_refresh().await.is_none());
    }

    #[tokio::test]
    async fn login_exchange_server_error_keeps_existing_session() {
        let (refresher, _transport, store) = refresher(
            ScriptedTransport::new(|_| Ok(empty_response(502))),
            RefreshPolicy::Independent,
        );
        store.set_pair("A1", "R1").await.unwrap();

        let err = refresher.exchange_login("R9").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(store.get_refresh().await.unwrap().expose(), "R1");
    }
}
