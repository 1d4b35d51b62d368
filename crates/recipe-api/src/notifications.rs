//! Notification inbox and push registration

use tracing::debug;

use crate::models::{MessageResponse, Notification, Page};
use crate::{AuthenticatedClient, Error, Result};

pub const NOTIFICATIONS: &str = "api/notifications/";
pub const MARK_ALL_READ: &str = "api/notifications/mark-all-read/";
pub const REGISTER_PUSH_TOKEN: &str = "api/notifications/register-push-token/";

/// Expo push tokens look like `ExponentPushToken[...]`.
const PUSH_TOKEN_PREFIX: &str = "ExponentPushToken[";

/// First page of the inbox, newest first.
pub async fn list(client: &AuthenticatedClient) -> Result<Page<Notification>> {
    client.get(NOTIFICATIONS, &[]).await?.json()
}

pub async fn list_page(client: &AuthenticatedClient, page: u32) -> Result<Page<Notification>> {
    let page = page.to_string();
    client.get(NOTIFICATIONS, &[("page", &page)]).await?.json()
}

pub async fn mark_read(client: &AuthenticatedClient, id: &str) -> Result<()> {
    client
        .post(&format!("{NOTIFICATIONS}{id}/mark-read/"), &serde_json::json!({}))
        .await?;
    Ok(())
}

pub async fn mark_all_read(client: &AuthenticatedClient) -> Result<()> {
    client.post(MARK_ALL_READ, &serde_json::json!({})).await?;
    Ok(())
}

pub async fn delete(client: &AuthenticatedClient, id: &str) -> Result<()> {
    client.delete(&format!("{NOTIFICATIONS}{id}/")).await?;
    Ok(())
}

/// Register a device push token. Malformed tokens are rejected locally.
pub async fn register_push_token(
    client: &AuthenticatedClient,
    push_token: &str,
) -> Result<MessageResponse> {
    if !push_token.starts_with(PUSH_TOKEN_PREFIX) {
        return Err(Error::InvalidRequest(
            "push token must start with ExponentPushToken[".into(),
        ));
    }
    debug!("registering push token");
    client
        .post(
            REGISTER_PUSH_TOKEN,
            &serde_json::json!({ "push_token": push_token }),
        )
        .await?
        .json()
}
