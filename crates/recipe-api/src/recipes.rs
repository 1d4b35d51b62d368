//! Recipe detail and interactions

use crate::models::{LikeCount, RecipeDetail, SaveCount};
use crate::{AuthenticatedClient, Result};

fn recipe_path(id: u64) -> String {
    format!("api/recipes/{id}/")
}

pub async fn detail(client: &AuthenticatedClient, id: u64) -> Result<RecipeDetail> {
    client.get(&recipe_path(id), &[]).await?.json()
}

/// Toggle the caller's like; returns the new like count.
pub async fn toggle_like(client: &AuthenticatedClient, id: u64) -> Result<LikeCount> {
    client
        .post(&format!("api/recipes/{id}/like/"), &serde_json::json!({}))
        .await?
        .json()
}

/// Toggle the caller's save; returns the new save count.
pub async fn toggle_save(client: &AuthenticatedClient, id: u64) -> Result<SaveCount> {
    client
        .post(&format!("api/recipes/{id}/save/"), &serde_json::json!({}))
        .await?
        .json()
}
