//! Account endpoints

use tracing::instrument;

use crate::models::{Page, ProfileSections, RecipeSummary, UserProfile};
use crate::{AuthenticatedClient, Result};

pub const USER_PROFILE: &str = "api/user/profile/";
pub const RECENTLY_VISITED: &str = "api/profile/recently-visited/";
pub const LIKED: &str = "api/profile/liked/";
pub const SAVED: &str = "api/profile/saved/";

pub async fn user_profile(client: &AuthenticatedClient) -> Result<UserProfile> {
    client.get(USER_PROFILE, &[]).await?.json()
}

async fn recipe_page(client: &AuthenticatedClient, path: &str) -> Result<Vec<RecipeSummary>> {
    let page: Page<RecipeSummary> = client.get(path, &[]).await?.json()?;
    Ok(page.results)
}

/// Fetch the three account lists concurrently. Each request refreshes on its
/// own if the access credential has expired; the first failure wins.
#[instrument(skip_all)]
pub async fn profile_sections(client: &AuthenticatedClient) -> Result<ProfileSections> {
    let (recently_visited, liked, saved) = tokio::try_join!(
        recipe_page(client, RECENTLY_VISITED),
        recipe_page(client, LIKED),
        recipe_page(client, SAVED),
    )?;
    Ok(ProfileSections {
        recently_visited,
        liked,
        saved,
    })
}
