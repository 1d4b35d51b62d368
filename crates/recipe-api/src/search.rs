//! Recipe search, browse lists and app info
//!
//! Filters become query pairs on `api/search/`: boolean flags in the
//! backend's camelCase, category filters as comma-separated `<field>__name`
//! lists, and `limit` defaulting to 10.

use crate::models::{DownloadLink, FilterCatalog, Page, RecipeSummary};
use crate::profile::{LIKED, RECENTLY_VISITED, SAVED};
use crate::{AuthenticatedClient, Result};

pub const SEARCH: &str = "api/search/";
pub const SEARCH_FILTERS: &str = "api/search/filters/";
pub const DEVELOPERS: &str = "api/developers/";
pub const DOWNLOAD_LINK: &str = "api/download-link/";

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Search filters. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Free text matched against title, description and ingredients.
    pub search: Option<String>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
    pub very_healthy: Option<bool>,
    pub cheap: Option<bool>,
    pub very_popular: Option<bool>,
    pub sustainable: Option<bool>,
    pub low_fodmap: Option<bool>,
    pub difficulty: Option<Difficulty>,
    pub cuisines: Vec<String>,
    pub dish_types: Vec<String>,
    pub diets: Vec<String>,
    pub occasions: Vec<String>,
    /// e.g. `-created_at`, `-aggregateLikes`, `-healthScore`
    pub ordering: Option<String>,
    pub limit: Option<u32>,
}

impl FilterOptions {
    /// Query pairs for one page of results.
    pub fn query_pairs(&self, page: u32) -> Vec<(String, String)> {
        let mut pairs = vec![("page".to_owned(), page.to_string())];

        let flags = [
            ("vegetarian", self.vegetarian),
            ("vegan", self.vegan),
            ("glutenFree", self.gluten_free),
            ("dairyFree", self.dairy_free),
            ("veryHealthy", self.very_healthy),
            ("cheap", self.cheap),
            ("veryPopular", self.very_popular),
            ("sustainable", self.sustainable),
            ("lowFodmap", self.low_fodmap),
        ];
        for (name, value) in flags {
            if let Some(value) = value {
                pairs.push((name.to_owned(), value.to_string()));
            }
        }

        if let Some(difficulty) = self.difficulty {
            pairs.push(("difficulty".to_owned(), difficulty.as_str().to_owned()));
        }

        let categories = [
            ("cuisines__name", &self.cuisines),
            ("dishTypes__name", &self.dish_types),
            ("diets__name", &self.diets),
            ("occasions__name", &self.occasions),
        ];
        for (name, values) in categories {
            if !values.is_empty() {
                pairs.push((name.to_owned(), values.join(",")));
            }
        }

        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_owned(), ordering.clone()));
        }
        pairs.push((
            "limit".to_owned(),
            self.limit.unwrap_or(DEFAULT_LIMIT).to_string(),
        ));
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search".to_owned(), search.to_owned()));
            }
        }
        pairs
    }
}

async fn get_page(
    client: &AuthenticatedClient,
    path: &str,
    pairs: &[(String, String)],
) -> Result<Page<RecipeSummary>> {
    let query: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    client.get(path, &query).await?.json()
}

pub async fn search(
    client: &AuthenticatedClient,
    filters: &FilterOptions,
    page: u32,
) -> Result<Page<RecipeSummary>> {
    get_page(client, SEARCH, &filters.query_pairs(page)).await
}

pub async fn filters(client: &AuthenticatedClient) -> Result<FilterCatalog> {
    client.get(SEARCH_FILTERS, &[]).await?.json()
}

/// Which full list the "see all" screen pages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    RecentlyVisited,
    Liked,
    Saved,
}

impl RecipeList {
    pub fn path(self) -> &'static str {
        match self {
            RecipeList::RecentlyVisited => RECENTLY_VISITED,
            RecipeList::Liked => LIKED,
            RecipeList::Saved => SAVED,
        }
    }
}

/// One page of an account recipe list.
pub async fn all_recipes(
    client: &AuthenticatedClient,
    list: RecipeList,
    page: u32,
) -> Result<Page<RecipeSummary>> {
    get_page(client, list.path(), &[("page".to_owned(), page.to_string())]).await
}

/// Developer cards; the shape is free-form.
pub async fn developers(client: &AuthenticatedClient) -> Result<Vec<serde_json::Value>> {
    client.get(DEVELOPERS, &[]).await?.json()
}

pub async fn download_link(client: &AuthenticatedClient) -> Result<DownloadLink> {
    client.get(DOWNLOAD_LINK, &[]).await?.json()
}
