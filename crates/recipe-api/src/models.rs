//! Response and request models
//!
//! Fields the backend may omit or null out are `Option`/`#[serde(default)]`
//! so a sparse record still decodes.

use serde::{Deserialize, Serialize};

/// DRF page-number pagination envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub profile_picture: Option<String>,
}

/// Tag ids are numeric on some records and strings on others.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tag {
    pub id: serde_json::Value,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeSummary {
    pub id: u64,
    pub title: String,
    pub image: Option<String>,
    pub external_image: Option<String>,
    #[serde(default, rename = "healthScore")]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Recipe detail. Only the fields the client reads are typed; the rest of
/// the record is kept in `extra`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeDetail {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image: Option<String>,
    pub external_image: Option<String>,
    #[serde(default)]
    pub cook_time: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Recently visited, liked and saved recipes for the account screen.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileSections {
    pub recently_visited: Vec<RecipeSummary>,
    pub liked: Vec<RecipeSummary>,
    pub saved: Vec<RecipeSummary>,
}

/// Values the search screen can filter on.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterCatalog {
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default, rename = "dishTypes")]
    pub dish_types: Vec<String>,
    #[serde(default)]
    pub diets: Vec<String>,
    #[serde(default)]
    pub occasions: Vec<String>,
    #[serde(default)]
    pub ordering: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadLink {
    pub download_link: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LikeCount {
    pub like_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveCount {
    pub save_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelatedRecipe {
    pub id: u64,
    pub title: String,
    pub image: Option<String>,
    pub external_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: String,
    #[serde(default)]
    pub related_recipe: Option<RelatedRecipe>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrder {
    pub recipe_id: u64,
    pub servings: u32,
    pub delivery_address: String,
    pub contact_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderRecipe {
    pub id: u64,
    pub title: String,
    pub image: Option<String>,
}

/// Order created at the payment gateway, ready for checkout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderDetails {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub key: String,
    pub status: String,
    pub delivery_address: String,
    pub contact_number: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub recipe: OrderRecipe,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderHistory {
    pub order_id: String,
    pub recipe_title: String,
    pub recipe_image: Option<String>,
    pub amount: f64,
    pub servings: u32,
    pub status: String,
    pub ordered_at: String,
    pub delivery_address: String,
    pub contact_number: String,
    #[serde(default)]
    pub estimated_delivery_time: Option<String>,
    pub payment_status: String,
}

/// Gateway callback fields forwarded for signature verification.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerification {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationResult {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatQuery {
    pub user_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Chat replies vary by query; `message` is the part every reply carries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatReply {
    #[serde(default, alias = "response")]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
