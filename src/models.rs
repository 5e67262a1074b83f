use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated principal: opaque stable id plus the email it signed up with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Authorization label attached to an identity via its `users/{id}` document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// `users/{id}` document. Created once at sign-up; the role is only ever
/// changed by out-of-band administrative action.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a submitted script. `rejected` never persists: rejection
/// deletes the document, so only these two states are stored.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Pending,
    Completed,
}

/// `scripts/{id}` document: a user-submitted trading strategy under
/// moderation. `user_email` is a denormalized copy taken at submission time
/// and may diverge from the account email later.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: String,
    pub title: String,
    pub description: String,
    pub indicators: Vec<String>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Inline data-URL image, if the submitter attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Deliverable payload; absent until moderation supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pine_script: Option<String>,
    pub status: ScriptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

/// `products/{id}` document: an admin-managed catalog item. Price, rating
/// and review fields are free-form display strings, not validated numerics.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub original_price: String,
    pub discount: String,
    pub rating: String,
    pub reviews: String,
    pub compatibility: Vec<String>,
    pub detailed_description: Vec<String>,
    pub media_url: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `admin/config` singleton: running counter shown on the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    pub scripts_count: u64,
}

/// Session token claims (JWT).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthClaims {
    pub sub: String, // user id
    pub email: String,
    pub exp: usize,
}

/// Password-reset token claims. Delivery of the token is out of scope here.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetClaims {
    pub sub: String, // user id
    pub exp: usize,
}
