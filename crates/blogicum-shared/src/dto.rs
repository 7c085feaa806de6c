//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// A user's public information. The email is only shown to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

/// Post form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub text: String,
    /// Publication time; defaults to now. A future date schedules the post.
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

/// Post edit submission. Omitted fields keep their stored values; `image`
/// and `location_id` are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

/// Comment form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
    pub category: Option<CategoryResponse>,
    pub location: Option<LocationResponse>,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub num_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// GET /posts/{post_id}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

/// GET /profile/{username}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: UserResponse,
    pub posts: PageResponse<PostResponse>,
}

/// GET /category/{slug}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPostsResponse {
    pub category: CategoryResponse,
    pub posts: PageResponse<PostResponse>,
}

/// Choices for the post form, plus the post being edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostResponse>,
    pub categories: Vec<CategoryResponse>,
    pub locations: Vec<LocationResponse>,
}
