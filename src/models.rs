use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Roles ---

/// Role
///
/// The two account classes known to the API. Stored as text in the `users.role` column;
/// anything other than `admin` is an ordinary user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Core Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table without the password hash. This is what the
/// authentication gate resolves a token subject to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub account: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    pub introduction: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCard
///
/// Compact user entry used by the top-users, followers and followings listings.
/// `is_followed` is computed for the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserCard {
    pub id: i64,
    pub account: String,
    pub name: String,
    pub avatar: Option<String>,
    pub introduction: Option<String>,
    pub follower_count: i64,
    pub is_followed: bool,
}

/// UserProfile
///
/// Full profile page of a user (GET /users/:id), with relationship counters.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub account: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    pub introduction: Option<String>,
    pub tweet_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_followed: bool,
}

/// AdminUserView
///
/// Moderation listing entry (GET /admin/users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminUserView {
    pub id: i64,
    pub account: String,
    pub name: String,
    pub avatar: Option<String>,
    pub cover: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub tweet_count: i64,
    // Likes received on the user's tweets.
    pub like_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Tweet
///
/// A freshly inserted `tweets` row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tweet {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// TweetView
///
/// A tweet joined with its author and counters. `is_liked` is computed for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TweetView {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub account: String,
    pub name: String,
    pub avatar: Option<String>,
    pub reply_count: i64,
    pub like_count: i64,
    pub is_liked: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// TweetDetail
///
/// GET /tweets/:id payload: the tweet and its replies, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TweetDetail {
    #[serde(flatten)]
    pub tweet: TweetView,
    pub replies: Vec<ReplyView>,
}

/// Reply
///
/// A freshly inserted `replies` row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reply {
    pub id: i64,
    pub user_id: i64,
    pub tweet_id: i64,
    pub comment: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ReplyView
///
/// A reply joined with its author and the account of the tweet it answers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReplyView {
    pub id: i64,
    pub user_id: i64,
    pub tweet_id: i64,
    pub comment: String,
    pub account: String,
    pub name: String,
    pub avatar: Option<String>,
    // Account of the replied tweet's author ("replying to @...").
    pub tweet_author_account: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignUpRequest {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub check_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignInRequest {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub password: String,
}

/// ReviseUserRequest
///
/// Account settings (PUT /users/:id/revise). Omitted fields are left unchanged;
/// a new password must come with a matching `checkPassword`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReviseUserRequest {
    pub account: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub check_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostTweetRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostReplyRequest {
    #[serde(default)]
    pub comment: String,
}

/// FollowRequest
///
/// POST /followships body: the id of the user to follow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FollowRequest {
    pub id: i64,
}

// --- Repository Inputs ---

/// New account as validated by the sign-up handler. The password is handed to the
/// repository in clear and hashed by the database.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub introduction: Option<String>,
    pub avatar: Option<String>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub account: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

// --- Response Envelopes ---

/// ApiMessage
///
/// `{ "status": "success" | "error", "message": ... }`, the envelope shared by every
/// mutation and every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct ApiMessage {
    pub status: String,
    pub message: String,
}

impl ApiMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInResponse {
    pub status: String,
    pub message: String,
    pub token: String,
    pub user: User,
}

/// DeletedRows
///
/// Result of a bulk delete: the envelope plus the number of rows removed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeletedRows {
    pub status: String,
    pub message: String,
    pub deleted: u64,
}
