#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use simple_twitter_api::{
    AppConfig, AppState, create_router,
    auth::{Claims, issue_token},
    models::{
        AccountUpdate, AdminUserView, NewUser, ProfileUpdate, Reply, ReplyView, Role, Tweet,
        TweetView, User, UserCard, UserProfile,
    },
    repository::{RepoResult, Repository, RepositoryError, RepositoryState},
    uploads::{MockUploadService, UploadError, UploadService, UploadState, UploadedFile},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

pub const ADMIN_ID: i64 = 1;
pub const ALICE_ID: i64 = 2;
pub const BOB_ID: i64 = 3;
pub const ALICE_TWEET_ID: i64 = 10;
pub const MISSING_ID: i64 = 999;
pub const PASSWORD: &str = "12345678";

// --- MOCK REPOSITORY IMPLEMENTATION ---

/// In-memory repository seeded with one admin (`root`), two users (`alice`, `bob`) and one
/// tweet by alice. Every call is recorded so tests can assert a handler never ran.
pub struct MockRepo {
    pub users: Mutex<Vec<User>>,
    pub likes: Mutex<HashSet<(i64, i64)>>,
    pub follows: Mutex<HashSet<(i64, i64)>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub last_profile_update: Mutex<Option<ProfileUpdate>>,
    pub last_account_update: Mutex<Option<AccountUpdate>>,
    pub deleted_tweets: Mutex<Vec<i64>>,
    // Simulates an unreachable database on every call.
    pub fail: bool,
}

pub fn user(id: i64, account: &str, role: Role) -> User {
    User {
        id,
        account: account.to_string(),
        name: account.to_string(),
        email: format!("{account}@example.com"),
        role,
        created_at: Utc::now(),
        ..User::default()
    }
}

impl Default for MockRepo {
    fn default() -> Self {
        Self {
            users: Mutex::new(vec![
                user(ADMIN_ID, "root", Role::Admin),
                user(ALICE_ID, "alice", Role::User),
                user(BOB_ID, "bob", Role::User),
            ]),
            likes: Mutex::new(HashSet::new()),
            follows: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            last_profile_update: Mutex::new(None),
            last_account_update: Mutex::new(None),
            deleted_tweets: Mutex::new(Vec::new()),
            fail: false,
        }
    }
}

impl MockRepo {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_user(self, id: i64, account: &str, role: Role) -> Self {
        self.users.lock().unwrap().push(user(id, account, role));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, name: &str) -> bool {
        self.calls().iter().any(|call| *call == name)
    }

    pub fn remove_user(&self, id: i64) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }

    fn record(&self, name: &'static str) -> RepoResult<()> {
        self.calls.lock().unwrap().push(name);
        if self.fail {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn find(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn tweet_view(&self, viewer: i64) -> TweetView {
        TweetView {
            id: ALICE_TWEET_ID,
            user_id: ALICE_ID,
            description: "hello".to_string(),
            account: "alice".to_string(),
            name: "alice".to_string(),
            is_liked: self.likes.lock().unwrap().contains(&(viewer, ALICE_TWEET_ID)),
            ..TweetView::default()
        }
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        self.record("get_user")?;
        Ok(self.find(id))
    }

    async fn verify_credentials(&self, account: &str, password: &str) -> RepoResult<Option<User>> {
        self.record("verify_credentials")?;
        if password != PASSWORD {
            return Ok(None);
        }
        Ok(self.users.lock().unwrap().iter().find(|u| u.account == account).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> RepoResult<User> {
        self.record("create_user")?;
        let mut users = self.users.lock().unwrap();
        let created = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            account: new_user.account,
            name: new_user.name,
            email: new_user.email,
            ..User::default()
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn account_taken(&self, account: &str, except: Option<i64>) -> RepoResult<bool> {
        self.record("account_taken")?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.account == account && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> RepoResult<bool> {
        self.record("email_taken")?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn get_profile(&self, id: i64, viewer: i64) -> RepoResult<Option<UserProfile>> {
        self.record("get_profile")?;
        Ok(self.find(id).map(|u| UserProfile {
            id: u.id,
            account: u.account,
            name: u.name,
            email: u.email,
            is_followed: self.follows.lock().unwrap().contains(&(viewer, id)),
            ..UserProfile::default()
        }))
    }

    async fn top_users(&self, _viewer: i64, limit: i64) -> RepoResult<Vec<UserCard>> {
        self.record("top_users")?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == Role::User)
            .take(limit as usize)
            .map(|u| UserCard {
                id: u.id,
                account: u.account.clone(),
                name: u.name.clone(),
                ..UserCard::default()
            })
            .collect())
    }

    async fn followers(&self, _id: i64, _viewer: i64) -> RepoResult<Vec<UserCard>> {
        self.record("followers")?;
        Ok(vec![])
    }

    async fn followings(&self, _id: i64, _viewer: i64) -> RepoResult<Vec<UserCard>> {
        self.record("followings")?;
        Ok(vec![])
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<User>> {
        self.record("update_profile")?;
        *self.last_profile_update.lock().unwrap() = Some(update.clone());
        Ok(self.find(id).map(|mut u| {
            if let Some(name) = update.name {
                u.name = name;
            }
            u.introduction = update.introduction.or(u.introduction);
            u.avatar = update.avatar.or(u.avatar);
            u.cover = update.cover.or(u.cover);
            u
        }))
    }

    async fn update_account(&self, id: i64, update: AccountUpdate) -> RepoResult<Option<User>> {
        self.record("update_account")?;
        *self.last_account_update.lock().unwrap() = Some(update);
        Ok(self.find(id))
    }

    async fn user_tweets(&self, id: i64, viewer: i64) -> RepoResult<Vec<TweetView>> {
        self.record("user_tweets")?;
        Ok(if id == ALICE_ID { vec![self.tweet_view(viewer)] } else { vec![] })
    }

    async fn user_likes(&self, _id: i64, _viewer: i64) -> RepoResult<Vec<TweetView>> {
        self.record("user_likes")?;
        Ok(vec![])
    }

    async fn user_replies(&self, _id: i64) -> RepoResult<Vec<ReplyView>> {
        self.record("user_replies")?;
        Ok(vec![])
    }

    async fn create_tweet(&self, user_id: i64, description: &str) -> RepoResult<Tweet> {
        self.record("create_tweet")?;
        Ok(Tweet {
            id: 11,
            user_id,
            description: description.to_string(),
            ..Tweet::default()
        })
    }

    async fn list_tweets(&self, viewer: i64) -> RepoResult<Vec<TweetView>> {
        self.record("list_tweets")?;
        Ok(vec![self.tweet_view(viewer)])
    }

    async fn get_tweet(&self, id: i64, viewer: i64) -> RepoResult<Option<TweetView>> {
        self.record("get_tweet")?;
        Ok((id == ALICE_TWEET_ID).then(|| self.tweet_view(viewer)))
    }

    async fn create_reply(&self, tweet_id: i64, user_id: i64, comment: &str) -> RepoResult<Reply> {
        self.record("create_reply")?;
        Ok(Reply {
            id: 20,
            user_id,
            tweet_id,
            comment: comment.to_string(),
            ..Reply::default()
        })
    }

    async fn list_replies(&self, _tweet_id: i64) -> RepoResult<Vec<ReplyView>> {
        self.record("list_replies")?;
        Ok(vec![])
    }

    async fn like_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool> {
        self.record("like_tweet")?;
        Ok(self.likes.lock().unwrap().insert((user_id, tweet_id)))
    }

    async fn unlike_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool> {
        self.record("unlike_tweet")?;
        Ok(self.likes.lock().unwrap().remove(&(user_id, tweet_id)))
    }

    async fn follow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool> {
        self.record("follow")?;
        Ok(self.follows.lock().unwrap().insert((follower_id, following_id)))
    }

    async fn unfollow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool> {
        self.record("unfollow")?;
        Ok(self.follows.lock().unwrap().remove(&(follower_id, following_id)))
    }

    async fn admin_users(&self) -> RepoResult<Vec<AdminUserView>> {
        self.record("admin_users")?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .map(|u| AdminUserView {
                id: u.id,
                account: u.account.clone(),
                name: u.name.clone(),
                role: u.role,
                ..AdminUserView::default()
            })
            .collect())
    }

    async fn admin_tweets(&self) -> RepoResult<Vec<TweetView>> {
        self.record("admin_tweets")?;
        Ok(vec![self.tweet_view(ADMIN_ID)])
    }

    async fn delete_tweet(&self, id: i64) -> RepoResult<bool> {
        self.record("delete_tweet")?;
        self.deleted_tweets.lock().unwrap().push(id);
        Ok(id != MISSING_ID)
    }

    async fn delete_all_users(&self) -> RepoResult<u64> {
        self.record("delete_all_users")?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.role == Role::Admin);
        Ok((before - users.len()) as u64)
    }

    async fn delete_all_tweets(&self) -> RepoResult<u64> {
        self.record("delete_all_tweets")?;
        Ok(1)
    }

    async fn delete_all_replies(&self) -> RepoResult<u64> {
        self.record("delete_all_replies")?;
        Ok(0)
    }
}

// --- UPLOAD BACKENDS ---

/// Upload backend that refuses every file, the way a content-checking store would.
pub struct RejectingUploads;

#[async_trait]
impl UploadService for RejectingUploads {
    async fn store(&self, file: UploadedFile) -> Result<String, UploadError> {
        Err(UploadError::Rejected(format!("{} is not an image", file.field)))
    }
}

// --- APP CONSTRUCTION ---

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MockRepo>,
    pub config: AppConfig,
}

pub fn spawn_with(
    config: AppConfig,
    repo: MockRepo,
    uploads: impl UploadService + 'static,
) -> TestApp {
    let repo = Arc::new(repo);
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        uploads: Arc::new(uploads) as UploadState,
        config: config.clone(),
    };
    TestApp {
        router: create_router(state),
        repo,
        config,
    }
}

pub fn spawn(config: AppConfig) -> TestApp {
    spawn_with(config, MockRepo::default(), MockUploadService::new())
}

pub fn spawn_default() -> TestApp {
    spawn(AppConfig::default())
}

// --- TOKENS ---

pub fn token_for(config: &AppConfig, user_id: i64) -> String {
    issue_token(config, user_id).unwrap()
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A token whose expiry lies well beyond the validation leeway.
pub fn expired_token(config: &AppConfig, user_id: i64) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now - 7200,
        exp: now - 3600,
    };
    sign(&claims, &config.jwt_secret)
}

/// A well-formed token signed with a secret the server does not know.
pub fn foreign_token(user_id: i64) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    sign(&claims, "some-other-secret")
}

// --- REQUESTS ---

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn is_error_envelope(&self, message: &str) -> bool {
        self.body["status"] == "error" && self.message() == message
    }
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    execute(app, request).await
}

/// Sends `body` verbatim with the given content type, for payloads `send` cannot express.
pub async fn send_raw(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: &str,
    content_type: &str,
    body: &str,
) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    execute(app, request).await
}

pub async fn execute(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, body }
}
