use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};

use super::{
    INTRODUCTION_MAX_CHARS, NAME_MAX_CHARS, TOP_USERS_LIMIT, bounded_text, ensure_self,
};
use crate::{
    AppState,
    auth::{CurrentUser, issue_token},
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{
        AccountUpdate, ApiMessage, NewUser, ProfileUpdate, ReplyView, ReviseUserRequest,
        SignInRequest, SignInResponse, SignUpRequest, TweetView, User, UserCard, UserProfile,
    },
    repository::Repository,
    uploads::{UPLOAD_FIELDS, UploadedFile},
};

/// get_current_user
///
/// [Authenticated Route] The user behind the bearer token. Available to admins too.
#[utoipa::path(
    get,
    path = "/get_current_user",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn get_current_user(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    state
        .repo
        .get_user(me.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user not found"))
}

/// Checks the account/email pair is free, ignoring the user being edited.
async fn ensure_unique(
    repo: &dyn Repository,
    account: Option<&str>,
    email: Option<&str>,
    except: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(account) = account {
        if repo.account_taken(account, except).await? {
            return Err(ApiError::conflict("account already exists"));
        }
    }
    if let Some(email) = email {
        if repo.email_taken(email, except).await? {
            return Err(ApiError::conflict("email already exists"));
        }
    }
    Ok(())
}

/// sign_up
///
/// [Public Route] Creates an ordinary user account.
#[utoipa::path(
    post,
    path = "/users",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created", body = ApiMessage),
        (status = 400, description = "Validation failed", body = ApiMessage),
        (status = 409, description = "Account or email taken", body = ApiMessage)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let account = payload.account.trim();
    let email = payload.email.trim();
    if account.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("all fields are required"));
    }
    let name = bounded_text("name", &payload.name, NAME_MAX_CHARS)?;
    if payload.password != payload.check_password {
        return Err(ApiError::bad_request(
            "password and checkPassword do not match",
        ));
    }

    ensure_unique(state.repo.as_ref(), Some(account), Some(email), None).await?;

    let user = state
        .repo
        .create_user(NewUser {
            account: account.to_string(),
            name,
            email: email.to_string(),
            password: payload.password,
        })
        .await?;
    tracing::info!(user_id = user.id, "account created");

    Ok(Json(ApiMessage::success("account created")))
}

/// sign_in
///
/// [Public Route] Exchanges account and password for a bearer token.
#[utoipa::path(
    post,
    path = "/signIn",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 400, description = "Missing fields", body = ApiMessage),
        (status = 401, description = "Wrong credentials", body = ApiMessage)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let account = payload.account.trim();
    if account.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("account and password are required"));
    }

    let user = state
        .repo
        .verify_credentials(account, &payload.password)
        .await?
        .ok_or_else(|| ApiError::InvalidCredentials("account or password incorrect".to_string()))?;

    let token = issue_token(&state.config, user.id)?;
    tracing::info!(user_id = user.id, role = %user.role, "signed in");

    Ok(Json(SignInResponse {
        status: "success".to_string(),
        message: "ok".to_string(),
        token,
        user,
    }))
}

/// get_top_users
///
/// [User Route] The ten most followed users.
#[utoipa::path(
    get,
    path = "/users/top",
    responses((status = 200, description = "Top users", body = [UserCard])),
    security(("bearer" = []))
)]
pub async fn get_top_users(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserCard>>, ApiError> {
    Ok(Json(state.repo.top_users(me.id, TOP_USERS_LIMIT).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Followers", body = [UserCard])),
    security(("bearer" = []))
)]
pub async fn get_followers(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<UserCard>>, ApiError> {
    Ok(Json(state.repo.followers(id, me.id).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/followings",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Followings", body = [UserCard])),
    security(("bearer" = []))
)]
pub async fn get_followings(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<UserCard>>, ApiError> {
    Ok(Json(state.repo.followings(id, me.id).await?))
}

/// get_user
///
/// [User Route] Profile page with tweet and follow counters.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "Not Found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn get_user(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .repo
        .get_profile(id, me.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user not found"))
}

/// put_user
///
/// [User Route] Edits name, introduction, avatar and cover of one's own profile.
/// Multipart form: text fields `name`, `introduction`; file fields `cover`, `avatar`
/// (at most one file each).
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid form", body = ApiMessage),
        (status = 403, description = "Not your profile", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn put_user(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<User>, ApiError> {
    ensure_self(&me, id)?;
    let mut multipart = multipart?;

    let mut update = ProfileUpdate::default();
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if !UPLOAD_FIELDS.contains(&name.as_str()) {
                return Err(ApiError::bad_request(format!("unexpected file field {name:?}")));
            }
            if files.iter().any(|f| f.field == name) {
                return Err(ApiError::bad_request(format!("only one {name} file is allowed")));
            }
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            // An untouched file input still sends its part, with no name and no bytes.
            if file_name.is_empty() || bytes.is_empty() {
                tracing::debug!(field = %name, "skipping empty file part");
                continue;
            }
            files.push(UploadedFile {
                field: name,
                file_name: Some(file_name),
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        match name.as_str() {
            "name" => {
                let text = field.text().await?;
                update.name = Some(bounded_text("name", &text, NAME_MAX_CHARS)?);
            }
            "introduction" => {
                let text = field.text().await?;
                if text.chars().count() > INTRODUCTION_MAX_CHARS {
                    return Err(ApiError::bad_request(format!(
                        "introduction must be {INTRODUCTION_MAX_CHARS} characters or fewer"
                    )));
                }
                update.introduction = Some(text);
            }
            _ => {}
        }
    }

    for file in files {
        let field = file.field.clone();
        let stored = state.uploads.store(file).await?;
        match field.as_str() {
            "avatar" => update.avatar = Some(stored),
            _ => update.cover = Some(stored),
        }
    }

    state
        .repo
        .update_profile(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user not found"))
}

/// revise_user
///
/// [User Route] Account settings: account, name, email and password.
#[utoipa::path(
    put,
    path = "/users/{id}/revise",
    params(("id" = i64, Path, description = "User ID")),
    request_body = ReviseUserRequest,
    responses(
        (status = 200, description = "Updated", body = ApiMessage),
        (status = 400, description = "Validation failed", body = ApiMessage),
        (status = 409, description = "Account or email taken", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn revise_user(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ReviseUserRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    ensure_self(&me, id)?;

    let non_blank = |field: &str, value: Option<String>| -> Result<Option<String>, ApiError> {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if v.is_empty() => Err(ApiError::bad_request(format!("{field} is required"))),
            other => Ok(other),
        }
    };
    let account = non_blank("account", payload.account)?;
    let email = non_blank("email", payload.email)?;
    let name = payload
        .name
        .map(|name| bounded_text("name", &name, NAME_MAX_CHARS))
        .transpose()?;

    let password = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) if payload.check_password.as_deref() != Some(password.as_str()) => {
            return Err(ApiError::bad_request(
                "password and checkPassword do not match",
            ));
        }
        other => other,
    };

    ensure_unique(state.repo.as_ref(), account.as_deref(), email.as_deref(), Some(id)).await?;

    state
        .repo
        .update_account(
            id,
            AccountUpdate {
                account,
                name,
                email,
                password,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(ApiMessage::success("account updated")))
}

#[utoipa::path(
    get,
    path = "/users/{id}/tweets",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Tweets of the user", body = [TweetView])),
    security(("bearer" = []))
)]
pub async fn get_user_tweets(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<TweetView>>, ApiError> {
    Ok(Json(state.repo.user_tweets(id, me.id).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/likes",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Tweets liked by the user", body = [TweetView])),
    security(("bearer" = []))
)]
pub async fn get_user_likes(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<TweetView>>, ApiError> {
    Ok(Json(state.repo.user_likes(id, me.id).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/replied_tweets",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Replies written by the user", body = [ReplyView])),
    security(("bearer" = []))
)]
pub async fn get_user_replies(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<ReplyView>>, ApiError> {
    Ok(Json(state.repo.user_replies(id).await?))
}
