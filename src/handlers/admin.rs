use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::CurrentUser,
    error::ApiError,
    extract::ApiPath,
    models::{AdminUserView, ApiMessage, TweetView},
};

/// get_users
///
/// [Admin Route] Every account with activity counters.
#[utoipa::path(
    get,
    path = "/admin/users",
    operation_id = "admin_get_users",
    responses((status = 200, description = "All users", body = [AdminUserView])),
    security(("bearer" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserView>>, ApiError> {
    Ok(Json(state.repo.admin_users().await?))
}

/// get_tweets
///
/// [Admin Route] Every tweet, newest first.
#[utoipa::path(
    get,
    path = "/admin/tweets",
    operation_id = "admin_get_tweets",
    responses((status = 200, description = "All tweets", body = [TweetView])),
    security(("bearer" = []))
)]
pub async fn get_tweets(State(state): State<AppState>) -> Result<Json<Vec<TweetView>>, ApiError> {
    Ok(Json(state.repo.admin_tweets().await?))
}

/// delete_tweet
///
/// [Admin Route] Removes any tweet, with its replies and likes.
#[utoipa::path(
    delete,
    path = "/admin/tweets/{id}",
    operation_id = "admin_delete_tweet",
    params(("id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 404, description = "Not Found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn delete_tweet(
    CurrentUser(admin): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiMessage>, ApiError> {
    if !state.repo.delete_tweet(id).await? {
        return Err(ApiError::not_found("tweet not found"));
    }
    tracing::info!(tweet_id = id, admin_id = admin.id, "tweet deleted by admin");
    Ok(Json(ApiMessage::success("tweet deleted")))
}
