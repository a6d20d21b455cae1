use axum::{Json, extract::State};

use super::{TWEET_MAX_CHARS, bounded_text};
use crate::{
    AppState,
    auth::CurrentUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{ApiMessage, PostTweetRequest, Tweet, TweetDetail, TweetView},
};

/// post_tweet
///
/// [User Route] Publishes a tweet of at most 140 characters.
#[utoipa::path(
    post,
    path = "/tweets",
    request_body = PostTweetRequest,
    responses(
        (status = 200, description = "Created", body = Tweet),
        (status = 400, description = "Empty or too long", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn post_tweet(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PostTweetRequest>,
) -> Result<Json<Tweet>, ApiError> {
    let description = bounded_text("description", &payload.description, TWEET_MAX_CHARS)?;
    let tweet = state.repo.create_tweet(me.id, &description).await?;
    tracing::debug!(tweet_id = tweet.id, user_id = me.id, "tweet created");
    Ok(Json(tweet))
}

/// get_tweets
///
/// [User Route] Every tweet, newest first.
#[utoipa::path(
    get,
    path = "/tweets",
    responses((status = 200, description = "Timeline", body = [TweetView])),
    security(("bearer" = []))
)]
pub async fn get_tweets(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TweetView>>, ApiError> {
    Ok(Json(state.repo.list_tweets(me.id).await?))
}

/// get_tweet
///
/// [User Route] One tweet with its replies.
#[utoipa::path(
    get,
    path = "/tweets/{id}",
    params(("id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Found", body = TweetDetail),
        (status = 404, description = "Not Found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn get_tweet(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TweetDetail>, ApiError> {
    let tweet = state
        .repo
        .get_tweet(id, me.id)
        .await?
        .ok_or_else(|| ApiError::not_found("tweet not found"))?;
    let replies = state.repo.list_replies(id).await?;
    Ok(Json(TweetDetail { tweet, replies }))
}

/// add_like
///
/// [User Route] Likes a tweet. Liking twice is a conflict.
#[utoipa::path(
    post,
    path = "/tweets/{id}/like",
    params(("id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Liked", body = ApiMessage),
        (status = 404, description = "Tweet not found", body = ApiMessage),
        (status = 409, description = "Already liked", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn add_like(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiMessage>, ApiError> {
    if state.repo.get_tweet(id, me.id).await?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }
    if !state.repo.like_tweet(me.id, id).await? {
        return Err(ApiError::conflict("tweet already liked"));
    }
    Ok(Json(ApiMessage::success("tweet liked")))
}

#[utoipa::path(
    post,
    path = "/tweets/{id}/unlike",
    params(("id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Unliked", body = ApiMessage),
        (status = 404, description = "Like not found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn remove_like(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiMessage>, ApiError> {
    if !state.repo.unlike_tweet(me.id, id).await? {
        return Err(ApiError::not_found("like not found"));
    }
    Ok(Json(ApiMessage::success("tweet unliked")))
}
