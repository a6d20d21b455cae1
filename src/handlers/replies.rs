use axum::{Json, extract::State};

use super::{REPLY_MAX_CHARS, bounded_text};
use crate::{
    AppState,
    auth::CurrentUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{ApiMessage, PostReplyRequest, Reply, ReplyView},
};

/// post_reply
///
/// [User Route] Answers an existing tweet.
#[utoipa::path(
    post,
    path = "/tweets/{tweet_id}/replies",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    request_body = PostReplyRequest,
    responses(
        (status = 200, description = "Created", body = Reply),
        (status = 400, description = "Empty or too long", body = ApiMessage),
        (status = 404, description = "Tweet not found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn post_reply(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(tweet_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PostReplyRequest>,
) -> Result<Json<Reply>, ApiError> {
    let comment = bounded_text("comment", &payload.comment, REPLY_MAX_CHARS)?;
    if state.repo.get_tweet(tweet_id, me.id).await?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }
    Ok(Json(state.repo.create_reply(tweet_id, me.id, &comment).await?))
}

#[utoipa::path(
    get,
    path = "/tweets/{tweet_id}/replies",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Replies, oldest first", body = [ReplyView]),
        (status = 404, description = "Tweet not found", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn get_replies(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(tweet_id): ApiPath<i64>,
) -> Result<Json<Vec<ReplyView>>, ApiError> {
    if state.repo.get_tweet(tweet_id, me.id).await?.is_none() {
        return Err(ApiError::not_found("tweet not found"));
    }
    Ok(Json(state.repo.list_replies(tweet_id).await?))
}
