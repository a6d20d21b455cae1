use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::CurrentUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    models::{ApiMessage, FollowRequest, Role},
};

/// add_following
///
/// [User Route] Follows another ordinary user.
#[utoipa::path(
    post,
    path = "/followships",
    request_body = FollowRequest,
    responses(
        (status = 200, description = "Following", body = ApiMessage),
        (status = 400, description = "Self or admin target", body = ApiMessage),
        (status = 404, description = "User not found", body = ApiMessage),
        (status = 409, description = "Already following", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn add_following(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FollowRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    if payload.id == me.id {
        return Err(ApiError::bad_request("you cannot follow yourself"));
    }
    let target = state
        .repo
        .get_user(payload.id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    if target.role == Role::Admin {
        return Err(ApiError::bad_request("admins cannot be followed"));
    }
    if !state.repo.follow(me.id, target.id).await? {
        return Err(ApiError::conflict("already following this user"));
    }
    Ok(Json(ApiMessage::success("followed")))
}

#[utoipa::path(
    delete,
    path = "/followships/{followingId}",
    params(("followingId" = i64, Path, description = "ID of the followed user")),
    responses(
        (status = 200, description = "Unfollowed", body = ApiMessage),
        (status = 404, description = "Not following", body = ApiMessage)
    ),
    security(("bearer" = []))
)]
pub async fn remove_following(
    CurrentUser(me): CurrentUser,
    State(state): State<AppState>,
    ApiPath(following_id): ApiPath<i64>,
) -> Result<Json<ApiMessage>, ApiError> {
    if !state.repo.unfollow(me.id, following_id).await? {
        return Err(ApiError::not_found("followship not found"));
    }
    Ok(Json(ApiMessage::success("unfollowed")))
}
