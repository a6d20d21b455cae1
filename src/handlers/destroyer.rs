//! Bulk deletes for wiping a development database. These routes carry no gates and
//! are only mounted when `ENABLE_DESTROYER_ROUTES` is set outside production.

use axum::{Json, extract::State};

use crate::{AppState, error::ApiError, models::DeletedRows};

fn deleted(what: &str, count: u64) -> Json<DeletedRows> {
    tracing::warn!(count, "destroyer removed all {what}");
    Json(DeletedRows {
        status: "success".to_string(),
        message: format!("all {what} deleted"),
        deleted: count,
    })
}

/// Deletes every ordinary user; admin accounts are kept.
#[utoipa::path(
    delete,
    path = "/destroyer/users",
    responses((status = 200, description = "Deleted", body = DeletedRows))
)]
pub async fn delete_all_users(
    State(state): State<AppState>,
) -> Result<Json<DeletedRows>, ApiError> {
    Ok(deleted("users", state.repo.delete_all_users().await?))
}

#[utoipa::path(
    delete,
    path = "/destroyer/tweets",
    responses((status = 200, description = "Deleted", body = DeletedRows))
)]
pub async fn delete_all_tweets(
    State(state): State<AppState>,
) -> Result<Json<DeletedRows>, ApiError> {
    Ok(deleted("tweets", state.repo.delete_all_tweets().await?))
}

#[utoipa::path(
    delete,
    path = "/destroyer/replies",
    responses((status = 200, description = "Deleted", body = DeletedRows))
)]
pub async fn delete_all_replies(
    State(state): State<AppState>,
) -> Result<Json<DeletedRows>, ApiError> {
    Ok(deleted("replies", state.repo.delete_all_replies().await?))
}
