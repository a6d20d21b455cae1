use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::ApiMessage, repository::RepositoryError, uploads::UploadError};

/// Message of the authentication gate's rejection, kept verbatim for existing clients.
pub const TOKEN_MISSING: &str = "token doesn't exist";
/// Message of the authorization gates' rejection.
pub const PERMISSION_DENIED: &str = "permission denied";

/// ApiError
///
/// Every failure a handler or gate can surface. Converted into the
/// `{ "status": "error", "message": ... }` envelope at the edge.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{}", TOKEN_MISSING)]
    Unauthenticated,
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    // Extractor rejections, re-wrapped so they share the error envelope.
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error(transparent)]
    PathParams(#[from] PathRejection),
    #[error(transparent)]
    MultipartBody(#[from] MultipartRejection),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::JsonBody(e) => e.status(),
            ApiError::PathParams(e) => e.status(),
            ApiError::MultipartBody(e) => e.status(),
            ApiError::Upload(UploadError::Rejected(_)) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Repository(_) | ApiError::Upload(_) | ApiError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Collaborator failures are logged in full but never echoed to the client.
            ApiError::Repository(e) => {
                tracing::error!(error = ?e, "repository failure");
                "internal server error".to_string()
            }
            ApiError::Upload(UploadError::Rejected(reason)) => reason.clone(),
            ApiError::Upload(e) => {
                tracing::error!(error = ?e, "upload failure");
                "internal server error".to_string()
            }
            ApiError::Token(e) => {
                tracing::error!(error = ?e, "token signing failure");
                "internal server error".to_string()
            }
            ApiError::Multipart(e) => e.body_text(),
            ApiError::JsonBody(e) => e.body_text(),
            ApiError::PathParams(e) => e.body_text(),
            ApiError::MultipartBody(e) => e.body_text(),
            other => other.to_string(),
        };
        (status, Json(ApiMessage::error(message))).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    /// Unique violations answer 409 and dangling references 404; the rest stays a 500.
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(constraint) => {
                tracing::debug!(%constraint, "unique constraint rejected write");
                let message = if constraint.contains("email") {
                    "email already exists"
                } else if constraint.contains("account") {
                    "account already exists"
                } else {
                    "record already exists"
                };
                ApiError::conflict(message)
            }
            RepositoryError::MissingReference(constraint) => {
                tracing::debug!(%constraint, "foreign key rejected write");
                ApiError::not_found("referenced record not found")
            }
            other => ApiError::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthenticated_is_401_with_legacy_message() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"status":"error","message":"token doesn't exist"}"#);
    }

    #[tokio::test]
    async fn repository_errors_do_not_leak_details() {
        let err = ApiError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ApiMessage = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body, ApiMessage::error("internal server error"));
    }

    #[test]
    fn constraint_violations_become_client_errors() {
        let err = ApiError::from(RepositoryError::Conflict("users_email_key".to_string()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "email already exists");

        let err = ApiError::from(RepositoryError::Conflict("users_account_key".to_string()));
        assert_eq!(err.to_string(), "account already exists");

        let err =
            ApiError::from(RepositoryError::MissingReference("likes_tweet_id_fkey".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejected_uploads_are_bad_requests() {
        let err = ApiError::from(UploadError::Rejected("avatar is empty".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ApiMessage = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body, ApiMessage::error("avatar is empty"));
    }

    #[test]
    fn upload_io_failures_stay_server_errors() {
        let err = ApiError::from(UploadError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_map_to_their_status() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
    }
}
