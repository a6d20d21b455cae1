use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    config::AppConfig,
    error::ApiError,
    models::{Role, User},
    repository::Repository,
};

/// Claims
///
/// Payload of the bearer tokens issued by POST /signIn.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): id of the user in the `users` table.
    pub sub: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// Identity
///
/// The principal resolved by the authentication gate. Lives in the request extensions
/// for the duration of a single request and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

/// issue_token
///
/// Signs a token for `user_id` that expires after the configured TTL. The expiry
/// saturates instead of wrapping around for absurd TTLs.
pub fn issue_token(
    config: &AppConfig,
    user_id: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let ttl = usize::try_from(config.token_ttl_secs).unwrap_or(usize::MAX);
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now.saturating_add(ttl),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// verify_token
///
/// Checks signature and expiry (HS256, default leeway).
pub fn verify_token(
    config: &AppConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

/// Token of an `Authorization: Bearer <token>` header. The scheme is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

/// resolve_identity
///
/// Token → claims → user row → Identity. Every failure short of a repository error
/// collapses into `ApiError::Unauthenticated`.
pub async fn resolve_identity(
    repo: &dyn Repository,
    config: &AppConfig,
    headers: &HeaderMap,
) -> Result<Identity, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;

    let claims = verify_token(config, token).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
            kind => tracing::debug!(?kind, "rejected invalid token"),
        }
        ApiError::Unauthenticated
    })?;

    // The token may outlive the account it was issued for.
    let user = repo.get_user(claims.sub).await?.ok_or_else(|| {
        tracing::debug!(user_id = claims.sub, "token subject no longer exists");
        ApiError::Unauthenticated
    })?;

    Ok(Identity::from(&user))
}

/// authenticate
///
/// Authentication gate. Attaches the resolved `Identity` to the request and continues,
/// or answers 401 `token doesn't exist` without calling the next stage.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_identity(state.repo.as_ref(), &state.config, request.headers()).await {
        Ok(identity) => {
            tracing::Span::current().record("user_id", identity.id);
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// CurrentUser
///
/// Handler-side access to the `Identity` attached by `authenticate`. Rejects with 401
/// when the route was mounted without the authentication gate.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated)
    }
}
