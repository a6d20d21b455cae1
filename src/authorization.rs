use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    auth::Identity,
    config::DenialStatus,
    error::PERMISSION_DENIED,
    models::{ApiMessage, Role},
};

/// RoleClass
///
/// The role requirement attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleClass {
    AnyAuthenticated,
    NonAdmin,
    AdminOnly,
}

/// PermissionDecision
///
/// Outcome of `authorize`: continue, or stop with a reason for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    Deny { reason: &'static str },
}

/// authorize
///
/// Pure function of the caller's role and the route's class. A missing identity is
/// always denied.
pub fn authorize(identity: Option<&Identity>, class: RoleClass) -> PermissionDecision {
    let Some(identity) = identity else {
        return PermissionDecision::Deny {
            reason: PERMISSION_DENIED,
        };
    };
    let allowed = match (class, identity.role) {
        (RoleClass::AnyAuthenticated, _) => true,
        (RoleClass::NonAdmin, Role::User) => true,
        (RoleClass::NonAdmin, Role::Admin) => false,
        (RoleClass::AdminOnly, Role::Admin) => true,
        (RoleClass::AdminOnly, Role::User) => false,
    };
    if allowed {
        PermissionDecision::Allow
    } else {
        PermissionDecision::Deny {
            reason: PERMISSION_DENIED,
        }
    }
}

/// Denial response with the configured status and the error envelope.
pub fn permission_denied(status: DenialStatus, reason: &str) -> Response {
    (status.status_code(), Json(ApiMessage::error(reason))).into_response()
}

async fn gate(state: &AppState, class: RoleClass, request: Request, next: Next) -> Response {
    let identity = request.extensions().get::<Identity>();
    match authorize(identity, class) {
        PermissionDecision::Allow => next.run(request).await,
        PermissionDecision::Deny { reason } => {
            tracing::info!(
                ?class,
                user_id = identity.map(|i| i.id),
                role = identity.map(|i| i.role.as_str()),
                path = %request.uri().path(),
                "permission denied"
            );
            permission_denied(state.config.denial_status, reason)
        }
    }
}

/// require_non_admin
///
/// Authorization gate for the ordinary-user surface: admins are turned away.
pub async fn require_non_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(&state, RoleClass::NonAdmin, request, next).await
}

/// require_admin
///
/// Authorization gate for the moderation surface.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    gate(&state, RoleClass::AdminOnly, request, next).await
}
