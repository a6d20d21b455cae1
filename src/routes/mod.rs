//! Route table.
//!
//! Every endpoint is declared once as a `RouteSpec`: method, path, access class and
//! handler. The access class fixes the ordered gate sequence, and the router is built
//! from that same sequence, so what the table says is what runs. The table is assembled
//! at startup and never changes afterwards.
//!
//! The groups mirror the access classes:

/// Routes open to anonymous clients (registration and sign-in).
pub mod public;

/// Routes for authenticated ordinary users; admins are turned away.
pub mod user;

/// Moderation routes, admins only.
pub mod admin;

/// Unguarded bulk deletes, mounted only when explicitly enabled outside production.
pub mod destroyer;

use std::collections::BTreeMap;

use axum::{
    Router,
    handler::Handler,
    http::Method,
    middleware,
    routing::{self, MethodRouter},
};

use crate::{AppState, auth, authorization, authorization::RoleClass, config::AppConfig};

/// Gate
///
/// A check that either forwards the request or terminates it with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Authenticate,
    RequireNonAdmin,
    RequireAdmin,
}

impl Gate {
    /// Wraps `endpoint` with this gate. Layers added later run earlier.
    fn wrap(self, endpoint: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
        match self {
            Gate::Authenticate => endpoint.route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate,
            )),
            Gate::RequireNonAdmin => endpoint.route_layer(middleware::from_fn_with_state(
                state.clone(),
                authorization::require_non_admin,
            )),
            Gate::RequireAdmin => endpoint.route_layer(middleware::from_fn_with_state(
                state.clone(),
                authorization::require_admin,
            )),
        }
    }
}

/// Access
///
/// Access class of a route. Authentication always comes before any authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Authenticated,
    NonAdmin,
    AdminOnly,
    // Destructive and ungated; see `destroyer`.
    Unguarded,
}

impl Access {
    /// Gate sequence derived from the role requirement. Any requirement means the
    /// authentication gate runs first.
    pub fn gates(self) -> &'static [Gate] {
        match self.role_class() {
            None => &[],
            Some(RoleClass::AnyAuthenticated) => &[Gate::Authenticate],
            Some(RoleClass::NonAdmin) => &[Gate::Authenticate, Gate::RequireNonAdmin],
            Some(RoleClass::AdminOnly) => &[Gate::Authenticate, Gate::RequireAdmin],
        }
    }

    /// Role requirement enforced once the caller is authenticated.
    pub fn role_class(self) -> Option<RoleClass> {
        match self {
            Access::Public | Access::Unguarded => None,
            Access::Authenticated => Some(RoleClass::AnyAuthenticated),
            Access::NonAdmin => Some(RoleClass::NonAdmin),
            Access::AdminOnly => Some(RoleClass::AdminOnly),
        }
    }
}

/// RouteSpec
///
/// One row of the route table.
pub struct RouteSpec {
    pub method: Method,
    pub path: &'static str,
    pub access: Access,
    endpoint: MethodRouter<AppState>,
}

impl RouteSpec {
    pub fn get<H, T>(path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::GET, path, access, routing::get(handler))
    }

    pub fn post<H, T>(path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::POST, path, access, routing::post(handler))
    }

    pub fn put<H, T>(path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::PUT, path, access, routing::put(handler))
    }

    pub fn delete<H, T>(path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::DELETE, path, access, routing::delete(handler))
    }

    fn new(
        method: Method,
        path: &'static str,
        access: Access,
        endpoint: MethodRouter<AppState>,
    ) -> Self {
        Self {
            method,
            path,
            access,
            endpoint,
        }
    }

    pub fn gates(&self) -> &'static [Gate] {
        self.access.gates()
    }

    /// The handler wrapped in its gates, first gate outermost.
    fn into_guarded(self, state: &AppState) -> MethodRouter<AppState> {
        let gates = self.gates();
        gates
            .iter()
            .rev()
            .fold(self.endpoint, |endpoint, gate| gate.wrap(endpoint, state))
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("access", &self.access)
            .finish()
    }
}

/// route_table
///
/// Every route the API serves, in registration order.
pub fn route_table(config: &AppConfig) -> Vec<RouteSpec> {
    let mut routes = public::routes();
    routes.extend(user::routes());
    routes.extend(admin::routes());
    if config.destroyer_enabled() {
        routes.extend(destroyer::routes());
    }
    routes
}

/// gate_sequences
///
/// `(method, path) → gates`, independent of the order the routes were listed in.
pub fn gate_sequences<'a>(
    routes: impl IntoIterator<Item = &'a RouteSpec>,
) -> BTreeMap<(String, &'static str), Vec<Gate>> {
    routes
        .into_iter()
        .map(|route| {
            (
                (route.method.as_str().to_string(), route.path),
                route.gates().to_vec(),
            )
        })
        .collect()
}

/// api_router
///
/// Builds the router for the whole route table. Methods sharing a path are merged
/// into one entry, each keeping its own gates.
pub fn api_router(state: &AppState) -> Router<AppState> {
    let table = route_table(&state.config);
    if table.iter().any(|route| route.access == Access::Unguarded) {
        tracing::warn!("destroyer routes are mounted without authentication");
    }
    table.into_iter().fold(Router::new(), |router, route| {
        let path = route.path;
        router.route(path, route.into_guarded(state))
    })
}
