use super::{Access, RouteSpec};
use crate::handlers::users;

/// Public Routes
///
/// Account creation and sign-in. Nothing here reads or writes another user's data.
pub fn routes() -> Vec<RouteSpec> {
    vec![
        // POST /users
        // Registers an ordinary user account.
        RouteSpec::post("/users", Access::Public, users::sign_up),
        // POST /signIn
        // Issues a bearer token for valid credentials.
        RouteSpec::post("/signIn", Access::Public, users::sign_in),
    ]
}
