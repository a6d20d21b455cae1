use super::{Access, RouteSpec};
use crate::handlers::admin;

/// Admin Routes
///
/// Moderation endpoints. Authentication first, then `require_admin`; ordinary users
/// receive the permission-denied envelope and the handler never runs.
pub fn routes() -> Vec<RouteSpec> {
    vec![
        // GET /admin/users
        // Every account with tweet, like and follow counters.
        RouteSpec::get("/admin/users", Access::AdminOnly, admin::get_users),
        // GET /admin/tweets
        RouteSpec::get("/admin/tweets", Access::AdminOnly, admin::get_tweets),
        // DELETE /admin/tweets/{id}
        // Removes any tweet regardless of its author.
        RouteSpec::delete("/admin/tweets/{id}", Access::AdminOnly, admin::delete_tweet),
    ]
}
