use super::{Access, RouteSpec};
use crate::handlers::destroyer;

/// Destroyer Routes
///
/// Wipe users, tweets or replies with no authentication at all. Only included in the
/// route table when `AppConfig::destroyer_enabled()` holds.
pub fn routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::delete("/destroyer/users", Access::Unguarded, destroyer::delete_all_users),
        RouteSpec::delete("/destroyer/tweets", Access::Unguarded, destroyer::delete_all_tweets),
        RouteSpec::delete("/destroyer/replies", Access::Unguarded, destroyer::delete_all_replies),
    ]
}
