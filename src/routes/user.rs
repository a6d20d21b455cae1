use super::{Access, RouteSpec};
use crate::handlers::{followships, replies, tweets, users};

/// User Routes
///
/// Everything an ordinary member does. All but `/get_current_user` pass the
/// authentication gate and then `require_non_admin`, so admins cannot act as users.
///
/// Path parameters are all named `{id}`: the router refuses two different parameter
/// names at the same segment, and the single `Path<i64>` extractors are positional.
pub fn routes() -> Vec<RouteSpec> {
    vec![
        // GET /get_current_user
        // The caller's own record. Admins may call it too (authentication only).
        RouteSpec::get("/get_current_user", Access::Authenticated, users::get_current_user),
        // --- Profiles ---
        // GET /users/top
        // Ten most followed users. Static segment, matched before `/users/{id}`.
        RouteSpec::get("/users/top", Access::NonAdmin, users::get_top_users),
        RouteSpec::get("/users/{id}/followers", Access::NonAdmin, users::get_followers),
        RouteSpec::get("/users/{id}/followings", Access::NonAdmin, users::get_followings),
        RouteSpec::get("/users/{id}", Access::NonAdmin, users::get_user),
        // PUT /users/{id}
        // Multipart profile edit with optional `cover` and `avatar` files.
        RouteSpec::put("/users/{id}", Access::NonAdmin, users::put_user),
        // PUT /users/{id}/revise
        // Account settings (account, email, password).
        RouteSpec::put("/users/{id}/revise", Access::NonAdmin, users::revise_user),
        RouteSpec::get("/users/{id}/tweets", Access::NonAdmin, users::get_user_tweets),
        RouteSpec::get("/users/{id}/likes", Access::NonAdmin, users::get_user_likes),
        RouteSpec::get("/users/{id}/replied_tweets", Access::NonAdmin, users::get_user_replies),
        // --- Tweets ---
        RouteSpec::post("/tweets", Access::NonAdmin, tweets::post_tweet),
        RouteSpec::get("/tweets", Access::NonAdmin, tweets::get_tweets),
        RouteSpec::get("/tweets/{id}", Access::NonAdmin, tweets::get_tweet),
        // --- Replies ---
        RouteSpec::post("/tweets/{id}/replies", Access::NonAdmin, replies::post_reply),
        RouteSpec::get("/tweets/{id}/replies", Access::NonAdmin, replies::get_replies),
        // --- Likes ---
        RouteSpec::post("/tweets/{id}/like", Access::NonAdmin, tweets::add_like),
        RouteSpec::post("/tweets/{id}/unlike", Access::NonAdmin, tweets::remove_like),
        // --- Followships ---
        RouteSpec::post("/followships", Access::NonAdmin, followships::add_following),
        RouteSpec::delete("/followships/{id}", Access::NonAdmin, followships::remove_following),
    ]
}
