//! Controllers behind the gates. Each one is a thin adapter from HTTP to the
//! `Repository` / `UploadService` collaborators held in `AppState`.

pub mod admin;
pub mod destroyer;
pub mod followships;
pub mod replies;
pub mod tweets;
pub mod users;

use crate::{auth::Identity, error::ApiError};

pub const NAME_MAX_CHARS: usize = 50;
pub const INTRODUCTION_MAX_CHARS: usize = 160;
pub const TWEET_MAX_CHARS: usize = 140;
pub const REPLY_MAX_CHARS: usize = 140;
pub const TOP_USERS_LIMIT: i64 = 10;

/// Profile and account edits are only allowed on one's own user.
fn ensure_self(me: &Identity, id: i64) -> Result<(), ApiError> {
    if me.id == id {
        Ok(())
    } else {
        Err(ApiError::forbidden("you can only edit your own account"))
    }
}

/// Trims `value` and checks it is present and at most `max` characters long.
fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ApiError::bad_request(format!(
            "{field} must be {max} characters or fewer"
        )));
    }
    Ok(value.to_string())
}
