use crate::models::{
    AccountUpdate, AdminUserView, NewUser, ProfileUpdate, Reply, ReplyView, Tweet, TweetView,
    User, UserCard, UserProfile,
};
use async_trait::async_trait;
use sqlx::{PgPool, error::ErrorKind};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("unique constraint {0} violated")]
    Conflict(String),
    /// A foreign key pointed at a row that is gone, e.g. a tweet deleted mid-request.
    #[error("foreign key constraint {0} violated")]
    MissingReference(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let violation = err
            .as_database_error()
            .map(|db| (db.kind(), db.constraint().unwrap_or_default().to_string()));
        match violation {
            Some((ErrorKind::UniqueViolation, constraint)) => Self::Conflict(constraint),
            Some((ErrorKind::ForeignKeyViolation, constraint)) => {
                Self::MissingReference(constraint)
            }
            _ => Self::Database(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The data-access interface behind every gate and controller. Handlers only see this
/// trait, so the Postgres implementation can be swapped for a mock in tests.
///
/// `viewer` arguments are the id of the authenticated user and drive the
/// `is_followed` / `is_liked` flags.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity ---
    // User lookup used by the authentication gate.
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    // Returns the user whose password matches; hashing is done by the database.
    async fn verify_credentials(&self, account: &str, password: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // Uniqueness checks. `except` excludes the user being edited.
    async fn account_taken(&self, account: &str, except: Option<i64>) -> RepoResult<bool>;
    async fn email_taken(&self, email: &str, except: Option<i64>) -> RepoResult<bool>;

    // --- Profiles ---
    async fn get_profile(&self, id: i64, viewer: i64) -> RepoResult<Option<UserProfile>>;
    async fn top_users(&self, viewer: i64, limit: i64) -> RepoResult<Vec<UserCard>>;
    async fn followers(&self, id: i64, viewer: i64) -> RepoResult<Vec<UserCard>>;
    async fn followings(&self, id: i64, viewer: i64) -> RepoResult<Vec<UserCard>>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<User>>;
    async fn update_account(&self, id: i64, update: AccountUpdate) -> RepoResult<Option<User>>;
    async fn user_tweets(&self, id: i64, viewer: i64) -> RepoResult<Vec<TweetView>>;
    async fn user_likes(&self, id: i64, viewer: i64) -> RepoResult<Vec<TweetView>>;
    async fn user_replies(&self, id: i64) -> RepoResult<Vec<ReplyView>>;

    // --- Tweets & Replies ---
    async fn create_tweet(&self, user_id: i64, description: &str) -> RepoResult<Tweet>;
    async fn list_tweets(&self, viewer: i64) -> RepoResult<Vec<TweetView>>;
    async fn get_tweet(&self, id: i64, viewer: i64) -> RepoResult<Option<TweetView>>;
    async fn create_reply(&self, tweet_id: i64, user_id: i64, comment: &str) -> RepoResult<Reply>;
    async fn list_replies(&self, tweet_id: i64) -> RepoResult<Vec<ReplyView>>;

    // --- Likes & Followships ---
    // Return true only when a row was inserted/removed.
    async fn like_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool>;
    async fn unlike_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool>;
    async fn follow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool>;
    async fn unfollow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool>;

    // --- Moderation ---
    async fn admin_users(&self) -> RepoResult<Vec<AdminUserView>>;
    async fn admin_tweets(&self) -> RepoResult<Vec<TweetView>>;
    async fn delete_tweet(&self, id: i64) -> RepoResult<bool>;

    // --- Bulk deletes (destroyer routes) ---
    // Admin accounts survive `delete_all_users`.
    async fn delete_all_users(&self) -> RepoResult<u64>;
    async fn delete_all_tweets(&self) -> RepoResult<u64>;
    async fn delete_all_replies(&self) -> RepoResult<u64>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are checked at runtime so the crate builds
/// without a live database; passwords are hashed with pgcrypto's `crypt()`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    u.id, u.account, u.name, u.email, u.avatar, u.cover, u.introduction,
    COALESCE(u.role, 'user') AS role, u.created_at
"#;

// Shared projection for tweet listings; `$1` is always the viewer id.
const TWEET_VIEW: &str = r#"
    SELECT
        t.id, t.user_id, t.description, u.account, u.name, u.avatar,
        (SELECT COUNT(*) FROM replies r WHERE r.tweet_id = t.id) AS reply_count,
        (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS like_count,
        EXISTS (SELECT 1 FROM likes l WHERE l.tweet_id = t.id AND l.user_id = $1) AS is_liked,
        t.created_at, t.updated_at
    FROM tweets t
    JOIN users u ON u.id = t.user_id
"#;

// Shared projection for user cards; `$1` is always the viewer id.
const USER_CARD: &str = r#"
    SELECT
        u.id, u.account, u.name, u.avatar, u.introduction,
        (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count,
        EXISTS (
            SELECT 1 FROM followships f WHERE f.follower_id = $1 AND f.following_id = u.id
        ) AS is_followed
    FROM users u
"#;

const REPLY_VIEW: &str = r#"
    SELECT
        r.id, r.user_id, r.tweet_id, r.comment, u.account, u.name, u.avatar,
        tu.account AS tweet_author_account, r.created_at
    FROM replies r
    JOIN users u ON u.id = r.user_id
    JOIN tweets t ON t.id = r.tweet_id
    JOIN users tu ON tu.id = t.user_id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// verify_credentials
    ///
    /// `crypt(candidate, stored_hash)` reproduces the stored hash only for the right password.
    async fn verify_credentials(&self, account: &str, password: &str) -> RepoResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.account = $1 AND u.password = crypt($2, u.password)"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(account)
            .bind(password)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            r#"
            WITH u AS (
                INSERT INTO users (account, name, email, password, role, created_at, updated_at)
                VALUES ($1, $2, $3, crypt($4, gen_salt('bf')), 'user', NOW(), NOW())
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user.account)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn account_taken(&self, account: &str, except: Option<i64>) -> RepoResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE account = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(account)
        .bind(except)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> RepoResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_profile(&self, id: i64, viewer: i64) -> RepoResult<Option<UserProfile>> {
        Ok(sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT
                u.id, u.account, u.name, u.email, u.avatar, u.cover, u.introduction,
                (SELECT COUNT(*) FROM tweets t WHERE t.user_id = u.id) AS tweet_count,
                (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count,
                (SELECT COUNT(*) FROM followships f WHERE f.follower_id = u.id) AS following_count,
                EXISTS (
                    SELECT 1 FROM followships f WHERE f.follower_id = $2 AND f.following_id = u.id
                ) AS is_followed
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// top_users
    ///
    /// Ordinary users ranked by follower count; admins never appear in the ranking.
    async fn top_users(&self, viewer: i64, limit: i64) -> RepoResult<Vec<UserCard>> {
        let sql = format!(
            "{USER_CARD} WHERE COALESCE(u.role, 'user') <> 'admin' ORDER BY follower_count DESC, u.id ASC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, UserCard>(&sql)
            .bind(viewer)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn followers(&self, id: i64, viewer: i64) -> RepoResult<Vec<UserCard>> {
        let sql = format!(
            "{USER_CARD} JOIN followships fs ON fs.follower_id = u.id WHERE fs.following_id = $2 ORDER BY fs.created_at DESC"
        );
        Ok(sqlx::query_as::<_, UserCard>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn followings(&self, id: i64, viewer: i64) -> RepoResult<Vec<UserCard>> {
        let sql = format!(
            "{USER_CARD} JOIN followships fs ON fs.following_id = u.id WHERE fs.follower_id = $2 ORDER BY fs.created_at DESC"
        );
        Ok(sqlx::query_as::<_, UserCard>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// update_profile
    ///
    /// Partial update: `COALESCE` keeps the stored value for every `None` field.
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<Option<User>> {
        let sql = format!(
            r#"
            WITH u AS (
                UPDATE users
                SET name = COALESCE($2, name),
                    introduction = COALESCE($3, introduction),
                    avatar = COALESCE($4, avatar),
                    cover = COALESCE($5, cover),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.introduction)
            .bind(update.avatar)
            .bind(update.cover)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_account(&self, id: i64, update: AccountUpdate) -> RepoResult<Option<User>> {
        let sql = format!(
            r#"
            WITH u AS (
                UPDATE users
                SET account = COALESCE($2, account),
                    name = COALESCE($3, name),
                    email = COALESCE($4, email),
                    password = COALESCE(crypt($5, gen_salt('bf')), password),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.account)
            .bind(update.name)
            .bind(update.email)
            .bind(update.password)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_tweets(&self, id: i64, viewer: i64) -> RepoResult<Vec<TweetView>> {
        let sql = format!("{TWEET_VIEW} WHERE t.user_id = $2 ORDER BY t.created_at DESC");
        Ok(sqlx::query_as::<_, TweetView>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn user_likes(&self, id: i64, viewer: i64) -> RepoResult<Vec<TweetView>> {
        let sql = format!(
            "{TWEET_VIEW} JOIN likes lk ON lk.tweet_id = t.id WHERE lk.user_id = $2 ORDER BY lk.created_at DESC"
        );
        Ok(sqlx::query_as::<_, TweetView>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn user_replies(&self, id: i64) -> RepoResult<Vec<ReplyView>> {
        let sql = format!("{REPLY_VIEW} WHERE r.user_id = $1 ORDER BY r.created_at DESC");
        Ok(sqlx::query_as::<_, ReplyView>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_tweet(&self, user_id: i64, description: &str) -> RepoResult<Tweet> {
        Ok(sqlx::query_as::<_, Tweet>(
            r#"
            INSERT INTO tweets (user_id, description, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, user_id, description, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_tweets(&self, viewer: i64) -> RepoResult<Vec<TweetView>> {
        let sql = format!("{TWEET_VIEW} ORDER BY t.created_at DESC");
        Ok(sqlx::query_as::<_, TweetView>(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_tweet(&self, id: i64, viewer: i64) -> RepoResult<Option<TweetView>> {
        let sql = format!("{TWEET_VIEW} WHERE t.id = $2");
        Ok(sqlx::query_as::<_, TweetView>(&sql)
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_reply(&self, tweet_id: i64, user_id: i64, comment: &str) -> RepoResult<Reply> {
        Ok(sqlx::query_as::<_, Reply>(
            r#"
            INSERT INTO replies (tweet_id, user_id, comment, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, user_id, tweet_id, comment, created_at
            "#,
        )
        .bind(tweet_id)
        .bind(user_id)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_replies(&self, tweet_id: i64) -> RepoResult<Vec<ReplyView>> {
        let sql = format!("{REPLY_VIEW} WHERE r.tweet_id = $1 ORDER BY r.created_at ASC");
        Ok(sqlx::query_as::<_, ReplyView>(&sql)
            .bind(tweet_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// like_tweet
    ///
    /// `ON CONFLICT DO NOTHING` makes a repeated like a no-op reported as `false`.
    async fn like_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool> {
        let res = sqlx::query(
            "INSERT INTO likes (user_id, tweet_id, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(tweet_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn unlike_tweet(&self, user_id: i64, tweet_id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND tweet_id = $2")
            .bind(user_id)
            .bind(tweet_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn follow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool> {
        let res = sqlx::query(
            "INSERT INTO followships (follower_id, following_id, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: i64, following_id: i64) -> RepoResult<bool> {
        let res =
            sqlx::query("DELETE FROM followships WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn admin_users(&self) -> RepoResult<Vec<AdminUserView>> {
        Ok(sqlx::query_as::<_, AdminUserView>(
            r#"
            SELECT
                u.id, u.account, u.name, u.avatar, u.cover, COALESCE(u.role, 'user') AS role,
                (SELECT COUNT(*) FROM tweets t WHERE t.user_id = u.id) AS tweet_count,
                (SELECT COUNT(*) FROM likes l JOIN tweets t ON t.id = l.tweet_id
                    WHERE t.user_id = u.id) AS like_count,
                (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count,
                (SELECT COUNT(*) FROM followships f WHERE f.follower_id = u.id) AS following_count
            FROM users u
            ORDER BY tweet_count DESC, u.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn admin_tweets(&self) -> RepoResult<Vec<TweetView>> {
        // No viewer: `is_liked` is always false for moderators.
        let sql = format!("{TWEET_VIEW} ORDER BY t.created_at DESC");
        Ok(sqlx::query_as::<_, TweetView>(&sql)
            .bind(0_i64)
            .fetch_all(&self.pool)
            .await?)
    }

    /// delete_tweet
    ///
    /// Removes the tweet together with its replies and likes in one transaction.
    async fn delete_tweet(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM replies WHERE tweet_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM likes WHERE tweet_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_users(&self) -> RepoResult<u64> {
        let res = sqlx::query("DELETE FROM users WHERE COALESCE(role, 'user') <> 'admin'")
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_all_tweets(&self) -> RepoResult<u64> {
        let res = sqlx::query("DELETE FROM tweets").execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn delete_all_replies(&self) -> RepoResult<u64> {
        let res = sqlx::query("DELETE FROM replies").execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}
