use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    routing::get,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Gates: token authentication and role authorization.
pub mod auth;
pub mod authorization;

// Core application services and components.
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod uploads;

// Declarative route table (Public, User, Admin, Destroyer).
pub mod routes;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use uploads::{LocalUploadService, MockUploadService, UploadState};

use models::ApiMessage;

/// ApiDoc
///
/// OpenAPI document for every route in the table, served at `/api-docs/openapi.json`.
/// Paths are listed relative to the root; the same routes are also served under `/api`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::sign_up, handlers::users::sign_in, handlers::users::get_current_user,
        handlers::users::get_top_users, handlers::users::get_followers,
        handlers::users::get_followings, handlers::users::get_user, handlers::users::put_user,
        handlers::users::revise_user, handlers::users::get_user_tweets,
        handlers::users::get_user_likes, handlers::users::get_user_replies,
        handlers::tweets::post_tweet, handlers::tweets::get_tweets, handlers::tweets::get_tweet,
        handlers::tweets::add_like, handlers::tweets::remove_like,
        handlers::replies::post_reply, handlers::replies::get_replies,
        handlers::followships::add_following, handlers::followships::remove_following,
        handlers::admin::get_users, handlers::admin::get_tweets, handlers::admin::delete_tweet,
        handlers::destroyer::delete_all_users, handlers::destroyer::delete_all_tweets,
        handlers::destroyer::delete_all_replies
    ),
    components(
        schemas(
            models::Role, models::User, models::UserCard, models::UserProfile,
            models::AdminUserView, models::Tweet, models::TweetView, models::TweetDetail,
            models::Reply, models::ReplyView, models::SignUpRequest, models::SignInRequest,
            models::ReviseUserRequest, models::PostTweetRequest, models::PostReplyRequest,
            models::FollowRequest, models::ApiMessage, models::SignInResponse,
            models::DeletedRows,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "simple-twitter", description = "Simple Twitter REST API")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the guarded paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: users, tweets, replies, likes and followships.
    pub repo: RepositoryState,
    /// Where avatar and cover uploads are written.
    pub uploads: UploadState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for UploadState {
    fn from_ref(app_state: &AppState) -> UploadState {
        app_state.uploads.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn health() -> Json<ApiMessage> {
    Json(ApiMessage::success("ok"))
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiMessage::error("route not found")))
}

/// create_router
///
/// Assembles the route table, the documentation and the global middleware stack.
/// Each route carries its own gates (see `routes::api_router`); nothing here is
/// scoped by URL prefix.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = routes::api_router(&state);
    let body_limit = state.config.max_body_bytes;

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Served both at the root and under /api.
        .nest("/api", api.clone())
        .merge(api)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by `x-request-id`. `user_id` stays empty until the
/// authentication gate records it.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
        user_id = tracing::field::Empty,
    )
}
