/// Application state and router builder
///
/// This module defines the shared application state, the auth guard
/// middleware, and the function that assembles the Axum router.
///
/// # Router Layout
///
/// ```text
/// /
/// ├── GET  /                    # Site pages (public)
/// ├── GET  /contact
/// ├── GET  /health
/// ├── POST /users               # Register (public)
/// ├── POST /users/login         # Issue session token (public)
/// └── (auth guard)              # Everything below requires a live token
///     ├── POST   /users/logout
///     ├── POST   /users/logoutAll
///     ├── G/P/D  /users/me
///     ├── P/G/D  /users/me/avatar
///     ├── P/G/D  /users/me/resume
///     ├── POST/GET /tasks
///     └── G/P/D  /tasks/:id
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::{
    auth::token,
    email::Mailer,
    models::user::User,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{config::Config, error::ApiError, routes};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Best-effort email notification sink
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets the secret used to sign session tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Identity resolved by the auth guard
///
/// Inserted into request extensions after a successful validation so
/// downstream handlers know both who is calling and which session token
/// they used (logout revokes exactly that token).
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The authenticated user's full record
    pub user: User,

    /// The exact token string presented on this request
    pub token: String,
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // Public routes: site pages, registration, login
    let public_routes = Router::new()
        .route("/", get(routes::site::index))
        .route("/contact", get(routes::site::contact))
        .route("/health", get(routes::site::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login));

    // Everything else requires a live session token
    let protected_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::get_me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::files::upload_avatar)
                .get(routes::files::get_avatar)
                .delete(routes::files::delete_avatar),
        )
        .route(
            "/users/me/resume",
            post(routes::files::upload_resume)
                .get(routes::files::get_resume)
                .delete(routes::files::delete_resume),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Auth guard middleware
///
/// Extracts the bearer token, validates its signature and expiry, then
/// double-checks revocation: the user must exist and the exact token
/// string must still be in that user's session list. On success an
/// [`AuthSession`] is attached to the request. Every failure mode
/// (missing header, malformed token, expired, revoked, user gone)
/// collapses into the same 401 so nothing about account or token state
/// leaks to unauthenticated callers.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let unauthorized = || ApiError::Unauthorized("Unauthorized request".to_string());

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthorized)?
        .trim()
        .to_string();

    // Signature and expiry
    let claims = token::validate_token(&token, state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        unauthorized()
    })?;

    // Revocation: the token must still be in the owner's session list
    let member = token::is_member(&state.db, claims.sub, &token)
        .await
        .map_err(|e| ApiError::Internal(format!("Session lookup failed: {}", e)))?;
    if !member {
        return Err(unauthorized());
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(unauthorized)?;

    req.extensions_mut().insert(AuthSession {
        user,
        token: token.to_string(),
    });

    Ok(next.run(req).await)
}

// The guard and router are exercised end-to-end through the route
// handler tests; constructing them requires a live database pool.
