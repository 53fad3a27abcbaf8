/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware. Shared resources (database pool, object storage
/// client) are constructed in `main` and injected here; nothing is ambient
/// module-level state.
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// └── /v1/
///     ├── /users/
///     │   ├── POST /register     # public
///     │   ├── POST /login        # public
///     │   ├── PUT    /me         # any authenticated user
///     │   ├── DELETE /me         # any authenticated user
///     │   ├── GET  /             # admin
///     │   ├── GET  /:id          # admin
///     │   └── PUT  /:id          # admin (role change)
///     └── /tasks/
///         ├── GET  /my           # any authenticated user
///         ├── GET  /:id          # any authenticated user
///         ├── POST /             # admin (multipart)
///         ├── GET  /             # admin
///         ├── PUT    /:id        # admin (multipart)
///         └── DELETE /:id        # admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication and role gate (per-route-group)

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdesk_shared::{
    auth::{
        jwt,
        middleware::{extract_bearer, AuthError, CurrentUser},
    },
    models::user::User,
    storage::{attachments::AttachmentManager, object_store::ObjectStore},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Request body ceiling for the multipart task-write endpoints
///
/// Must exceed the per-file cap times the document limit plus form
/// overhead; the per-file cap itself is enforced in the multipart parser.
const TASK_WRITE_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; all fields
/// are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Task document attachment manager
    pub attachments: AttachmentManager,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, storage: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self {
            db,
            attachments: AttachmentManager::new(storage),
            config: Arc::new(config),
        }
    }

    /// Gets the session token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public user routes (no auth)
    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    // Self-service user routes (any authenticated user)
    let self_user_routes = Router::new()
        .route("/me", put(routes::users::update_me))
        .route("/me", delete(routes::users::delete_me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Admin user routes
    let admin_user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", put(routes::users::update_role))
        .layer(axum::middleware::from_fn(admin_gate))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let user_routes = public_user_routes
        .merge(self_user_routes)
        .merge(admin_user_routes);

    // Task routes readable by any authenticated user
    let member_task_routes = Router::new()
        .route("/my", get(routes::tasks::my_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Admin task routes (create, list all, update, delete). The default
    // 2 MB body limit is too small for multipart PDF uploads; raise it so
    // the parser's per-file cap is the effective limit.
    let admin_task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .layer(DefaultBodyLimit::max(TASK_WRITE_BODY_LIMIT))
        .layer(axum::middleware::from_fn(admin_gate))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let task_routes = member_task_routes.merge(admin_task_routes);

    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Authentication middleware layer
///
/// Extracts and validates the bearer token, re-loads the user record, and
/// injects a [`CurrentUser`] into request extensions. A token whose user no
/// longer exists is rejected; it never proceeds with an empty identity.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_bearer(auth_header)?;

    let claims =
        jwt::validate_token(token, state.jwt_secret()).map_err(|_| AuthError::InvalidToken)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(AuthError::DatabaseError)?
        .ok_or(AuthError::UnknownUser)?;

    req.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(req).await)
}

/// Role gate for admin-only route groups
///
/// Must run after [`auth_layer`]; rejects authenticated non-admin callers
/// with 403.
async fn admin_gate(req: Request, next: Next) -> Result<Response, ApiError> {
    let caller = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingToken)?;

    if !caller.is_admin() {
        return Err(AuthError::Forbidden.into());
    }

    Ok(next.run(req).await)
}
