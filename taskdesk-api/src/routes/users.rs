/// User endpoints
///
/// Registration and login are public; credential updates and account
/// deletion are self-service for any authenticated user; listing, lookup,
/// and role changes are admin-only (enforced by the router's gates).
///
/// # Endpoints
///
/// - `POST /v1/users/register` - Register and get a session token
/// - `POST /v1/users/login` - Login and get a session token
/// - `PUT /v1/users/me` - Update own email/password
/// - `DELETE /v1/users/me` - Delete own account
/// - `GET /v1/users` - List users (admin, page size fixed at 10)
/// - `GET /v1/users/:id` - Get one user (admin)
/// - `PUT /v1/users/:id` - Change a user's role (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::{jwt, middleware::CurrentUser, password},
    models::user::{CreateUser, UpdateCredentials, User, UserPage, UserRole, UserView},
};
use uuid::Uuid;
use validator::Validate;

/// Page size for the user listing (fixed)
const USER_PAGE_LIMIT: i64 = 10;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (minimum 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,

    /// Optional role; defaults to `user`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Human-readable confirmation
    pub message: String,

    /// Session token (24h)
    pub token: String,

    /// Public user view
    pub user: UserView,
}

/// Self-service credential update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password (minimum 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
}

/// Admin role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role
    pub role: Option<UserRole>,
}

/// Confirmation response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Turns validator output into a single 400 message
fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Validation failed".to_string());

    ApiError::BadRequest(message)
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: missing/invalid email, password shorter than 6
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate().map_err(validation_error)?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User registered successfully".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// Login
///
/// Unknown email and wrong password fail with the same message so the
/// endpoint cannot be used to enumerate accounts.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate().map_err(validation_error)?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok(Json(SessionResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// Update the caller's own credentials
///
/// Only supplied fields change; a supplied password is re-hashed.
///
/// # Errors
///
/// - `400 Bad Request`: invalid email or short password
/// - `404 Not Found`: the account vanished concurrently
/// - `409 Conflict`: new email already taken
pub async fn update_me(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(req): Json<UpdateMeRequest>,
) -> ApiResult<Json<UserView>> {
    req.validate().map_err(validation_error)?;

    let password_hash = match &req.password {
        Some(p) => Some(password::hash_password(p)?),
        None => None,
    };

    let user = User::update_credentials(
        &state.db,
        caller.id,
        UpdateCredentials {
            email: req.email,
            password_hash,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Delete the caller's own account
///
/// Tasks referencing the account keep their rows; the references are
/// nulled.
///
/// # Errors
///
/// - `404 Not Found`: the account vanished concurrently
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> ApiResult<Json<MessageResponse>> {
    if !User::delete(&state.db, caller.id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %caller.id, "User deleted own account");

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}

/// Paging query for the user listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Page number (1-based)
    pub page: Option<i64>,
}

/// List users (admin), newest first, page size fixed at 10
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserPage>> {
    let page = query.page.unwrap_or(1);
    let users = User::list(&state.db, page, USER_PAGE_LIMIT).await?;

    Ok(Json(users))
}

/// Get one user by id (admin)
///
/// # Errors
///
/// - `404 Not Found`: no such user
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserView>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Change a user's role (admin)
///
/// # Errors
///
/// - `400 Bad Request`: role missing from the body
/// - `404 Not Found`: no such user
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<UserView>> {
    let role = req
        .role
        .ok_or_else(|| ApiError::BadRequest("Role is required".to_string()))?;

    let user = User::update_role(&state.db, id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User role updated");

    Ok(Json(user.into()))
}
