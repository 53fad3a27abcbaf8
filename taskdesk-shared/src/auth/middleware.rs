/// Request identity types for the API's authentication middleware
///
/// The API server validates the bearer token, re-loads the user record, and
/// inserts a [`CurrentUser`] into the request extensions. Handlers extract
/// it with Axum's `Extension` extractor.
///
/// A token whose user record no longer exists is rejected with
/// `AuthError::UnknownUser` rather than proceeding with an empty identity.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskdesk_shared::auth::middleware::CurrentUser;
///
/// async fn handler(Extension(caller): Extension<CurrentUser>) -> String {
///     format!("User: {} ({})", caller.email, caller.id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Authenticated caller identity, attached to request extensions
///
/// Carries only public fields; the password hash never leaves the model
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Authenticated user ID
    pub id: Uuid,

    /// User's email address
    pub email: String,

    /// User's role
    pub role: UserRole,
}

impl CurrentUser {
    /// Checks whether the caller holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Error type for the authentication gate
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("No token provided, authorization denied")]
    MissingToken,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token validation failed (bad signature, malformed, expired)
    #[error("Token is not valid")]
    InvalidToken,

    /// Token is valid but the user record no longer exists
    #[error("Token is not valid")]
    UnknownUser,

    /// Caller is authenticated but lacks the required role
    #[error("Access denied, admin only")]
    Forbidden,

    /// Database error while loading the user record
    #[error("Internal server error")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::UnknownUser => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Extracts the bearer token from an `Authorization` header value
///
/// # Errors
///
/// - `AuthError::MissingToken` when the header is absent
/// - `AuthError::InvalidFormat` when the header is not `Bearer <token>`
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    value
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_valid() {
        let token = extract_bearer(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        assert!(matches!(extract_bearer(None), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        assert!(matches!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat)
        ));
    }

    #[test]
    fn test_extract_bearer_empty_token() {
        assert!(matches!(
            extract_bearer(Some("Bearer ")),
            Err(AuthError::InvalidFormat)
        ));
    }

    #[test]
    fn test_current_user_is_admin() {
        let caller = CurrentUser {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        };
        assert!(caller.is_admin());

        let caller = CurrentUser {
            role: UserRole::User,
            ..caller
        };
        assert!(!caller.is_admin());
    }
}
