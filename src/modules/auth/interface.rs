use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};

use super::model::{PasswordReset, User};
use super::schema::{ErrorResponse, FieldErrorResponse};
use super::validation::FieldError;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthError>;

/// Credential store. Uniqueness of username and email is enforced by the
/// store itself: `create` fails with `DuplicateUsername`/`DuplicateEmail`
/// and leaves nothing behind.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()>;
    async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()>;
}

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, reset: &PasswordReset) -> Result<()>;
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordReset>>;
    /// Spends the reset and stores the new password hash as one unit.
    /// Returns false, changing nothing, if the reset was already used or
    /// does not belong to `user_id`, so exactly one caller wins.
    async fn redeem(&self, reset_id: &str, user_id: &str, password_hash: &str) -> Result<bool>;
    /// Drops used and expired records. Returns how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

pub const USERNAME_TAKEN: &str =
    "This username is already taken. Please choose a different username.";
pub const EMAIL_TAKEN: &str = "This email is already registered. Please use a different email.";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{}", USERNAME_TAKEN)]
    DuplicateUsername,

    #[error("{}", EMAIL_TAKEN)]
    DuplicateEmail,

    #[error("Login unsuccessful. Please check email and password.")]
    AuthenticationFailed,

    #[error("That is an invalid or expired token.")]
    InvalidOrExpiredToken,

    #[error("Please log in to access this page.")]
    NotAuthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(fields) => ErrorResponse::with_fields(
                self.to_string(),
                fields.iter().map(FieldErrorResponse::from).collect(),
            ),
            Self::DuplicateUsername => ErrorResponse::with_fields(
                self.to_string(),
                vec![FieldErrorResponse::new("username", USERNAME_TAKEN)],
            ),
            Self::DuplicateEmail => ErrorResponse::with_fields(
                self.to_string(),
                vec![FieldErrorResponse::new("email", EMAIL_TAKEN)],
            ),
            Self::Database(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                ErrorResponse::new("Internal server error")
            }
            _ => ErrorResponse::new(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
