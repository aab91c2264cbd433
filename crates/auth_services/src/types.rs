use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account, can only see and edit itself
    User,
    /// Administrator, can manage every account
    Admin,
}

impl Role {
    /// Database and wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(AuthError::Validation(
                "Invalid role, must be USER or ADMIN".to_string(),
            )),
        }
    }
}

/// User model representing the database schema
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier for the user
    pub id: i64,
    /// Name of the user
    pub name: String,
    /// Email address of the user, always lower-case
    pub email: String,
    /// Bcrypt hash of the user's password
    pub password_hash: String,
    /// Role of the user
    pub role: Role,
    /// Outstanding password reset token, if any
    pub reset_token: Option<String>,
    /// Moment the outstanding reset token stops being accepted
    pub reset_token_expiration: Option<DateTime<Utc>>,
    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether `token` matches the stored reset token and has not expired at `now`.
    pub fn accepts_reset_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiration) {
            (Some(stored), Some(expires_at)) => stored == token && expires_at >= now,
            _ => false,
        }
    }
}

/// Request structure for user registration
///
/// Every field is optional on the wire so that missing values produce the
/// service's own validation messages instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Name of the user
    pub name: Option<String>,
    /// Email address of the user
    pub email: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
    /// Rejected when present
    pub role: Option<serde_json::Value>,
}

/// Request structure for user login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address of the user
    pub email: Option<String>,
    /// Password for the user account
    pub password: Option<String>,
}

/// Request structure for starting a password reset
#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email address of the account to reset
    pub email: Option<String>,
}

/// Request structure for completing a password reset
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Email address of the account
    pub email: Option<String>,
    /// Reset token delivered by email
    pub token: Option<String>,
    /// Replacement password
    pub new_password: Option<String>,
}

/// Request structure for editing a profile
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// Rejected when present, roles go through the admin endpoint
    pub role: Option<serde_json::Value>,
}

/// Request structure for changing a user's role
#[derive(Debug, Default, Deserialize)]
pub struct ChangeRoleRequest {
    /// Requested role, case-insensitive
    pub role: Option<String>,
}

/// Public view of a user, safe to return from any endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Unique identifier for the user
    pub id: i64,
    /// Name of the user
    pub name: String,
    /// Email address of the user
    pub email: String,
    /// Role of the user
    pub role: Role,
    /// Time at which the user was created
    pub created_at: DateTime<Utc>,
    /// Time at which the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response body for a freshly registered user
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// Unique identifier for the user
    pub id: i64,
    /// Name of the user
    pub name: String,
    /// Email address of the user
    pub email: String,
    /// Role assigned at registration, always `USER`
    pub role: Role,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Envelope used by the user endpoints: `{"data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// Wrapped payload
    pub data: T,
}

/// Response structure for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token
    pub token: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human readable outcome
    pub message: String,
}

impl MessageResponse {
    /// Builds a message response from anything string-like.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID as a string
    pub sub: String,
    /// Email address of the user at issue time
    pub email: String,
    /// Name of the user at issue time
    pub name: String,
    /// Issued at timestamp of the token
    pub iat: usize,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Intended audience
    pub aud: String,
    /// Issuing service
    pub iss: String,
}

/// Password reset token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    /// User the reset was requested for
    pub id: i64,
    /// Email address of that user
    pub email: String,
    /// Issued at timestamp of the token
    pub iat: usize,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Intended audience
    pub aud: String,
    /// Issuing service
    pub iss: String,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Request data failed validation
    #[error("{0}")]
    Validation(String),

    /// The email address already exists in the system
    #[error("Email already exists")]
    EmailExists,

    /// The provided credentials are invalid
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The requested user was not found
    #[error("User not found")]
    UserNotFound,

    /// The authenticated caller no longer exists
    #[error("User not found.")]
    CallerNotFound,

    /// The caller lacks the privileges for the operation
    #[error("Access forbidden: insufficient privileges.")]
    Forbidden,

    /// The supplied reset token is unknown, stale or expired
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// No bearer token accompanied a protected request
    #[error("Access denied. Token missing.")]
    MissingToken,

    /// The bearer token has expired
    #[error("Token expired.")]
    TokenExpired,

    /// The bearer token failed verification
    #[error("Invalid token.")]
    InvalidToken,

    /// RSA key material could not be loaded or generated
    #[error("Key material error: {0}")]
    KeyMaterial(String),

    /// A notification could not be published
    #[error("Notification error: {0}")]
    Notification(String),

    /// The application was wired incorrectly
    #[error("Internal error: {0}")]
    Internal(String),

    /// An internal server error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while signing a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::Validation(_) | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound | AuthError::CallerNotFound => StatusCode::NOT_FOUND,
            AuthError::Forbidden | AuthError::TokenExpired | AuthError::InvalidToken => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();

        let message = match self {
            AuthError::Database(_) => {
                log::error!("{}", self);
                "A database error occurred.".to_string()
            }
            AuthError::PasswordHash(_)
            | AuthError::Jwt(_)
            | AuthError::KeyMaterial(_)
            | AuthError::Notification(_)
            | AuthError::Internal(_) => {
                log::error!("{}", self);
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };

        actix_web::HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}
