use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{AuthError, Role, User};

/// Data for a new user row; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Name of the user
    pub name: String,
    /// Normalized email address
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Initial role
    pub role: Role,
}

/// Profile fields to overwrite, `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// New name
    pub name: Option<String>,
    /// New normalized email address
    pub email: Option<String>,
}

/// Persistence for user accounts.
///
/// Mutating operations return `AuthError::UserNotFound` when `id` does not exist.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, failing with `AuthError::EmailExists` on a duplicate email.
    async fn insert(&self, user: NewUser) -> Result<User, AuthError>;

    /// Looks a user up by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;

    /// Looks a user up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>, AuthError>;

    /// Applies profile changes, failing with `AuthError::EmailExists` on a taken email.
    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, AuthError>;

    /// Replaces the role of a user.
    async fn update_role(&self, id: i64, role: Role) -> Result<User, AuthError>;

    /// Stores an outstanding reset token.
    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Replaces the password hash and clears any outstanding reset token.
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AuthError>;

    /// Deletes a user, returning whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, AuthError>;
}
