use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;

use crate::jwt::JwtService;
use crate::store::{NewUser, ProfileChanges, UserStore};
use crate::types::{
    AuthError, ChangeRoleRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, Role, UpdateUserRequest, User,
};
use crate::validation::{
    is_supplied, non_empty, normalize_email, validate_email, validate_password,
};

/// Bcrypt work factor for stored passwords.
pub const PASSWORD_HASH_COST: u32 = 10;

/// A service for handling user account operations such as registration,
/// credential checks, password resets and administrative changes.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hash_cost: u32,
}

impl AuthService {
    /// Creates a new instance of `AuthService` over the provided user store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            hash_cost: PASSWORD_HASH_COST,
        }
    }

    /// Overrides the bcrypt cost; tests use the minimum to stay fast.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Registers a new `USER` account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        if is_supplied(request.role.as_ref()) {
            return Err(AuthError::Validation(
                "Role cannot be set during registration".to_string(),
            ));
        }

        let (Some(name), Some(email)) = (
            non_empty(request.name.as_ref()),
            non_empty(request.email.as_ref()),
        ) else {
            return Err(AuthError::Validation(
                "Name and email are required".to_string(),
            ));
        };

        validate_password(request.password.as_deref().unwrap_or_default())?;
        validate_email(email)?;

        let password_hash = self.hash_password(request.password.as_deref().unwrap_or_default())?;

        let user = self
            .store
            .insert(NewUser {
                name: name.to_string(),
                email: normalize_email(email),
                password_hash,
                role: Role::User,
            })
            .await?;

        log::info!("Registered user {} <{}>", user.id, user.email);
        Ok(user)
    }

    /// Verifies the user's password against the stored hash.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AuthError> {
        let (Some(email), Some(password)) = (
            non_empty(request.email.as_ref()),
            request.password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        };

        let user = self
            .store
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issues and stores a password reset token, returning the user and the token.
    pub async fn request_password_reset(
        &self,
        request: &ForgotPasswordRequest,
        jwt: &JwtService,
    ) -> Result<(User, String), AuthError> {
        let email = non_empty(request.email.as_ref())
            .ok_or_else(|| AuthError::Validation("Email is required".to_string()))?;
        validate_email(email)?;

        let user = self
            .store
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let (token, expires_at) = jwt.generate_reset_token(&user)?;
        self.store
            .set_reset_token(user.id, &token, expires_at)
            .await?;

        log::info!("Password reset requested for user {}", user.id);
        Ok((user, token))
    }

    /// Replaces the password when the reset token matches and is still valid.
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
        jwt: &JwtService,
    ) -> Result<User, AuthError> {
        let (Some(email), Some(token), Some(new_password)) = (
            non_empty(request.email.as_ref()),
            non_empty(request.token.as_ref()),
            request.new_password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "Email, token, and new password are required".to_string(),
            ));
        };

        validate_password(new_password)?;

        let user = self
            .store
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if !user.accepts_reset_token(token, Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }

        let claims = jwt.verify_reset_token(token)?;
        if claims.id != user.id {
            return Err(AuthError::InvalidResetToken);
        }

        let password_hash = self.hash_password(new_password)?;
        let user = self.store.update_password(user.id, &password_hash).await?;

        log::info!("Password reset completed for user {}", user.id);
        Ok(user)
    }

    /// All users ordered by id.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        self.store.list().await
    }

    /// Retrieves a user by id.
    pub async fn get_user(&self, id: i64) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Updates the name and/or email of a user.
    pub async fn update_user(
        &self,
        id: i64,
        request: &UpdateUserRequest,
    ) -> Result<User, AuthError> {
        if is_supplied(request.role.as_ref()) {
            return Err(AuthError::Validation(
                "Role cannot be changed via this endpoint".to_string(),
            ));
        }

        self.get_user(id).await?;

        let name = non_empty(request.name.as_ref());
        let email = non_empty(request.email.as_ref()).map(normalize_email);

        if name.is_none() && email.is_none() {
            return Err(AuthError::Validation(
                "At least one field (name or email) must be provided".to_string(),
            ));
        }

        if let Some(email) = &email {
            if let Some(existing) = self.store.find_by_email(email).await? {
                if existing.id != id {
                    return Err(AuthError::EmailExists);
                }
            }
            validate_email(email)?;
        }

        self.store
            .update_profile(
                id,
                ProfileChanges {
                    name: name.map(str::to_string),
                    email,
                },
            )
            .await
    }

    /// Sets the role of a user.
    pub async fn change_role(
        &self,
        id: i64,
        request: &ChangeRoleRequest,
    ) -> Result<User, AuthError> {
        let role: Role = non_empty(request.role.as_ref())
            .ok_or_else(|| AuthError::Validation("Role is required".to_string()))?
            .parse()?;

        self.get_user(id).await?;

        let user = self.store.update_role(id, role).await?;
        log::info!("User {} is now {}", user.id, user.role);
        Ok(user)
    }

    /// Deletes a user.
    pub async fn delete_user(&self, id: i64) -> Result<(), AuthError> {
        if !self.store.delete(id).await? {
            return Err(AuthError::UserNotFound);
        }

        log::info!("Deleted user {}", id);
        Ok(())
    }

    /// Loads the caller and checks it holds `role`.
    pub async fn require_role(&self, user_id: i64, role: Role) -> Result<User, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::CallerNotFound)?;

        if user.role != role {
            return Err(AuthError::Forbidden);
        }

        Ok(user)
    }

    /// Makes sure an administrator account with `email` exists.
    ///
    /// A missing account is created with the given password; an existing one is
    /// promoted and keeps its password.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        match self.store.find_by_email(&email).await? {
            Some(user) if user.role == Role::Admin => Ok(user),
            Some(user) => {
                log::info!("Promoting {} to ADMIN", user.email);
                self.store.update_role(user.id, Role::Admin).await
            }
            None => {
                validate_password(password)?;
                log::info!("Creating ADMIN account {}", email);
                self.store
                    .insert(NewUser {
                        name: name.to_string(),
                        email,
                        password_hash: self.hash_password(password)?,
                        role: Role::Admin,
                    })
                    .await
            }
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(hash(password, self.hash_cost)?)
    }
}
