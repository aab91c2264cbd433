//! In-memory user store for development and testing

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::{NewUser, ProfileChanges, UserStore};
use crate::types::{AuthError, Role, User};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

/// Keeps users in a map behind a mutex; ids start at 1 and are never reused.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<T>(&self, id: i64, f: impl FnOnce(&mut User) -> T) -> Result<T, AuthError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        let result = f(user);
        user.updated_at = Utc::now();
        Ok(result)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailExists);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            reset_token: None,
            reset_token_expiration: None,
            created_at: now,
            updated_at: now,
        };

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.inner.lock().unwrap().users.values().cloned().collect())
    }

    async fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<User, AuthError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(email) = &changes.email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(AuthError::EmailExists);
            }
        }

        let user = inner.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<User, AuthError> {
        self.with_user(id, |user| {
            user.role = role;
            user.clone()
        })
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.with_user(id, |user| {
            user.reset_token = Some(token.to_string());
            user.reset_token_expiration = Some(expires_at);
        })
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<User, AuthError> {
        self.with_user(id, |user| {
            user.password_hash = password_hash.to_string();
            user.reset_token = None;
            user.reset_token_expiration = None;
            user.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, AuthError> {
        Ok(self.inner.lock().unwrap().users.remove(&id).is_some())
    }
}
