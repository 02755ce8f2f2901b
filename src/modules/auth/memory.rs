use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::modules::auth::interface::{
    AuthError, PasswordResetRepository, Result, UserRepository,
};
use crate::modules::auth::model::{PasswordReset, User};

/// Process-local credential store keyed by user id.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn create(&self, user: &User) -> Result<()> {
        // check and insert under one write lock: first writer wins
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AuthError::DuplicateUsername);
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::DuplicateEmail);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_last_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(user_id) {
            user.last_login = at;
        }
        Ok(())
    }

    async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

/// Reset records. Shares the user map so a redemption can update both
/// under one critical section.
pub struct MemoryPasswordResetStore {
    resets: RwLock<HashMap<String, PasswordReset>>,
    users: Arc<MemoryUserStore>,
}

impl MemoryPasswordResetStore {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            resets: RwLock::new(HashMap::new()),
            users,
        }
    }

    pub async fn count_for_user(&self, user_id: &str) -> usize {
        let resets = self.resets.read().await;
        resets.values().filter(|r| r.user_id == user_id).count()
    }
}

#[async_trait]
impl PasswordResetRepository for MemoryPasswordResetStore {
    async fn create(&self, reset: &PasswordReset) -> Result<()> {
        self.resets
            .write()
            .await
            .insert(reset.id.clone(), reset.clone());
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordReset>> {
        let resets = self.resets.read().await;
        Ok(resets.values().find(|r| r.token_hash == token_hash).cloned())
    }

    async fn redeem(&self, reset_id: &str, user_id: &str, password_hash: &str) -> Result<bool> {
        // lock order: resets, then users
        let mut resets = self.resets.write().await;
        let mut users = self.users.users.write().await;

        let Some(reset) = resets.get_mut(reset_id) else {
            return Ok(false);
        };
        if reset.used || reset.user_id != user_id {
            return Ok(false);
        }
        let Some(user) = users.get_mut(user_id) else {
            return Ok(false);
        };

        reset.used = true;
        user.password_hash = password_hash.to_string();
        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut resets = self.resets.write().await;
        let before = resets.len();
        resets.retain(|_, r| !r.used && r.expires_at > now);
        Ok((before - resets.len()) as u64)
    }
}
