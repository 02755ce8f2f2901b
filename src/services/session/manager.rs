use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use rand::Rng;

use super::store::{SessionRecord, SessionStore};
use crate::services::hashing::digest_token;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { user_id: String },
}

impl SessionState {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Issues, resolves and revokes cookie-backed sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration, secure_cookie: bool) -> Self {
        Self {
            store,
            ttl,
            secure_cookie,
        }
    }

    /// Starts a fresh session for `user_id`. Any session id the client
    /// already presented is revoked first.
    pub async fn login(
        &self,
        user_id: &str,
        previous: Option<&str>,
    ) -> Result<Cookie<'static>, sqlx::Error> {
        if let Some(previous) = previous {
            self.store.delete(&digest_token(previous)).await?;
        }

        let session_id = generate_session_id();
        let now = Utc::now();
        self.store
            .create(&SessionRecord {
                id_hash: digest_token(&session_id),
                user_id: user_id.to_string(),
                created_at: now,
                expires_at: now + self.ttl,
            })
            .await?;

        tracing::debug!(user_id = %user_id, "session started");
        Ok(self.session_cookie(session_id))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), sqlx::Error> {
        self.store.delete(&digest_token(session_id)).await
    }

    pub async fn resolve(&self, session_id: &str) -> Result<SessionState, sqlx::Error> {
        let id_hash = digest_token(session_id);
        let Some(record) = self.store.find(&id_hash).await? else {
            return Ok(SessionState::Anonymous);
        };

        if record.is_expired(Utc::now()) {
            self.store.delete(&id_hash).await?;
            tracing::debug!(user_id = %record.user_id, "session expired");
            return Ok(SessionState::Anonymous);
        }

        Ok(SessionState::Authenticated {
            user_id: record.user_id,
        })
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        cookie
    }

    fn session_cookie(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, session_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }
}

fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}
