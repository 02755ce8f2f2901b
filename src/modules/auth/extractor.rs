use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use super::interface::AuthError;
use super::model::User;
use crate::services::session::{SessionState, SESSION_COOKIE};
use crate::AppState;

/// The caller's session as presented by the `session` cookie. Never
/// rejects: a missing, unknown or expired cookie yields `Anonymous`.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: Option<String>,
    pub state: SessionState,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }
}

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AuthSession>() {
            return Ok(session.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let session = match jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
            Some(id) if !id.is_empty() => {
                let resolved = state.auth.sessions().resolve(&id).await?;
                AuthSession {
                    id: Some(id),
                    state: resolved,
                }
            }
            _ => AuthSession {
                id: None,
                state: SessionState::Anonymous,
            },
        };

        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

/// The logged-in user. Rejects with `NotAuthenticated` otherwise.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state).await?;
        let Some(user_id) = session.state.user_id() else {
            return Err(AuthError::NotAuthenticated);
        };

        state
            .auth
            .users()
            .find_by_id(user_id)
            .await?
            .map(CurrentUser)
            .ok_or(AuthError::NotAuthenticated)
    }
}
