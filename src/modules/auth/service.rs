use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use chrono::Utc;
use uuid::Uuid;

use super::extractor::AuthSession;
use super::interface::{AuthError, PasswordResetRepository, Result, UserRepository};
use super::model::{PasswordReset, User};
use super::schema::{LoginForm, RegisterForm, ResetPasswordForm};
use super::validation::{Validator, EMAIL, NEW_PASSWORD, PASSWORD, USERNAME};
use crate::services::hashing;
use crate::services::mailer::{Mailer, OutgoingEmail};
use crate::services::reset_token::ResetTokenSigner;
use crate::services::session::SessionManager;

pub const RESET_SUBJECT: &str = "Password Reset Request";

/// Runs the register, login, logout and password-reset workflows against
/// the credential store, the session manager and the mailer.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    resets: Arc<dyn PasswordResetRepository>,
    sessions: SessionManager,
    tokens: ResetTokenSigner,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        resets: Arc<dyn PasswordResetRepository>,
        sessions: SessionManager,
        tokens: ResetTokenSigner,
        mailer: Arc<dyn Mailer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            resets,
            sessions,
            tokens,
            mailer,
            base_url: base_url.into(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<User> {
        let username = form.username.trim();
        let email = normalize_email(&form.email);

        Validator::new()
            .field("username", username, USERNAME)
            .field("email", &email, EMAIL)
            .field("password", &form.password, NEW_PASSWORD)
            .confirm("confirm_password", &form.confirm_password, &form.password)
            .finish()?;

        let password_hash = hash_blocking(form.password.clone()).await?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email,
            password_hash,
            created_at: now,
            last_login: now,
        };

        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(user)
    }

    /// Authenticates by email and password and starts a session. Unknown
    /// email and wrong password fail identically.
    pub async fn login(
        &self,
        form: &LoginForm,
        previous_session: Option<&str>,
    ) -> Result<(User, Cookie<'static>)> {
        let email = normalize_email(&form.email);

        Validator::new()
            .field("email", &email, EMAIL)
            .field("password", &form.password, PASSWORD)
            .finish()?;

        let Some(mut user) = self.users.find_by_email(&email).await? else {
            verify_dummy_blocking(form.password.clone()).await?;
            tracing::info!("login failed: unknown email");
            return Err(AuthError::AuthenticationFailed);
        };

        if !verify_blocking(form.password.clone(), user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "login failed: wrong password");
            return Err(AuthError::AuthenticationFailed);
        }

        let now = Utc::now();
        self.users.update_last_login(&user.id, now).await?;
        user.last_login = now;

        let cookie = self.sessions.login(&user.id, previous_session).await?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok((user, cookie))
    }

    pub async fn logout(&self, session: &AuthSession) -> Result<()> {
        let (Some(session_id), Some(user_id)) = (session.id.as_deref(), session.state.user_id())
        else {
            return Err(AuthError::NotAuthenticated);
        };

        self.sessions.logout(session_id).await?;
        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }

    /// Mails a reset link when `email` belongs to an account. Succeeds the
    /// same way when it does not. Delivery runs on its own task; a mail
    /// failure is logged and never reaches the caller.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        Validator::new().field("email", &email, EMAIL).finish()?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::info!("password reset requested for unregistered email");
            return Ok(());
        };

        let token = self.tokens.issue(&user.id);
        let now = Utc::now();
        self.resets
            .create(&PasswordReset {
                id: Uuid::new_v4().to_string(),
                user_id: user.id.clone(),
                token_hash: hashing::digest_token(&token),
                expires_at: now + self.tokens.ttl(),
                used: false,
                created_at: now,
            })
            .await?;

        let email = OutgoingEmail {
            to: user.email,
            subject: RESET_SUBJECT.to_string(),
            body: self.reset_email_body(&token),
        };
        let mailer = self.mailer.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            match mailer.send(email).await {
                Ok(()) => tracing::info!(user_id = %user_id, "password reset email sent"),
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "password reset email failed")
                }
            }
        });

        Ok(())
    }

    /// Returns the account a reset token would currently unlock.
    pub async fn check_reset_token(&self, token: &str) -> Result<User> {
        let (user, _) = self.redeemable(token).await?;
        Ok(user)
    }

    pub async fn perform_password_reset(
        &self,
        token: &str,
        form: &ResetPasswordForm,
    ) -> Result<User> {
        let (user, reset) = self.redeemable(token).await?;

        Validator::new()
            .field("password", &form.password, NEW_PASSWORD)
            .confirm("confirm_password", &form.confirm_password, &form.password)
            .finish()?;

        let password_hash = hash_blocking(form.password.clone()).await?;

        // false: another request already spent the token
        if !self.resets.redeem(&reset.id, &user.id, &password_hash).await? {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(user)
    }

    async fn redeemable(&self, token: &str) -> Result<(User, PasswordReset)> {
        let user_id = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "reset token rejected");
            AuthError::InvalidOrExpiredToken
        })?;

        let reset = self
            .resets
            .find_by_token_hash(&hashing::digest_token(token))
            .await?
            .filter(|r| !r.used && r.user_id == user_id && r.expires_at > Utc::now())
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        Ok((user, reset))
    }

    fn reset_email_body(&self, token: &str) -> String {
        format!(
            "To reset your password, visit the following link:\n\
             {}/auth/reset_password/{}\n\n\
             If you did not make this request then simply ignore this email \
             and no changes will be made.\n",
            self.base_url, token
        )
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hashing::hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

async fn verify_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || hashing::verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AuthError::Internal(format!("stored password hash unreadable: {}", e)))
}

async fn verify_dummy_blocking(password: String) -> Result<()> {
    tokio::task::spawn_blocking(move || hashing::verify_dummy(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))
}
