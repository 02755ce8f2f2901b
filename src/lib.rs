pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{Config, DbPool};
use modules::auth::crud::{PasswordResetCrud, UserCrud};
use modules::auth::interface::{AuthError, PasswordResetRepository, UserRepository};
use modules::auth::memory::{MemoryPasswordResetStore, MemoryUserStore};
use modules::auth::{auth_routes, AuthService};
use modules::pages::page_routes;
use services::mailer::Mailer;
use services::reset_token::ResetTokenSigner;
use services::security::security_headers;
use services::session::{MemorySessionStore, MySqlSessionStore, SessionManager, SessionStore};

pub struct AppState {
    pub auth: AuthService,
}

/// Persistence backends for users, reset records and sessions.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub resets: Arc<dyn PasswordResetRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        Self {
            resets: Arc::new(MemoryPasswordResetStore::new(users.clone())),
            users,
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }

    /// Deletes expired sessions plus used or expired reset records.
    pub async fn purge_expired(&self) -> (Result<u64, sqlx::Error>, Result<u64, AuthError>) {
        let now = Utc::now();
        (
            self.sessions.delete_expired(now).await,
            self.resets.delete_expired(now).await,
        )
    }

    pub fn mysql(pool: DbPool) -> Self {
        Self {
            users: Arc::new(UserCrud::new(pool.clone())),
            resets: Arc::new(PasswordResetCrud::new(pool.clone())),
            sessions: Arc::new(MySqlSessionStore::new(pool)),
        }
    }
}

/// Runs `Stores::purge_expired` every `every` until the runtime shuts down.
pub fn spawn_cleanup(stores: Stores, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let (sessions, resets) = stores.purge_expired().await;
            match sessions {
                Ok(removed) => tracing::debug!(removed, "expired sessions purged"),
                Err(e) => tracing::error!(error = %e, "session cleanup failed"),
            }
            match resets {
                Ok(removed) => tracing::debug!(removed, "spent password resets purged"),
                Err(e) => tracing::error!(error = %e, "password reset cleanup failed"),
            }
        }
    })
}

pub async fn create_app(config: &Config, stores: Stores, mailer: Arc<dyn Mailer>) -> Router {
    let sessions = SessionManager::new(
        stores.sessions,
        config.session_ttl,
        config.secure_cookies(),
    );
    let tokens = ResetTokenSigner::new(&config.secret_key, config.reset_token_ttl);

    let state = Arc::new(AppState {
        auth: AuthService::new(
            stores.users,
            stores.resets,
            sessions,
            tokens,
            mailer,
            config.base_url.clone(),
        ),
    });

    Router::new()
        .route("/health", get(health_check))
        .merge(page_routes())
        .nest("/auth", auth_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 16)) // 16KB max body
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
