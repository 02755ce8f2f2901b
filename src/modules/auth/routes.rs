use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;
use super::controller;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/login", post(controller::login))
        .route("/logout", get(controller::logout))
        .route("/reset_request", post(controller::reset_request))
        .route(
            "/reset_password/{token}",
            get(controller::reset_token_status).post(controller::reset_password),
        )
}
