use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;
use super::controller;

pub fn page_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::home))
        .route("/about", get(controller::about))
        .route("/dashboard", get(controller::dashboard))
}
