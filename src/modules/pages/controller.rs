use axum::Json;
use serde::Serialize;

use crate::modules::auth::{AuthSession, CurrentUser};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct AboutResponse {
    pub title: &'static str,
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub name: String,
}

pub async fn home(session: AuthSession) -> Json<HomeResponse> {
    Json(HomeResponse {
        authenticated: session.is_authenticated(),
    })
}

/// Public page; reports the session state like `home` does.
pub async fn about(session: AuthSession) -> Json<AboutResponse> {
    Json(AboutResponse {
        title: "About",
        authenticated: session.is_authenticated(),
    })
}

pub async fn dashboard(CurrentUser(user): CurrentUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        name: user.username,
    })
}
