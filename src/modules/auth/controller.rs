use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::instrument;

use crate::AppState;
use crate::modules::auth::{
    extractor::AuthSession,
    interface::AuthError,
    schema::{
        LoginForm, MessageResponse, NextQuery, RegisterForm, RegisterResponse, ResetPasswordForm,
        ResetRequestForm, TokenStatusResponse, UserResponse,
    },
};

pub const REGISTERED: &str = "Your account has been created! You are now able to log in.";
pub const RESET_SENT: &str =
    "If that email is registered, an email has been sent with instructions to reset your password.";
pub const PASSWORD_UPDATED: &str = "Your password has been updated! You are now able to log in.";

const DEFAULT_LANDING: &str = "/dashboard";

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let user = state.auth.register(&form).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: REGISTERED,
            user: UserResponse::from(&user),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    let (_, cookie) = state.auth.login(&form, session.id.as_deref()).await?;

    let next = form.next.as_deref().or(query.next.as_deref());
    Ok((jar.add(cookie), Redirect::to(landing_page(next))))
}

/// Ends the session. The cookie is cleared even when it no longer names a
/// live session.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), (CookieJar, AuthError)> {
    let jar = jar.add(state.auth.sessions().removal_cookie());
    match state.auth.logout(&session).await {
        Ok(()) => Ok((jar, Redirect::to("/"))),
        Err(e) => Err((jar, e)),
    }
}

#[instrument(skip(state, form))]
pub async fn reset_request(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetRequestForm>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth.request_password_reset(&form.email).await?;

    Ok(Json(MessageResponse {
        message: RESET_SENT,
    }))
}

#[instrument(skip_all)]
pub async fn reset_token_status(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<TokenStatusResponse>, AuthError> {
    state.auth.check_reset_token(&token).await?;

    Ok(Json(TokenStatusResponse { valid: true }))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth.perform_password_reset(&token, &form).await?;

    Ok(Json(MessageResponse {
        message: PASSWORD_UPDATED,
    }))
}

/// Post-login destination. Only same-site absolute paths are honored.
fn landing_page(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => DEFAULT_LANDING,
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}
