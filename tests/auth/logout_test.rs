use axum::http::StatusCode;

use crate::common::{session_cookie, test_email, test_password, test_username, TestContext};

#[tokio::test]
async fn logout_with_session_redirects_home_and_clears_cookie() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;
    let session = ctx.login(&email, test_password()).await;

    let response = ctx
        .server
        .get("/auth/logout")
        .add_cookie(session_cookie(&session))
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");

    let cleared = response.cookie("session");
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
}

#[tokio::test]
async fn logout_revokes_session_server_side() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;
    let session = ctx.login(&email, test_password()).await;

    ctx.server
        .get("/auth/logout")
        .add_cookie(session_cookie(&session))
        .await;

    // replaying the old cookie must not work
    let response = ctx
        .server
        .get("/dashboard")
        .add_cookie(session_cookie(&session))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let again = ctx
        .server
        .get("/auth/logout")
        .add_cookie(session_cookie(&session))
        .await;
    again.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(again.cookie("session").value(), "");
}

#[tokio::test]
async fn logout_without_session_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/auth/logout").await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Please log in to access this page.");
}

#[tokio::test]
async fn logout_with_unknown_session_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get("/auth/logout")
        .add_cookie(session_cookie("not-a-real-session"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let cleared = response.cookie("session");
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));
}
