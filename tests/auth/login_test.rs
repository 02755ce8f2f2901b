use axum::http::StatusCode;

use crate::common::{session_cookie, test_email, test_password, test_username, TestContext};

async fn create_test_user(ctx: &TestContext) -> String {
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;
    email
}

#[tokio::test]
async fn login_with_valid_credentials_redirects_to_dashboard() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .form(&[("email", email.as_str()), ("password", test_password())])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/dashboard");

    let cookie = response.cookie("session");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
}

#[tokio::test]
async fn login_honors_local_next_from_form() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .form(&[
            ("email", email.as_str()),
            ("password", test_password()),
            ("next", "/posts/new"),
        ])
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/posts/new");
}

#[tokio::test]
async fn login_honors_local_next_from_query() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .add_query_param("next", "/account")
        .form(&[("email", email.as_str()), ("password", test_password())])
        .await;

    assert_eq!(response.header("location"), "/account");
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .form(&[
            ("email", email.as_str()),
            ("password", test_password()),
            ("next", "https://evil.example/phish"),
        ])
        .await;

    assert_eq!(response.header("location"), "/dashboard");
}

#[tokio::test]
async fn login_with_invalid_password_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .form(&[("email", email.as_str()), ("password", "WrongPassword123!")])
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.cookies().get("session").is_none());

    let body: serde_json::Value = response.json();
    assert_eq!(
        body["error"],
        "Login unsuccessful. Please check email and password."
    );
}

#[tokio::test]
async fn login_failure_is_identical_for_unknown_email_and_wrong_password() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;

    let wrong_password = ctx
        .server
        .post("/auth/login")
        .form(&[("email", email.as_str()), ("password", "WrongPassword123!")])
        .await;
    let unknown_email = ctx
        .server
        .post("/auth/login")
        .form(&[("email", "nonexistent@example.com"), ("password", test_password())])
        .await;

    assert_eq!(wrong_password.status_code(), unknown_email.status_code());
    assert_eq!(wrong_password.text(), unknown_email.text());
}

#[tokio::test]
async fn login_with_missing_fields_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/login")
        .form(&[("email", "invalid-email")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn login_again_replaces_previous_session() {
    let ctx = TestContext::new().await;
    let email = create_test_user(&ctx).await;
    let first = ctx.login(&email, test_password()).await;

    let response = ctx
        .server
        .post("/auth/login")
        .add_cookie(session_cookie(&first))
        .form(&[("email", email.as_str()), ("password", test_password())])
        .await;
    let second = response.cookie("session").value().to_string();

    assert_ne!(first, second);

    let stale = ctx
        .server
        .get("/dashboard")
        .add_cookie(session_cookie(&first))
        .await;
    stale.assert_status(StatusCode::UNAUTHORIZED);

    let fresh = ctx
        .server
        .get("/dashboard")
        .add_cookie(session_cookie(&second))
        .await;
    fresh.assert_status_ok();
}
