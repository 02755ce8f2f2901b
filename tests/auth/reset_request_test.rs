use axum::http::StatusCode;

use crate::common::{reset_token_in, test_email, test_password, test_username, TestContext};

const UNIFORM_MESSAGE: &str =
    "If that email is registered, an email has been sent with instructions to reset your password.";

#[tokio::test]
async fn reset_request_for_registered_email_sends_link() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;

    let response = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", email.as_str())])
        .await;

    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], UNIFORM_MESSAGE);

    let sent = ctx.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, email);
    assert_eq!(sent[0].subject, "Password Reset Request");
    assert!(sent[0]
        .body
        .contains("http://localhost:3000/auth/reset_password/"));
    assert!(sent[0].body.contains("simply ignore this email"));
}

#[tokio::test]
async fn reset_request_for_unknown_email_looks_the_same() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;

    let known = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", email.as_str())])
        .await;
    let unknown = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", "invalid@example.com")])
        .await;

    assert_eq!(known.status_code(), unknown.status_code());
    assert_eq!(known.text(), unknown.text());

    // only the registered address received mail
    ctx.mailer.wait_for(1).await;
    assert_eq!(ctx.mailer.settled().await.len(), 1);
}

#[tokio::test]
async fn reset_request_with_malformed_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", "not-an-email")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(ctx.mailer.settled().await.is_empty());
}

#[tokio::test]
async fn reset_request_response_is_not_cacheable() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", "someone@example.com")])
        .await;

    assert_eq!(response.header("cache-control"), "no-store");
    assert_eq!(response.header("referrer-policy"), "no-referrer");
}

#[tokio::test]
async fn back_to_back_reset_requests_both_succeed_with_distinct_links() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;

    for _ in 0..2 {
        ctx.server
            .post("/auth/reset_request")
            .form(&[("email", email.as_str())])
            .await
            .assert_status_ok();
    }

    let sent = ctx.mailer.wait_for(2).await;
    let first = reset_token_in(&sent[0]);
    let second = reset_token_in(&sent[1]);
    assert_ne!(first, second);

    ctx.server
        .get(&format!("/auth/reset_password/{}", first))
        .await
        .assert_status_ok();
    ctx.server
        .get(&format!("/auth/reset_password/{}", second))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn reset_request_answers_uniformly_when_mail_delivery_fails() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register(&test_username(), &email, test_password()).await;
    ctx.mailer.fail_deliveries();

    let known = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", email.as_str())])
        .await;
    let unknown = ctx
        .server
        .post("/auth/reset_request")
        .form(&[("email", "invalid@example.com")])
        .await;

    known.assert_status_ok();
    assert_eq!(known.text(), unknown.text());
    assert!(ctx.mailer.settled().await.is_empty());
}
