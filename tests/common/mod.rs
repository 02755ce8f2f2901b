use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use blogsite::config::Config;
use blogsite::services::mailer::{MailError, Mailer, OutgoingEmail};
use blogsite::Stores;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Captures outgoing mail so tests can read reset links. Reset mail is sent
/// off the request path, so readers wait for it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Makes every later `send` fail with a transport error.
    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Waits up to two seconds for at least `count` emails.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingEmail> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} emails, got {}", count, self.sent().len());
    }

    /// Gives detached deliveries time to land, then returns what was sent.
    pub async fn settled(&self) -> Vec<OutgoingEmail> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.sent()
    }
}

#[allow(dead_code)]
pub fn reset_token_in(email: &OutgoingEmail) -> String {
    email
        .body
        .lines()
        .find_map(|line| line.split("/auth/reset_password/").nth(1))
        .map(|token| token.trim().to_string())
        .expect("reset link in email")
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub stores: Stores,
    pub mailer: Arc<RecordingMailer>,
    pub config: Config,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        Self::with_stores(Stores::in_memory()).await
    }

    pub async fn with_stores(stores: Stores) -> Self {
        let config = Config::with_secret(TEST_SECRET);
        let mailer = Arc::new(RecordingMailer::default());

        let app = blogsite::create_app(&config, stores.clone(), mailer.clone()).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            stores,
            mailer,
            config,
        }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) {
        self.server
            .post("/auth/register")
            .form(&[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", password),
            ])
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    /// Logs in and returns the session cookie value.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/auth/login")
            .form(&[("email", email), ("password", password)])
            .await;

        response.assert_status(axum::http::StatusCode::SEE_OTHER);
        response.cookie("session").value().to_string()
    }

    pub async fn request_reset_token(&self, email: &str) -> String {
        let before = self.mailer.sent().len();
        self.server
            .post("/auth/reset_request")
            .form(&[("email", email)])
            .await
            .assert_status_ok();

        let sent = self.mailer.wait_for(before + 1).await;
        reset_token_in(&sent[before])
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4().simple())
}

// Helper to generate unique test username
#[allow(dead_code)]
pub fn test_username() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("user_{}", &id[..12])
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

#[allow(dead_code)]
pub fn session_cookie(value: &str) -> Cookie<'static> {
    Cookie::new("session", value.to_string())
}
