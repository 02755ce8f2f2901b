pub mod hashing;
pub mod mailer;
pub mod reset_token;
pub mod security;
pub mod session;
