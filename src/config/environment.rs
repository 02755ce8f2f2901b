use chrono::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 30 * 60;
const DEFAULT_MAIL_PORT: u16 = 587;
const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// SMTP settings; only present when `MAIL_SERVER` is set.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
}

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub secret_key: String,
    pub base_url: String,
    pub bind_addr: String,
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// How often expired sessions and reset records are deleted.
    pub cleanup_interval: Duration,
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_key = var("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?;
        let base_url = var("BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let session_ttl = parse_secs("SESSION_TTL_SECS", var("SESSION_TTL_SECS"), DEFAULT_SESSION_TTL_SECS)?;
        let reset_token_ttl = parse_secs(
            "RESET_TOKEN_TTL_SECS",
            var("RESET_TOKEN_TTL_SECS"),
            DEFAULT_RESET_TOKEN_TTL_SECS,
        )?;
        let cleanup_interval = parse_secs(
            "CLEANUP_INTERVAL_SECS",
            var("CLEANUP_INTERVAL_SECS"),
            DEFAULT_CLEANUP_INTERVAL_SECS,
        )?;

        let mail = match var("MAIL_SERVER") {
            Some(host) => {
                let port = match var("MAIL_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                        key: "MAIL_PORT",
                        value: raw,
                    })?,
                    None => DEFAULT_MAIL_PORT,
                };
                let username = var("MAIL_USERNAME");
                let sender = var("MAIL_SENDER")
                    .or_else(|| username.clone())
                    .ok_or(ConfigError::Missing("MAIL_SENDER"))?;
                Some(MailConfig {
                    host,
                    port,
                    username,
                    password: var("MAIL_PASSWORD"),
                    sender,
                })
            }
            None => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            secret_key,
            base_url,
            bind_addr,
            session_ttl,
            reset_token_ttl,
            cleanup_interval,
            mail,
        })
    }

    /// Defaults for everything except the signing secret.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            database_url: None,
            secret_key: secret_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            reset_token_ttl: Duration::seconds(DEFAULT_RESET_TOKEN_TTL_SECS),
            cleanup_interval: Duration::seconds(DEFAULT_CLEANUP_INTERVAL_SECS),
            mail: None,
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_secs(key: &'static str, raw: Option<String>, default: i64) -> Result<Duration, ConfigError> {
    match raw {
        Some(value) => match value.parse::<i64>() {
            Ok(secs) if secs > 0 => Ok(Duration::seconds(secs)),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(Duration::seconds(default)),
    }
}
