use std::sync::Arc;

use blogsite::config::{environment::Config, init_db, run_migrations};
use blogsite::services::mailer::{LogMailer, Mailer, SmtpMailer};
use blogsite::Stores;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogsite=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let stores = match &config.database_url {
        Some(url) => {
            let db = init_db(url).await?;
            run_migrations(&db).await?;
            tracing::info!("Connected to MySQL");
            Stores::mysql(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory");
            Stores::in_memory()
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => {
            tracing::info!(host = %mail.host, port = mail.port, "SMTP mailer configured");
            Arc::new(SmtpMailer::new(mail)?)
        }
        None => {
            tracing::warn!("MAIL_SERVER not set, reset emails are written to the log");
            Arc::new(LogMailer)
        }
    };

    let cleanup_every = config
        .cleanup_interval
        .to_std()
        .map_err(|e| format!("CLEANUP_INTERVAL_SECS out of range: {}", e))?;
    blogsite::spawn_cleanup(stores.clone(), cleanup_every);

    let app = blogsite::create_app(&config, stores, mailer).await;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on {}", config.base_url);
    axum::serve(listener, app).await?;

    Ok(())
}
