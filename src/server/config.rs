//! Environment configuration.
//!
//! Everything comes from environment variables (loaded from `.env` by
//! `dotenv` in `main`). The database is required; mail is optional and
//! the server runs without it, logging OTP codes instead of sending
//! them.

use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub google_maps_api_key: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    /// Read configuration from the environment. Fails only on a missing
    /// `DATABASE_URL`; everything else has a default or is optional.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url = std::env::var("DATABASE_URL")?;

        let server_port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(8080);

        let google_maps_api_key = std::env::var("GOOGLE_MAPS_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("GOOGLE_MAPS_API_KEY not set, court search will fail");
            String::new()
        });

        let smtp = match (
            std::env::var("SMTP_HOST"),
            std::env::var("SMTP_USERNAME"),
            std::env::var("SMTP_PASSWORD"),
            std::env::var("SMTP_FROM"),
        ) {
            (Ok(host), Ok(username), Ok(password), Ok(from_address)) => Some(SmtpConfig {
                host,
                username,
                password,
                from_address,
            }),
            _ => {
                tracing::warn!("SMTP_* not fully configured, mail disabled");
                None
            }
        };

        Ok(Config {
            database_url,
            server_port,
            google_maps_api_key,
            smtp,
        })
    }
}

/// Connect to Postgres and apply migrations.
///
/// A migration failure is logged but does not abort startup; the
/// schema may already be in place from a previous run.
pub async fn load_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("connecting to database");
    let pool = PgPool::connect(database_url).await?;
    tracing::info!("database connection pool created");

    match sqlx::migrate!().run(&pool).await {
        Ok(()) => tracing::info!("database migrations applied"),
        Err(err) => {
            tracing::error!(error = ?err, "migration failed, continuing with existing schema");
        }
    }

    Ok(pool)
}
