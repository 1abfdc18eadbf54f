/// Configuration management for the API server
///
/// Configuration is loaded from environment variables; in development a
/// `.env` file is read first via dotenvy.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `JWT_SECRET`: secret for token signing, at least 32 bytes (required)
/// - `CORS_ORIGINS`: comma-separated allowed origins; `*` = permissive dev mode
/// - `FRONTEND_URL`: base URL for password-reset links (default: http://localhost:3000)
/// - `APP_ENV`: `development` or `production`; production enables Secure
///   cookies and HSTS
/// - `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_SENDER`: mail provider; mail is
///   disabled with a warning when any is missing
/// - `RUST_LOG`: log filter (default: info)

use std::env;

use taskdeck_shared::db::pool::DatabaseConfig;
use taskdeck_shared::mail::MailConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Mail provider configuration; None disables outbound mail
    pub mail: Option<MailConfig>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` switches to permissive mode
    pub cors_origins: Vec<String>,

    /// Base URL of the frontend, used to build password-reset links
    pub frontend_url: String,

    /// Whether this deployment runs in production mode
    pub production: bool,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for token signing; at least 32 bytes
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed,
    /// or if `JWT_SECRET` is shorter than 32 bytes.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (development convenience)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let production = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let mail = match (
            env::var("MAIL_API_URL"),
            env::var("MAIL_API_KEY"),
            env::var("MAIL_SENDER"),
        ) {
            (Ok(api_url), Ok(api_key), Ok(sender)) => Some(MailConfig {
                api_url,
                api_key,
                sender,
            }),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                frontend_url,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            jwt: JwtConfig { secret: jwt_secret },
            mail,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the URL embedded in a password-reset email
    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password/{}",
            self.api.frontend_url.trim_end_matches('/'),
            token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                frontend_url: "http://localhost:3000".to_string(),
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            mail: None,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_reset_link() {
        let config = test_config();
        assert_eq!(
            config.reset_link("tok123"),
            "http://localhost:3000/reset-password/tok123"
        );

        let mut slashed = test_config();
        slashed.api.frontend_url = "https://app.example.com/".to_string();
        assert_eq!(
            slashed.reset_link("t"),
            "https://app.example.com/reset-password/t"
        );
    }
}
