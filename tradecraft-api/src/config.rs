/// API server configuration
///
/// Everything comes from environment variables, with `.env` loaded first
/// in development. `JWT_SECRET` and `DATABASE_URL` are required; the
/// rest has sensible defaults.
use anyhow::{bail, Context};

use tradecraft_shared::db::pool::DatabaseConfig;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        // Absent .env is fine in production.
        dotenvy::dotenv().ok();

        let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters");
        }

        Ok(Config {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..DatabaseConfig::default()
            },
            jwt: JwtConfig { secret },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 9000,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: "x".repeat(MIN_JWT_SECRET_LENGTH),
            },
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
