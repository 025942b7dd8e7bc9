use std::{env, path::PathBuf};

use anyhow::Context;

const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
    pub cors_origins: Vec<String>,
    pub token_ttl_hours: i64,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let admin_email = required("ADMIN_EMAIL")?;
        let admin_password = required("ADMIN_PASSWORD")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);
        let cors_origins =
            parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.into()));
        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            admin_email,
            admin_password,
            cors_origins,
            token_ttl_hours,
            upload_dir,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} is not set"))
}

/// Splits a comma separated allow-list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" http://localhost:5173/ ,, https://shop.example.com"),
            vec!["http://localhost:5173", "https://shop.example.com"]
        );
        assert!(parse_origins("  ").is_empty());
    }

    #[test]
    fn default_origins_cover_shop_and_admin() {
        assert_eq!(parse_origins(DEFAULT_ORIGINS).len(), 2);
    }
}
