use std::net::SocketAddr;

use anyhow::Context;

const DEV_JWT_SECRET: &str = "yamdb-dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub confirmation_code_ttl_secs: i64,
    pub confirmation_attempts_per_minute: u32,
    pub mail_from: String,
    pub page_size: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://yamdb.db?mode=rwc".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            },
        };

        let access_token_ttl_secs: i64 = parse_or("ACCESS_TOKEN_TTL_SECS", 86_400)?;
        let confirmation_code_ttl_secs: i64 = parse_or("CONFIRMATION_CODE_TTL_SECS", 259_200)?;
        let confirmation_attempts_per_minute: u32 =
            parse_or("CONFIRMATION_ATTEMPTS_PER_MINUTE", 5)?;

        let mail_from =
            std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@yamdb.local".to_string());

        let page_size: u64 = parse_or("PAGE_SIZE", 10)?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            jwt_secret,
            access_token_ttl_secs,
            confirmation_code_ttl_secs,
            confirmation_attempts_per_minute,
            mail_from,
            page_size: page_size.clamp(1, crate::pagination::MAX_PAGE_SIZE),
        })
    }

    /// In-memory database and a fixed secret, for tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            addr: "127.0.0.1:0".parse().expect("static addr"),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_secs: 3_600,
            confirmation_code_ttl_secs: 3_600,
            confirmation_attempts_per_minute: 3,
            mail_from: "noreply@yamdb.test".to_string(),
            page_size: 10,
        }
    }
}

fn parse_or<T>(var: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().with_context(|| var.to_string()),
        Err(_) => Ok(default),
    }
}
