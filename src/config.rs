use std::env;

/// Process configuration, loaded once at startup from the environment.
///
/// Both binaries (`sentinelcheck-api`, `sentinelcheck-worker`) load this the same way:
/// `dotenvy::dotenv().ok()` followed by `Config::from_env()`. Construction fails fast on
/// a missing `JWT_SECRET` or a malformed numeric value.
pub struct Config {
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_token_ttl_seconds: i64,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub health_check_concurrency: usize,
    pub monitor_rate_limit: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Config {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "sentinelcheck.db".to_string()),
            jwt_secret,
            jwt_token_ttl_seconds: parse_env_or("JWT_TOKEN_TTL_SECONDS", 86_400)?,
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: parse_env_or("SMTP_PORT", 587)?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
            health_check_concurrency: parse_env_or("HEALTH_CHECK_CONCURRENCY", 10)?,
            monitor_rate_limit: parse_env_or("MONITOR_RATE_LIMIT", 10)?,
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
