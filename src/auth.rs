use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// JWT claims carried by a bearer token: who the user is and which tenant they act as.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(config: &Config, user_id: &str, tenant_id: &str) -> Result<String, AppError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        tenant_id: tenant_id.to_string(),
        iat: now,
        exp: now + config.jwt_token_ttl_seconds,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| AppError::Auth)
}

fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Auth)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, 12).map_err(|_| AppError::Validation("could not hash password".into()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Authenticated tenant/user context extracted from `Authorization: Bearer <jwt>`.
pub struct AuthUser {
    pub user_id: String,
    pub tenant_id: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match request.rocket().state::<Config>() {
            Some(c) => c,
            None => return Outcome::Error((Status::InternalServerError, "config not managed")),
        };

        let token = match request.headers().get_one("Authorization") {
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token,
                None => return Outcome::Error((Status::Unauthorized, "expected Bearer token")),
            },
            None => return Outcome::Error((Status::Unauthorized, "missing Authorization header")),
        };

        match verify_token(&config.jwt_secret, token) {
            Ok(claims) => Outcome::Success(AuthUser {
                user_id: claims.sub,
                tenant_id: claims.tenant_id,
            }),
            Err(_) => Outcome::Error((Status::Unauthorized, "invalid or expired token")),
        }
    }
}

/// Extract client IP for rate limiting: forwarded headers first, socket address fallback.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        if let Some(xff) = request.headers().get_one("X-Forwarded-For") {
            if let Some(first) = xff.split(',').next() {
                return Outcome::Success(ClientIp(first.trim().to_string()));
            }
        }
        if let Some(real) = request.headers().get_one("X-Real-Ip") {
            return Outcome::Success(ClientIp(real.to_string()));
        }
        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> Config {
        Config {
            database_path: ":memory:".into(),
            jwt_secret: secret.into(),
            jwt_token_ttl_seconds: 3600,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            health_check_concurrency: 10,
            monitor_rate_limit: 10,
        }
    }

    #[test]
    fn token_round_trips() {
        let config = test_config("test-secret");
        let token = issue_token(&config, "user-1", "tenant-1").unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.tenant_id, "tenant-1");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_token(&test_config("secret-a"), "user-1", "tenant-1").unwrap();
        assert!(verify_token("secret-b", &token).is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert!(verify_password("correct-horse-battery", &hash));
        assert!(!verify_password("wrong", &hash));
    }
}
