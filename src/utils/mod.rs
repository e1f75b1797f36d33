use axum::Json;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

mod date_range;
mod extract;
pub mod validation;

pub use date_range::DateRange;
pub use extract::{AppJson, AppPath, AppQuery, ValidatedJson};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // 用户ID
    pub username: String,
    pub role: String,
    pub branchid: String,
    pub jti: String,      // 会话ID
    pub exp: i64,         // 过期时间
    pub iat: i64,         // 签发时间
}

pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub fn generate_token(
    user_id: &str,
    username: &str,
    role: &str,
    branchid: &str,
    config: &Config,
) -> Result<IssuedToken, AppError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(config.jwt_expiration().as_secs() as i64))
        .ok_or_else(|| AppError::Internal("token expiration overflow".into()))?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        branchid: branchid.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: expiration,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;

    Ok(IssuedToken { token, claims })
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        AppError::InvalidToken
    })?;

    Ok(token_data.claims)
}

/// 令牌摘要（sha256 hex），用作 Redis 会话键
pub fn token_fingerprint(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const CONFLICT: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const NO_DATA: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            database_max_connections: 1,
            redis_url: String::new(),
            jwt_secret: "test-secret".into(),
            jwt_expiration_secs: 3600,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            server_host: "127.0.0.1".into(),
            server_port: 0,
            api_base_uri: "/api".into(),
            queue_board_ttl_secs: 10,
            default_open_rooms: 2,
            default_branch_id: "001".into(),
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let config = config();
        let issued = generate_token("u-1", "alice", "user", "001", &config).unwrap();
        let claims = verify_token(&issued.token, &config).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.branchid, "001");
        assert_eq!(claims.jti, issued.claims.jti);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = generate_token("u-1", "", "user", "001", &config()).unwrap();
        let mut other = config();
        other.jwt_secret = "another".into();
        assert!(matches!(
            verify_token(&issued.token, &other),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = token_fingerprint("abc");
        assert_eq!(a, token_fingerprint("abc"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, token_fingerprint("abd"));
    }
}
