use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    AppState,
    cache::{CachedSession, SessionCacheOperations},
    error::AppError,
    utils::{token_fingerprint, verify_token},
};

/// 通过认证的原始令牌，供登出、会话查询使用
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

pub fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// 会话已删除（登出）则拒绝；Redis 不可用时只凭令牌签名放行
fn session_gate(
    lookup: Result<Option<CachedSession>, redis::RedisError>,
    subject: &str,
) -> Result<(), AppError> {
    match lookup {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            tracing::debug!("no session for user {}, token was logged out", subject);
            Err(AppError::InvalidToken)
        }
        Err(e) => {
            tracing::warn!("session lookup skipped for user {}: {}", subject, e);
            Ok(())
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(&token, &state.config)?;

    let lookup =
        SessionCacheOperations::get_session(&state.redis, &token_fingerprint(&token)).await;
    session_gate(lookup, &claims.sub)?;

    tracing::debug!("authenticated user {} ({})", claims.sub, claims.role);
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}
