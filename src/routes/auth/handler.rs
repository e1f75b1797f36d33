use axum::{
    Json,
    extract::{Extension, Request, State},
};

use crate::AppState;
use crate::cache::{CachedSession, SessionCacheOperations, SessionUser};
use crate::error::{AppError, AppResult};
use crate::middleware::{BearerToken, bearer_token};
use crate::utils::{
    ApiResponse, AppJson, generate_token, success_to_api_response, token_fingerprint,
};

use super::model::{DEFAULT_ROLE, LoginRequest, LoginResponse, LogoutResponse};

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let user = SessionUser {
        id: uuid::Uuid::new_v4().to_string(),
        username: req.username,
        role: DEFAULT_ROLE.to_string(),
        branchid: state.config.default_branch_id.clone(),
    };

    let issued = generate_token(
        &user.id,
        &user.username,
        &user.role,
        &user.branchid,
        &state.config,
    )?;

    let session = CachedSession {
        session_id: issued.claims.jti.clone(),
        user: user.clone(),
        created_at: issued.claims.iat,
        expires_at: issued.claims.exp,
    };

    // 会话写入失败不影响登录，令牌本身可校验
    if let Err(e) = SessionCacheOperations::cache_session(
        &state.redis,
        &token_fingerprint(&issued.token),
        &session,
    )
    .await
    {
        tracing::warn!("failed to store session {}: {}", session.session_id, e);
    }

    tracing::info!("user {:?} logged in as {}", user.username, user.id);
    Ok(success_to_api_response(LoginResponse {
        token: issued.token,
        user,
    }))
}

#[axum::debug_handler]
pub async fn session(
    State(state): State<AppState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> AppResult<Json<ApiResponse<CachedSession>>> {
    SessionCacheOperations::get_session(&state.redis, &token_fingerprint(&token))
        .await?
        .map(success_to_api_response)
        .ok_or_else(|| AppError::not_found("session"))
}

/// 登出只删除会话；无令牌或会话已删除也返回成功
pub async fn logout(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Json<ApiResponse<LogoutResponse>>> {
    if let Some(token) = bearer_token(&req) {
        SessionCacheOperations::remove_session(&state.redis, &token_fingerprint(&token)).await?;
        tracing::info!("session removed");
    }
    Ok(success_to_api_response(LogoutResponse { logged_out: true }))
}
