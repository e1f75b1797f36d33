use std::sync::Arc;

use redis::Client as RedisClient;
use serde::{Deserialize, Serialize};

use super::keys::session_key;

/// 登录用户信息，对应前端原先写入 localStorage 的 userData
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub role: String,
    pub branchid: String,
}

/// 会话缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CachedSession {
    pub session_id: String,
    pub user: SessionUser,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}

/// 会话缓存操作
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    pub async fn cache_session(
        redis: &Arc<RedisClient>,
        fingerprint: &str,
        session: &CachedSession,
    ) -> Result<(), redis::RedisError> {
        // 过期时间与令牌一致
        let ttl = session.expires_at - chrono::Utc::now().timestamp();
        if ttl <= 0 {
            return Ok(());
        }
        super::set_json(redis, &session_key(fingerprint), session, ttl as u64).await
    }

    pub async fn get_session(
        redis: &Arc<RedisClient>,
        fingerprint: &str,
    ) -> Result<Option<CachedSession>, redis::RedisError> {
        super::get_json(redis, &session_key(fingerprint)).await
    }

    /// 登出：删除会话，重复调用无副作用
    pub async fn remove_session(
        redis: &Arc<RedisClient>,
        fingerprint: &str,
    ) -> Result<(), redis::RedisError> {
        super::delete(redis, &session_key(fingerprint)).await
    }
}
