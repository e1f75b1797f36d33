// 缓存模块：会话与叫号看板快照
// Redis 不可用时读路径回退到数据库，由调用方决定

pub mod keys;
pub mod session;

use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};
use serde::{Serialize, de::DeserializeOwned};

pub use session::{CachedSession, SessionCacheOperations, SessionUser};

fn serde_error(desc: &'static str, e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::IoError, desc, e.to_string()))
}

pub async fn get_json<T: DeserializeOwned>(
    redis: &Arc<RedisClient>,
    key: &str,
) -> Result<Option<T>, redis::RedisError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let result: Option<String> = conn.get(key).await?;

    match result {
        Some(json) => {
            let value =
                serde_json::from_str(&json).map_err(|e| serde_error("deserialize error", e))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize>(
    redis: &Arc<RedisClient>,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), redis::RedisError> {
    if ttl_secs == 0 {
        return Ok(());
    }
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let json = serde_json::to_string(value).map_err(|e| serde_error("serialize error", e))?;
    let _: () = conn.set_ex(key, json, ttl_secs).await?;
    Ok(())
}

pub async fn delete(redis: &Arc<RedisClient>, key: &str) -> Result<(), redis::RedisError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn.del(key).await?;
    Ok(())
}

/// 按前缀删除，用于看板快照失效
pub async fn delete_prefix(
    redis: &Arc<RedisClient>,
    prefix: &str,
) -> Result<(), redis::RedisError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let keys: Vec<String> = conn.keys(format!("{}*", prefix)).await?;
    if !keys.is_empty() {
        let _: () = conn.del(keys).await?;
    }
    Ok(())
}
