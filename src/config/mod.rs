use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// 叫号看板缓存时间，与前端轮询周期一致
    pub queue_board_ttl_secs: u64,
    /// 自动生成排班时默认开放的诊室数量
    pub default_open_rooms: usize,
    pub default_branch_id: String,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 支持 "24h" 这种写法
        let jwt_expiration_hours = match env::var("JWT_EXPIRATION") {
            Ok(value) => value
                .trim()
                .trim_end_matches('h')
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    key: "JWT_EXPIRATION",
                    value,
                })?,
            Err(_) => 24,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration_hours * 3600,
            rate_limit_window_secs: optional("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: optional("RATE_LIMIT_REQUESTS", 100)?,
            server_host: optional("SERVER_HOST", "0.0.0.0".to_string())?,
            server_port: optional("SERVER_PORT", 3000)?,
            api_base_uri: optional("API_BASE_URI", "/api".to_string())?,
            queue_board_ttl_secs: optional("QUEUE_BOARD_TTL", 10)?,
            default_open_rooms: optional("DEFAULT_OPEN_ROOMS", 2)?,
            default_branch_id: optional("DEFAULT_BRANCH_ID", "001".to_string())?,
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn queue_board_ttl(&self) -> Duration {
        Duration::from_secs(self.queue_board_ttl_secs)
    }
}
