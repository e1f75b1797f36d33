/// 会话缓存键前缀
const SESSION_PREFIX: &str = "session:";

/// 叫号看板快照前缀
pub const QUEUE_BOARD_PREFIX: &str = "queue:board:";

/// 限流计数前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 会话键，使用令牌摘要
pub fn session_key(fingerprint: &str) -> String {
    format!("{}{}", SESSION_PREFIX, fingerprint)
}

/// 看板快照键，`None` 表示全部科室
pub fn queue_board_key(department_id: Option<i64>) -> String {
    match department_id {
        Some(id) => format!("{}dept:{}", QUEUE_BOARD_PREFIX, id),
        None => format!("{}all", QUEUE_BOARD_PREFIX),
    }
}

pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_keys_share_prefix() {
        assert!(queue_board_key(None).starts_with(QUEUE_BOARD_PREFIX));
        assert!(queue_board_key(Some(7)).starts_with(QUEUE_BOARD_PREFIX));
        assert_ne!(queue_board_key(Some(7)), queue_board_key(Some(8)));
    }
}
