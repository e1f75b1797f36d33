use serde::{Deserialize, Serialize};

use crate::cache::SessionUser;

/// 任意用户名和密码都可登录，包括空值
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

pub const DEFAULT_ROLE: &str = "user";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_a_valid_login() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_empty());
        assert!(req.password.is_empty());
    }
}
