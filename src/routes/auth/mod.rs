mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// 登录与登出无需令牌
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handler::login))
        .route("/auth/logout", post(handler::logout))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/session", get(handler::session))
}
