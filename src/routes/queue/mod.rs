pub(crate) mod board;
mod handler;
pub(crate) mod model;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::AppState;

/// 候诊大屏只读接口，无需登录
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/queue/queues/active", get(handler::active_queues))
        .route("/queue/board", get(handler::board))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue/queues", post(handler::issue_queue))
        .route("/queue/queues/{id}/status", put(handler::update_status))
}
