use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::utils::{ApiResponse, success_to_api_response};

#[derive(Debug, Serialize)]
pub struct Ping {
    pub status: &'static str,
    pub timestamp: i64,
}

async fn ping() -> Json<ApiResponse<Ping>> {
    success_to_api_response(Ping {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health/ping", get(ping))
}
