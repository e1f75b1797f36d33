mod auth;
mod document;
mod health;
mod patient;
mod queue;
mod report;
mod room_schedule;
mod worker;
mod workplace;

use axum::Router;

use crate::AppState;
use crate::middleware::{auth_middleware, log_errors};

/// 公开路由与受保护路由合并后挂在 `api_base_uri` 下
pub fn build_router(state: &AppState) -> Router<AppState> {
    // 登录、登出、健康检查和叫号看板无需令牌
    let public_routes = Router::new()
        .merge(auth::public_router())
        .merge(health::router())
        .merge(queue::public_router());

    let protected_routes = Router::new()
        .merge(auth::router())
        .merge(workplace::router())
        .merge(room_schedule::router())
        .merge(worker::router())
        .merge(queue::router())
        .merge(patient::router())
        .merge(report::router())
        .merge(document::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };

    router.layer(axum::middleware::from_fn(log_errors))
}
