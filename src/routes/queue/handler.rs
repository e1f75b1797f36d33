use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use crate::AppState;
use crate::cache::{self, keys};
use crate::error::AppResult;
use crate::utils::{ApiResponse, AppJson, AppPath, AppQuery, ValidatedJson, success_to_api_response};

use super::board::{DepartmentBoard, NEXT_UP_LIMIT, build_board};
use super::model::{ActiveQueue, IssueQueueRequest, QueueItem, UpdateStatusRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardQuery {
    pub department_id: Option<i64>,
}

/// 队列变化后清除所有看板快照，失败只记录日志
async fn invalidate_boards(state: &AppState) {
    if let Err(e) = cache::delete_prefix(&state.redis, keys::QUEUE_BOARD_PREFIX).await {
        tracing::warn!("failed to invalidate queue boards: {}", e);
    }
}

pub async fn active_queues(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BoardQuery>,
) -> AppResult<Json<ApiResponse<Vec<ActiveQueue>>>> {
    let items = ActiveQueue::find_active(&state.pool, query.department_id).await?;
    Ok(success_to_api_response(items))
}

/// 看板快照缓存一个轮询周期
pub async fn board(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BoardQuery>,
) -> AppResult<Json<ApiResponse<Vec<DepartmentBoard>>>> {
    let cache_key = keys::queue_board_key(query.department_id);

    match cache::get_json::<Vec<DepartmentBoard>>(&state.redis, &cache_key).await {
        Ok(Some(board)) => {
            tracing::debug!("queue board from cache: {}", cache_key);
            return Ok(success_to_api_response(board));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("queue board cache read failed: {}", e),
    }

    let items = ActiveQueue::find_active(&state.pool, query.department_id).await?;
    let board = build_board(&items, NEXT_UP_LIMIT);

    if let Err(e) = cache::set_json(
        &state.redis,
        &cache_key,
        &board,
        state.config.queue_board_ttl().as_secs(),
    )
    .await
    {
        tracing::warn!("queue board cache write failed: {}", e);
    } else {
        tracing::debug!("queue board cached: {}", cache_key);
    }

    Ok(success_to_api_response(board))
}

pub async fn issue_queue(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<IssueQueueRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<QueueItem>>)> {
    let item = QueueItem::issue(&state.pool, req).await?;
    tracing::info!(
        "queue {} issued for patient {} in department {}",
        item.queue_no,
        item.patient_id,
        item.department_id
    );
    invalidate_boards(&state).await;
    Ok((StatusCode::CREATED, success_to_api_response(item)))
}

pub async fn update_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<QueueItem>>> {
    let item = QueueItem::update_status(&state.pool, id, req.status).await?;
    tracing::info!("queue {} -> {}", item.queue_no, item.status.as_str());
    invalidate_boards(&state).await;
    Ok(success_to_api_response(item))
}
