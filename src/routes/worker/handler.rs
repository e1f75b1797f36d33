use axum::{
    Json,
    extract::State,
};

use crate::AppState;
use crate::error::AppResult;
use crate::routes::workplace::model::find_by_id;
use crate::utils::{ApiResponse, AppPath, AppQuery, success_to_api_response};

use super::model::{Employee, EmployeeFilter};

pub async fn list_workers(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<EmployeeFilter>,
) -> AppResult<Json<ApiResponse<Vec<Employee>>>> {
    let employees = Employee::find_all(&state.pool, &filter).await?;
    Ok(success_to_api_response(employees))
}

pub async fn get_worker(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    Ok(success_to_api_response(
        find_by_id::<Employee>(&state.pool, id).await?,
    ))
}
