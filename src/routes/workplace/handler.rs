use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppResult;
use crate::utils::{ApiResponse, AppPath, AppQuery, ValidatedJson, success_to_api_response};

use super::model::{
    Building, BuildingRequest, Department, DepartmentRequest, Floor, FloorRequest, Room,
    RoomFilter, RoomRequest, delete_by_id, find_by_id,
};

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorQuery {
    pub building_id: Option<i64>,
}

// ========== 科室 ==========

pub async fn list_departments(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DepartmentQuery>,
) -> AppResult<Json<ApiResponse<Vec<Department>>>> {
    let departments = Department::find_all(&state.pool, query.active_only).await?;
    Ok(success_to_api_response(departments))
}

pub async fn get_department(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let department = find_by_id::<Department>(&state.pool, id).await?;
    Ok(success_to_api_response(department))
}

pub async fn create_department(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DepartmentRequest>,
) -> AppResult<Created<Department>> {
    let department = Department::create(&state.pool, req).await?;
    tracing::info!("department {} created", department.id);
    Ok((StatusCode::CREATED, success_to_api_response(department)))
}

pub async fn update_department(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<DepartmentRequest>,
) -> AppResult<Json<ApiResponse<Department>>> {
    let department = Department::update(&state.pool, id, req).await?;
    Ok(success_to_api_response(department))
}

pub async fn delete_department(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<i64>>> {
    delete_by_id::<Department>(&state.pool, id).await?;
    tracing::info!("department {} deleted", id);
    Ok(success_to_api_response(id))
}

// ========== 楼宇 ==========

pub async fn list_buildings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Building>>>> {
    Ok(success_to_api_response(Building::find_all(&state.pool).await?))
}

pub async fn get_building(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Building>>> {
    Ok(success_to_api_response(
        find_by_id::<Building>(&state.pool, id).await?,
    ))
}

pub async fn create_building(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BuildingRequest>,
) -> AppResult<Created<Building>> {
    let building = Building::create(&state.pool, req).await?;
    tracing::info!("building {} created", building.id);
    Ok((StatusCode::CREATED, success_to_api_response(building)))
}

pub async fn update_building(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<BuildingRequest>,
) -> AppResult<Json<ApiResponse<Building>>> {
    Ok(success_to_api_response(
        Building::update(&state.pool, id, req).await?,
    ))
}

pub async fn delete_building(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<i64>>> {
    delete_by_id::<Building>(&state.pool, id).await?;
    tracing::info!("building {} deleted", id);
    Ok(success_to_api_response(id))
}

// ========== 楼层 ==========

pub async fn list_floors(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FloorQuery>,
) -> AppResult<Json<ApiResponse<Vec<Floor>>>> {
    Ok(success_to_api_response(
        Floor::find_all(&state.pool, query.building_id).await?,
    ))
}

pub async fn get_floor(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Floor>>> {
    Ok(success_to_api_response(find_by_id::<Floor>(&state.pool, id).await?))
}

pub async fn create_floor(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<FloorRequest>,
) -> AppResult<Created<Floor>> {
    let floor = Floor::create(&state.pool, req).await?;
    tracing::info!("floor {} created in building {}", floor.id, floor.building_id);
    Ok((StatusCode::CREATED, success_to_api_response(floor)))
}

pub async fn update_floor(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<FloorRequest>,
) -> AppResult<Json<ApiResponse<Floor>>> {
    Ok(success_to_api_response(
        Floor::update(&state.pool, id, req).await?,
    ))
}

pub async fn delete_floor(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<i64>>> {
    delete_by_id::<Floor>(&state.pool, id).await?;
    Ok(success_to_api_response(id))
}

// ========== 诊室 ==========

pub async fn list_rooms(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<RoomFilter>,
) -> AppResult<Json<ApiResponse<Vec<Room>>>> {
    Ok(success_to_api_response(
        Room::find_all(&state.pool, &filter).await?,
    ))
}

pub async fn get_room(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<Room>>> {
    Ok(success_to_api_response(find_by_id::<Room>(&state.pool, id).await?))
}

pub async fn create_room(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RoomRequest>,
) -> AppResult<Created<Room>> {
    let room = Room::create(&state.pool, req).await?;
    tracing::info!("room {} created for department {}", room.id, room.department_id);
    Ok((StatusCode::CREATED, success_to_api_response(room)))
}

pub async fn update_room(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<RoomRequest>,
) -> AppResult<Json<ApiResponse<Room>>> {
    Ok(success_to_api_response(
        Room::update(&state.pool, id, req).await?,
    ))
}

pub async fn delete_room(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<i64>>> {
    delete_by_id::<Room>(&state.pool, id).await?;
    Ok(success_to_api_response(id))
}
