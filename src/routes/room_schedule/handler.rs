use std::collections::BTreeSet;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::worker::{Employee, EmployeeType};
use crate::routes::workplace::Room;
use crate::routes::workplace::model::{delete_by_id, find_by_id};
use crate::utils::{ApiResponse, AppJson, AppPath, AppQuery, ValidatedJson, success_to_api_response};

use super::model::{BulkScheduleRequest, RoomSchedule, RoomScheduleRequest, ToggleOpenRequest};
use super::planner::{
    ScheduleDraft, busy_staff, check_assignment, default_drafts, find_double_booking,
    find_double_booking_in_batch,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureQuery {
    pub date: NaiveDate,
    pub department_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub exclude_schedule_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureResponse {
    /// 本次是否生成了默认排班
    pub created: bool,
    pub schedules: Vec<RoomSchedule>,
}

/// 排班弹窗里的医护选项
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffOption {
    pub id: i64,
    pub name: String,
    pub employee_type: EmployeeType,
    pub department_id: Option<i64>,
    pub disabled: bool,
    pub assigned_room_id: Option<i64>,
}

async fn ensure_no_double_booking(
    pool: &PgPool,
    draft: &ScheduleDraft,
    exclude: Option<i64>,
) -> AppResult<()> {
    if !draft.is_open || (draft.doctor_id.is_none() && draft.nurse_id.is_none()) {
        return Ok(());
    }
    let same_day = RoomSchedule::find_all(pool, Some(draft.date), None).await?;
    match find_double_booking(&same_day, draft, exclude) {
        Some(conflict) => {
            tracing::info!("rejected schedule for room {}: {}", draft.room_id, conflict);
            Err(AppError::conflict(conflict.to_string()))
        }
        None => Ok(()),
    }
}

/// 引用的记录不存在时按字段报错
fn missing_as_field(e: AppError, field: &str) -> AppError {
    match e {
        AppError::NotFound(what) => AppError::field(field, format!("{} does not exist", what)),
        other => other,
    }
}

async fn find_employee(pool: &PgPool, id: Option<i64>, field: &str) -> AppResult<Option<Employee>> {
    match id {
        Some(id) => find_by_id::<Employee>(pool, id)
            .await
            .map(Some)
            .map_err(|e| missing_as_field(e, field)),
        None => Ok(None),
    }
}

async fn verify_assignment(pool: &PgPool, draft: &ScheduleDraft) -> AppResult<()> {
    let (room, doctor, nurse) = futures_util::try_join!(
        async {
            find_by_id::<Room>(pool, draft.room_id)
                .await
                .map_err(|e| missing_as_field(e, "roomId"))
        },
        find_employee(pool, draft.doctor_id, "doctorId"),
        find_employee(pool, draft.nurse_id, "nurseId"),
    )?;
    check_assignment(draft, &room, doctor.as_ref(), nurse.as_ref())
}

async fn create_schedule(pool: &PgPool, draft: ScheduleDraft) -> AppResult<RoomSchedule> {
    verify_assignment(pool, &draft).await?;
    ensure_no_double_booking(pool, &draft, None).await?;
    let schedule = RoomSchedule::insert(pool, &draft).await?;
    tracing::info!(
        "schedule {} created: room {} on {}, open={}",
        schedule.id,
        schedule.room_id,
        schedule.date,
        schedule.is_open
    );
    Ok(schedule)
}

async fn update_schedule(pool: &PgPool, id: i64, draft: ScheduleDraft) -> AppResult<RoomSchedule> {
    verify_assignment(pool, &draft).await?;
    ensure_no_double_booking(pool, &draft, Some(id)).await?;
    RoomSchedule::update(pool, id, &draft).await
}

pub async fn list_schedules(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ScheduleQuery>,
) -> AppResult<Json<ApiResponse<Vec<RoomSchedule>>>> {
    let schedules = RoomSchedule::find_all(&state.pool, query.date, query.department_id).await?;
    Ok(success_to_api_response(schedules))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<RoomSchedule>>> {
    Ok(success_to_api_response(
        find_by_id::<RoomSchedule>(&state.pool, id).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RoomScheduleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RoomSchedule>>)> {
    let schedule = create_schedule(&state.pool, req.into_draft()?).await?;
    Ok((StatusCode::CREATED, success_to_api_response(schedule)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<RoomScheduleRequest>,
) -> AppResult<Json<ApiResponse<RoomSchedule>>> {
    let schedule = update_schedule(&state.pool, id, req.into_draft()?).await?;
    Ok(success_to_api_response(schedule))
}

/// 开关诊室，立即写库并返回最新记录
pub async fn toggle_open(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<ToggleOpenRequest>,
) -> AppResult<Json<ApiResponse<RoomSchedule>>> {
    let current = find_by_id::<RoomSchedule>(&state.pool, id).await?;

    if req.is_open && !current.is_open {
        let mut draft = ScheduleDraft::from(&current);
        draft.is_open = true;
        ensure_no_double_booking(&state.pool, &draft, Some(id)).await?;
    }

    let schedule = RoomSchedule::set_open(&state.pool, id, req.is_open).await?;
    tracing::info!("schedule {} switched open={}", id, schedule.is_open);
    Ok(success_to_api_response(schedule))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<i64>>> {
    delete_by_id::<RoomSchedule>(&state.pool, id).await?;
    Ok(success_to_api_response(id))
}

/// 批量创建，全部成功或全部回滚
pub async fn bulk_create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BulkScheduleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vec<RoomSchedule>>>)> {
    let drafts = req
        .schedules
        .into_iter()
        .map(RoomScheduleRequest::into_draft)
        .collect::<AppResult<Vec<_>>>()?;
    for draft in &drafts {
        verify_assignment(&state.pool, draft).await?;
    }

    let dates: BTreeSet<NaiveDate> = drafts.iter().map(|d| d.date).collect();
    let mut existing = Vec::new();
    for date in dates {
        existing.extend(RoomSchedule::find_all(&state.pool, Some(date), None).await?);
    }
    if let Some(conflict) = find_double_booking_in_batch(&existing, &drafts) {
        return Err(AppError::conflict(conflict.to_string()));
    }

    let mut tx = state.pool.begin().await?;
    let mut created = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        created.push(RoomSchedule::insert(&mut *tx, draft).await?);
    }
    tx.commit().await?;

    tracing::info!("bulk created {} schedules", created.len());
    Ok((StatusCode::CREATED, success_to_api_response(created)))
}

/// 有 id 更新，否则新建；返回该科室当天的完整列表
pub async fn upsert(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RoomScheduleRequest>,
) -> AppResult<Json<ApiResponse<Vec<RoomSchedule>>>> {
    let id = req.id;
    let draft = req.into_draft()?;
    let (date, department_id) = (draft.date, draft.department_id);

    match id {
        Some(id) => update_schedule(&state.pool, id, draft).await?,
        None => create_schedule(&state.pool, draft).await?,
    };

    let schedules = RoomSchedule::find_all(&state.pool, Some(date), Some(department_id)).await?;
    Ok(success_to_api_response(schedules))
}

/// 当天科室没有排班时按默认规则生成
pub async fn ensure_defaults(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EnsureQuery>,
) -> AppResult<Json<ApiResponse<EnsureResponse>>> {
    let (existing, rooms) = futures_util::try_join!(
        async {
            RoomSchedule::find_all(&state.pool, Some(query.date), Some(query.department_id))
                .await
                .map_err(AppError::from)
        },
        Room::find_active_by_department(&state.pool, query.department_id),
    )?;

    if !existing.is_empty() {
        return Ok(success_to_api_response(EnsureResponse {
            created: false,
            schedules: existing,
        }));
    }

    let drafts = default_drafts(
        query.date,
        query.department_id,
        &rooms,
        state.config.default_open_rooms,
    );
    tracing::debug!(
        "synthesizing {} default schedules for department {} on {}",
        drafts.len(),
        query.department_id,
        query.date
    );

    let mut tx = state.pool.begin().await?;
    let mut inserted = 0;
    for draft in &drafts {
        inserted += RoomSchedule::insert_default(&mut *tx, draft).await?;
    }
    tx.commit().await?;

    let schedules =
        RoomSchedule::find_all(&state.pool, Some(query.date), Some(query.department_id)).await?;
    Ok(success_to_api_response(EnsureResponse {
        created: inserted > 0,
        schedules,
    }))
}

/// 医护选择列表：同一天已在其他开放诊室的人员标记为不可选
pub async fn availability(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> AppResult<Json<ApiResponse<Vec<StaffOption>>>> {
    let (staff, same_day) = futures_util::try_join!(
        Employee::find_schedulable(&state.pool),
        async {
            RoomSchedule::find_all(&state.pool, Some(query.date), None)
                .await
                .map_err(AppError::from)
        },
    )?;

    let busy = busy_staff(&same_day, query.date, query.exclude_schedule_id);
    let options = staff
        .into_iter()
        .map(|e| {
            let assigned_room_id = busy.get(&e.id).map(|s| s.room_id);
            StaffOption {
                name: e.full_name(),
                id: e.id,
                employee_type: e.employee_type,
                department_id: e.department_id,
                disabled: assigned_room_id.is_some(),
                assigned_room_id,
            }
        })
        .collect();

    Ok(success_to_api_response(options))
}
