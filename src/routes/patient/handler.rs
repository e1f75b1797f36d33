use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppResult;
use crate::utils::{ApiResponse, AppPath, AppQuery, ValidatedJson, success_to_api_response};

use super::model::{Patient, PatientDetail, PatientRequest, Visit, VisitRequest};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

pub async fn list_patients(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<Patient>>>> {
    let patients = Patient::find_all(&state.pool, query.search.as_deref()).await?;
    Ok(success_to_api_response(patients))
}

pub async fn get_patient(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ApiResponse<PatientDetail>>> {
    let (patient, visits) = futures_util::try_join!(
        Patient::find_by_id(&state.pool, id),
        Visit::find_by_patient(&state.pool, id),
    )?;
    Ok(success_to_api_response(PatientDetail { patient, visits }))
}

pub async fn create_patient(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PatientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Patient>>)> {
    let patient = Patient::create(&state.pool, req).await?;
    tracing::info!("patient {} registered as HN {}", patient.id, patient.hn);
    Ok((StatusCode::CREATED, success_to_api_response(patient)))
}

pub async fn update_patient(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<PatientRequest>,
) -> AppResult<Json<ApiResponse<Patient>>> {
    Ok(success_to_api_response(
        Patient::update(&state.pool, id, req).await?,
    ))
}

pub async fn add_visit(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(req): ValidatedJson<VisitRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Visit>>)> {
    // 患者不存在时返回 404
    Patient::find_by_id(&state.pool, id).await?;
    let visit = Visit::create(&state.pool, id, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(visit)))
}
