use axum::{
    Json,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
};

use crate::AppState;
use crate::error::AppResult;
use crate::routes::worker::EmployeeType;
use crate::utils::{ApiResponse, AppPath, AppQuery, ValidatedJson, success_to_api_response};

use super::export::{ExportTable, XLSX_CONTENT_TYPE, select_columns, to_html, to_xlsx};
use super::model::{
    ExportRequest, PatientReportDetail, PatientReportRow, RangeQuery, ReportKind,
    StaffReportDetail, StaffReportRow,
};

pub async fn list_doctors(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<StaffReportRow>>>> {
    let rows =
        StaffReportRow::find_all(&state.pool, EmployeeType::Doctor, &query.range()?, None).await?;
    Ok(success_to_api_response(rows))
}

pub async fn doctor_detail(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<StaffReportDetail>>> {
    let detail =
        StaffReportRow::find_detail(&state.pool, EmployeeType::Doctor, id, &query.range()?).await?;
    Ok(success_to_api_response(detail))
}

pub async fn list_nurses(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<StaffReportRow>>>> {
    let rows =
        StaffReportRow::find_all(&state.pool, EmployeeType::Nurse, &query.range()?, None).await?;
    Ok(success_to_api_response(rows))
}

pub async fn nurse_detail(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<StaffReportDetail>>> {
    let detail =
        StaffReportRow::find_detail(&state.pool, EmployeeType::Nurse, id, &query.range()?).await?;
    Ok(success_to_api_response(detail))
}

pub async fn list_patients(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<PatientReportRow>>>> {
    let rows = PatientReportRow::find_all(&state.pool, &query.range()?, None).await?;
    Ok(success_to_api_response(rows))
}

pub async fn patient_detail(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(query): AppQuery<RangeQuery>,
) -> AppResult<Json<ApiResponse<PatientReportDetail>>> {
    let detail = PatientReportRow::find_detail(&state.pool, id, &query.range()?).await?;
    Ok(success_to_api_response(detail))
}

/// 按报表类型取数，再裁剪为选中的行和列
async fn export_table(
    state: &AppState,
    kind: ReportKind,
    req: &ExportRequest,
) -> AppResult<ExportTable> {
    let range = req.range()?;
    match kind {
        ReportKind::Doctors => {
            let rows =
                StaffReportRow::find_all(&state.pool, EmployeeType::Doctor, &range, None).await?;
            select_columns(&req.keep(rows), &req.columns)
        }
        ReportKind::Nurses => {
            let rows =
                StaffReportRow::find_all(&state.pool, EmployeeType::Nurse, &range, None).await?;
            select_columns(&req.keep(rows), &req.columns)
        }
        ReportKind::Patients => {
            let rows = PatientReportRow::find_all(&state.pool, &range, None).await?;
            select_columns(&req.keep(rows), &req.columns)
        }
    }
}

pub async fn export_excel(
    State(state): State<AppState>,
    AppPath(kind): AppPath<ReportKind>,
    ValidatedJson(req): ValidatedJson<ExportRequest>,
) -> AppResult<Response> {
    let table = export_table(&state, kind, &req).await?;
    let bytes = to_xlsx(&table, kind.file_stem())?;

    tracing::info!(
        "exported {} report: {} rows, {} columns, {} bytes",
        kind.file_stem(),
        table.rows.len(),
        table.headers.len(),
        bytes.len()
    );

    let disposition = format!(
        "attachment; filename=\"{}_{}.xlsx\"",
        kind.file_stem(),
        chrono::Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn export_pdf(
    State(state): State<AppState>,
    AppPath(kind): AppPath<ReportKind>,
    ValidatedJson(req): ValidatedJson<ExportRequest>,
) -> AppResult<Html<String>> {
    let table = export_table(&state, kind, &req).await?;
    tracing::info!(
        "printable {} report: {} rows",
        kind.file_stem(),
        table.rows.len()
    );
    Ok(Html(to_html(&table, kind.title())))
}
