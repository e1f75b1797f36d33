mod export;
mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/doctors", get(handler::list_doctors))
        .route("/reports/doctor/{id}", get(handler::doctor_detail))
        .route("/reports/nurses", get(handler::list_nurses))
        .route("/reports/nurse/{id}", get(handler::nurse_detail))
        .route("/reports/patients", get(handler::list_patients))
        .route("/reports/patient/{id}", get(handler::patient_detail))
        .route("/reports/{kind}/export/excel", post(handler::export_excel))
        .route("/reports/{kind}/export/pdf", post(handler::export_pdf))
}
