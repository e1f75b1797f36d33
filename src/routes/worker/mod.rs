mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub use model::{Employee, EmployeeType};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/worker/", get(handler::list_workers))
        .route("/worker", get(handler::list_workers))
        .route("/worker/{id}", get(handler::get_worker))
}
