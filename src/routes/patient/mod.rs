mod handler;
pub(crate) mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/patients",
            get(handler::list_patients).post(handler::create_patient),
        )
        .route(
            "/patients/{id}",
            get(handler::get_patient).put(handler::update_patient),
        )
        .route("/patients/{id}/visits", post(handler::add_visit))
}
