mod handler;
pub(crate) mod model;
pub(crate) mod planner;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::AppState;

pub use model::RoomSchedule;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/workplace/room_schedule",
            get(handler::list_schedules).post(handler::create),
        )
        .route("/workplace/room_schedule/bulk", post(handler::bulk_create))
        .route("/workplace/room_schedule/upsert", put(handler::upsert))
        .route("/workplace/room_schedule/ensure", post(handler::ensure_defaults))
        .route(
            "/workplace/room_schedule/availability",
            get(handler::availability),
        )
        .route(
            "/workplace/room_schedule/{id}",
            get(handler::get_schedule)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/workplace/room_schedule/{id}/open", patch(handler::toggle_open))
}
