mod handler;
pub(crate) mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub use model::Room;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/workplace/department",
            get(handler::list_departments).post(handler::create_department),
        )
        .route(
            "/workplace/department/{id}",
            get(handler::get_department)
                .put(handler::update_department)
                .delete(handler::delete_department),
        )
        .route(
            "/workplace/building",
            get(handler::list_buildings).post(handler::create_building),
        )
        .route(
            "/workplace/building/{id}",
            get(handler::get_building)
                .put(handler::update_building)
                .delete(handler::delete_building),
        )
        .route(
            "/workplace/floor",
            get(handler::list_floors).post(handler::create_floor),
        )
        .route(
            "/workplace/floor/{id}",
            get(handler::get_floor)
                .put(handler::update_floor)
                .delete(handler::delete_floor),
        )
        .route(
            "/workplace/room",
            get(handler::list_rooms).post(handler::create_room),
        )
        .route(
            "/workplace/room/{id}",
            get(handler::get_room)
                .put(handler::update_room)
                .delete(handler::delete_room),
        )
}
