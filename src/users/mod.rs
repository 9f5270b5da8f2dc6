use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;

pub fn register_router() -> Router<AppState> {
    handlers::register_routes()
}

pub fn profile_router() -> Router<AppState> {
    handlers::profile_routes()
}
