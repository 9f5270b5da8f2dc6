use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod repo;
pub mod service;
pub mod store;
pub mod ticket;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub fn session_router() -> Router<AppState> {
    handlers::session_routes()
}
