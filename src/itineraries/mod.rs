use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod generator;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod shaper;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::itinerary_routes())
        .merge(handlers::generate_routes())
}
