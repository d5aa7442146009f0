use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod loader;
pub mod search;

pub use loader::{Catalog, Listing};

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
