use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod forecast;
pub mod handlers;
pub mod recommendation;

pub use client::{OpenWeatherClient, WeatherClient};

pub fn router() -> Router<AppState> {
    handlers::weather_routes()
}
