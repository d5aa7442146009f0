use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::{
    error::AppError,
    extract::AppQuery,
    state::AppState,
    weather::{
        forecast::{summarize, utc_offset, DailyForecast, DEFAULT_FORECAST_DAYS, MAX_FORECAST_DAYS},
        recommendation::{recommend, Recommendation},
    },
};

pub fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/weather", get(current_weather))
        .route("/weather/forecast", get(weather_forecast))
        .route("/weather/recommendation", get(weather_recommendation))
}

#[derive(Debug, Deserialize)]
pub struct CityParams {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub city: Option<String>,
    pub days: Option<i64>,
}

fn required_city(city: Option<&str>) -> Result<&str, AppError> {
    city.map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::validation("City parameter is required"))
}

fn upstream(e: anyhow::Error) -> AppError {
    AppError::Upstream(format!("{e:#}"))
}

#[instrument(skip(state))]
pub async fn current_weather(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CityParams>,
) -> Result<Json<Value>, AppError> {
    let city = required_city(params.city.as_deref())?;
    let data = state.weather.current(city).await.map_err(upstream)?;
    Ok(Json(data))
}

#[instrument(skip(state))]
pub async fn weather_forecast(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ForecastParams>,
) -> Result<Json<Vec<DailyForecast>>, AppError> {
    let city = required_city(params.city.as_deref())?;
    let days = params.days.unwrap_or(i64::from(DEFAULT_FORECAST_DAYS));
    let window = u8::try_from(days)
        .ok()
        .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
        .ok_or_else(|| {
            AppError::validation(format!(
                "Days parameter must be between 1 and {MAX_FORECAST_DAYS}"
            ))
        })?;

    let raw = state.weather.forecast(city).await.map_err(upstream)?;
    let today = OffsetDateTime::now_utc().to_offset(utc_offset(&raw)).date();
    let summary = summarize(&raw, today, window);
    debug!(%city, window, entries = raw.list.len(), days = summary.len(), "forecast summarised");
    Ok(Json(summary))
}

#[instrument(skip(state))]
pub async fn weather_recommendation(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CityParams>,
) -> Result<Json<Recommendation>, AppError> {
    let city = required_city(params.city.as_deref())?;
    let data = state.weather.current(city).await.map_err(upstream)?;

    let temperature = data["main"]["temp"].as_f64();
    let condition = &data["weather"][0];
    let (Some(temperature), Some(id)) = (temperature, condition["id"].as_i64()) else {
        return Err(AppError::Upstream(
            "current weather payload lacks temperature or condition".into(),
        ));
    };
    let main = condition["main"].as_str().unwrap_or_default();

    Ok(Json(recommend(temperature, id, main)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let app = weather_routes().with_state(AppState::fake());
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn city_is_required() {
        for uri in ["/weather", "/weather?city=%20", "/weather/forecast", "/weather/recommendation"] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["message"], "City parameter is required");
        }
    }

    #[tokio::test]
    async fn current_is_passed_through() {
        let (status, body) = get_json("/weather?city=Navi%20Mumbai").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Navi Mumbai");
    }

    #[tokio::test]
    async fn forecast_respects_day_window() {
        let (status, body) = get_json("/weather/forecast?city=Pune&days=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = get_json("/weather/forecast?city=Pune").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn forecast_rejects_out_of_range_days() {
        for days in ["0", "8", "-1"] {
            let (status, _) = get_json(&format!("/weather/forecast?city=Pune&days={days}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (status, body) = get_json("/weather/forecast?city=Pune&days=three").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn recommendation_from_current_conditions() {
        let (status, body) = get_json("/weather/recommendation?city=Pune").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weather"], "Clear");
        assert_eq!(body["recommendation"], "Perfect weather for exploring outdoors!");
    }

    #[tokio::test]
    async fn provider_failures_are_bad_gateway() {
        let (status, body) = get_json("/weather?city=Atlantis").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["message"].as_str().unwrap().contains("city not found"));
    }
}
