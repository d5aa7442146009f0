use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::WeatherConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenWeather 5-day / 3-hour forecast, reduced to the fields we summarise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix seconds, UTC.
    pub dt: i64,
    pub main: ForecastMain,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastMain {
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastCity {
    /// Shift from UTC in seconds.
    #[serde(default)]
    pub timezone: i64,
}

#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Current conditions, passed through as returned by the provider.
    async fn current(&self, city: &str) -> anyhow::Result<Value>;
    async fn forecast(&self, city: &str) -> anyhow::Result<ForecastResponse>;
}

pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build weather http client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch(&self, endpoint: &str, city: &str) -> anyhow::Result<reqwest::Response> {
        let key = self
            .api_key
            .as_deref()
            .context("WEATHER_API_KEY is not configured")?;
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, %city, "weather request");

        self.http
            .get(&url)
            .query(&[("q", city), ("units", "metric"), ("appid", key)])
            .send()
            .await
            .with_context(|| format!("request {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("{endpoint} answered with an error status"))
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn current(&self, city: &str) -> anyhow::Result<Value> {
        self.fetch("weather", city)
            .await?
            .json()
            .await
            .context("decode current weather")
    }

    async fn forecast(&self, city: &str) -> anyhow::Result<ForecastResponse> {
        self.fetch("forecast", city)
            .await?
            .json()
            .await
            .context("decode forecast")
    }
}
