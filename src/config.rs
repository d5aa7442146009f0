use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub weather: WeatherConfig,
    /// Directory holding places.json, restaurants.json and itinerary_template.json.
    pub data_dir: PathBuf,
    /// Built frontend; served with an index.html fallback when set.
    pub static_dir: Option<PathBuf>,
    pub verification_ttl_minutes: i64,
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "travel-planner".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "travel-planner-users".into()),
            ttl_minutes: env_i64("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_i64("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let weather = WeatherConfig {
            api_key: std::env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".into()),
        };
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        Ok(Self {
            database_url,
            jwt,
            weather,
            data_dir,
            static_dir,
            verification_ttl_minutes: env_i64("VERIFICATION_TTL_MINUTES", 30),
        })
    }
}
