use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::weather::client::ForecastResponse;

pub const DEFAULT_FORECAST_DAYS: u8 = 5;
pub const MAX_FORECAST_DAYS: u8 = 7;

/// One calendar day of the forecast in the city's local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: i64,
    pub weather_descriptions: Vec<String>,
    pub icon: Option<String>,
}

struct DayAcc {
    temp_min: f64,
    temp_max: f64,
    humidity_sum: i64,
    samples: i64,
    descriptions: Vec<String>,
    icon: Option<String>,
}

/// City offset reported by the provider; UTC when absent or out of range.
pub fn utc_offset(resp: &ForecastResponse) -> UtcOffset {
    let seconds = resp.city.as_ref().map_or(0, |c| c.timezone);
    i32::try_from(seconds)
        .ok()
        .and_then(|s| UtcOffset::from_whole_seconds(s).ok())
        .unwrap_or(UtcOffset::UTC)
}

fn format_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

/// Folds 3-hourly entries into per-day summaries for `window` days from `today`.
pub fn summarize(resp: &ForecastResponse, today: Date, window: u8) -> Vec<DailyForecast> {
    let offset = utc_offset(resp);
    let mut days: BTreeMap<Date, DayAcc> = BTreeMap::new();

    for entry in &resp.list {
        let Ok(at) = OffsetDateTime::from_unix_timestamp(entry.dt) else {
            warn!(dt = entry.dt, "forecast entry with unusable timestamp");
            continue;
        };
        let local = at.to_offset(offset);
        let date = local.date();
        if (date - today).whole_days() >= i64::from(window) {
            continue;
        }

        let acc = days.entry(date).or_insert_with(|| DayAcc {
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            humidity_sum: 0,
            samples: 0,
            descriptions: Vec::new(),
            icon: None,
        });
        acc.temp_min = acc.temp_min.min(entry.main.temp_min);
        acc.temp_max = acc.temp_max.max(entry.main.temp_max);
        acc.humidity_sum += entry.main.humidity;
        acc.samples += 1;

        if let Some(cond) = entry.weather.first() {
            if !acc.descriptions.contains(&cond.description) {
                acc.descriptions.push(cond.description.clone());
            }
            if acc.icon.is_none() && (12..15).contains(&local.hour()) && !cond.icon.is_empty() {
                acc.icon = Some(cond.icon.clone());
            }
        }
    }

    days.into_iter()
        .map(|(date, acc)| DailyForecast {
            date: format_date(date),
            temp_min: acc.temp_min,
            temp_max: acc.temp_max,
            humidity: acc.humidity_sum.div_euclid(acc.samples),
            weather_descriptions: acc.descriptions,
            icon: acc.icon,
        })
        .collect()
}
