//! Conversion between stored activity rows and the nested day structure
//! returned to clients.
//!
//! Activities within a day are ordered by the raw `time` string compared
//! byte-wise, so `"10:00 AM"` sorts before `"9:00 AM"`. Stored data relies on
//! that ordering; do not switch to clock-time parsing here.

use uuid::Uuid;

use crate::error::AppError;
use crate::itineraries::dto::{Activity, ActivityInput, Day, DayInput};
use crate::itineraries::repo_types::ActivityRecord;

impl From<&ActivityRecord> for Activity {
    fn from(r: &ActivityRecord) -> Self {
        Self {
            time: r.time.clone(),
            title: r.title.clone(),
            location: r.location.clone(),
            description: r.description.clone().unwrap_or_default(),
            image: r.image.clone(),
            category: r.category.clone().unwrap_or_default(),
        }
    }
}

/// Groups flat activities into days, sorted by day then by `time`.
/// Days without activities are not emitted.
pub fn to_nested(activities: &[ActivityRecord]) -> Vec<Day> {
    let mut sorted: Vec<&ActivityRecord> = activities.iter().collect();
    sorted.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.time.cmp(&b.time)));

    let mut days: Vec<Day> = Vec::new();
    for record in sorted {
        match days.last_mut() {
            Some(current) if current.day == record.day => {
                current.activities.push(Activity::from(record))
            }
            _ => days.push(Day {
                day: record.day,
                activities: vec![Activity::from(record)],
            }),
        }
    }
    days
}

fn required(value: &Option<String>, field: &str, day: i32, index: usize) -> Result<String, AppError> {
    value.clone().ok_or_else(|| {
        AppError::validation(format!(
            "day {day}, activity {}: missing required field `{field}`",
            index + 1
        ))
    })
}

fn flatten_one(
    itinerary_id: Uuid,
    day: i32,
    index: usize,
    input: &ActivityInput,
) -> Result<ActivityRecord, AppError> {
    Ok(ActivityRecord {
        itinerary_id,
        day,
        time: required(&input.time, "time", day, index)?,
        title: required(&input.title, "title", day, index)?,
        location: required(&input.location, "location", day, index)?,
        description: input.description.clone(),
        image: input.image.clone(),
        category: input.category.clone(),
    })
}

/// Flattens nested days into records tagged with `itinerary_id`.
///
/// Fails as a whole if any activity lacks `time`, `title` or `location`.
/// Repeated day numbers are not merged.
pub fn to_flat(itinerary_id: Uuid, days: &[DayInput]) -> Result<Vec<ActivityRecord>, AppError> {
    days.iter()
        .flat_map(|d| {
            d.activities
                .iter()
                .enumerate()
                .map(move |(i, a)| flatten_one(itinerary_id, d.day, i, a))
        })
        .collect()
}

/// Rejects activities scheduled outside `1..=day_count`.
pub fn check_day_bounds(records: &[ActivityRecord], day_count: i32) -> Result<(), AppError> {
    match records.iter().find(|r| r.day < 1 || r.day > day_count) {
        Some(r) => Err(AppError::validation(format!(
            "activity `{}` is on day {}, itinerary has {} day(s)",
            r.title, r.day, day_count
        ))),
        None => Ok(()),
    }
}
