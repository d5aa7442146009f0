use crate::error::AppError;
use crate::itineraries::dto::{Activity, Day};
use crate::itineraries::repo_types::Pace;

/// Builds a draft itinerary: every day gets the same leading slice of the
/// template, sized by `pace` and clamped to the template length.
pub fn generate(day_count: i64, pace: Pace, template: &[Activity]) -> Result<Vec<Day>, AppError> {
    if day_count < 1 {
        return Err(AppError::validation("days must be at least 1"));
    }
    let day_count = i32::try_from(day_count)
        .map_err(|_| AppError::validation("days is out of range"))?;
    if template.is_empty() {
        return Err(AppError::validation("itinerary template has no activities"));
    }

    let take = pace.activities_per_day().min(template.len());
    let slice = &template[..take];

    Ok((1..=day_count)
        .map(|day| Day {
            day,
            activities: slice.to_vec(),
        })
        .collect())
}
