use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::error::AppError;
use crate::itineraries::repo_types::{Itinerary, Pace};

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// Activity in its nested wire form. `description` and `category` are
/// never null on output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub time: String,
    pub title: String,
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub day: i32,
    pub activities: Vec<Activity>,
}

/// Client-supplied activity; required fields are checked when flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityInput {
    pub time: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayInput {
    pub day: i32,
    #[serde(default)]
    pub activities: Vec<ActivityInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryInput {
    pub title: String,
    pub days: i32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub pace: Pace,
    pub budget: Option<String>,
    pub interests: Option<Vec<String>>,
    pub transportation: Option<String>,
    #[serde(default = "default_true")]
    pub include_food: bool,
}

impl ItineraryInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
        if self.days < 1 {
            return Err(AppError::validation("days must be at least 1"));
        }
        Ok(())
    }
}

/// Body of POST/PUT /itineraries.
#[derive(Debug, Deserialize)]
pub struct SaveItineraryRequest {
    pub details: ItineraryInput,
    #[serde(default)]
    pub days: Vec<DayInput>,
}

#[derive(Debug, Serialize)]
pub struct ItineraryDetail {
    pub details: Itinerary,
    pub days: Vec<Day>,
}

fn default_generate_days() -> i64 {
    3
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_generate_days")]
    pub days: i64,
    #[serde(default)]
    pub pace: Pace,
    // Accepted but not used for selection yet.
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_nulls_become_empty() {
        let a: Activity = serde_json::from_str(
            r#"{"time":"09:00","title":"Walk","location":"Park","description":null,"image":null}"#,
        )
        .unwrap();
        assert_eq!(a.description, "");
        assert_eq!(a.category, "");
        assert_eq!(a.image, None);

        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["description"], "");
        assert_eq!(json["category"], "");
        assert!(json["image"].is_null());
    }

    #[test]
    fn itinerary_input_defaults_and_validation() {
        let input: ItineraryInput =
            serde_json::from_str(r#"{"title":"Mumbai","days":2}"#).unwrap();
        assert!(input.include_food);
        assert_eq!(input.pace, Pace::Moderate);
        assert!(input.start_date.is_none());
        assert!(input.validate().is_ok());

        let input: ItineraryInput = serde_json::from_str(
            r#"{"title":"Mumbai","days":0,"start_date":"2025-03-01T00:00:00Z","pace":"relaxed"}"#,
        )
        .unwrap();
        assert!(input.start_date.is_some());
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let input: ItineraryInput = serde_json::from_str(r#"{"title":"  ","days":1}"#).unwrap();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn generate_request_defaults() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.days, 3);
        assert_eq!(req.pace, Pace::Moderate);
        assert!(req.interests.is_empty());
    }

    #[test]
    fn generate_request_tolerates_null_interests() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"days": 2, "interests": null}"#).unwrap();
        assert_eq!(req.days, 2);
        assert!(req.interests.is_empty());
    }
}
