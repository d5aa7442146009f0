use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Activity density of an itinerary. Unknown strings read as `Moderate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Pace {
    Relaxed,
    #[default]
    Moderate,
    Intensive,
}

impl Pace {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" => Self::Relaxed,
            "intensive" => Self::Intensive,
            _ => Self::Moderate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relaxed => "relaxed",
            Self::Moderate => "moderate",
            Self::Intensive => "intensive",
        }
    }

    pub fn activities_per_day(self) -> usize {
        match self {
            Self::Relaxed => 2,
            Self::Moderate => 3,
            Self::Intensive => 4,
        }
    }
}

impl From<String> for Pace {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// Row of the `itineraries` table.
#[derive(Debug, Clone, FromRow)]
pub struct ItineraryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub days: i32,
    pub start_date: Option<OffsetDateTime>,
    pub pace: String,
    pub budget: Option<String>,
    pub interests: Option<Vec<String>>,
    pub transportation: Option<String>,
    pub include_food: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub days: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    pub pace: Pace,
    pub budget: Option<String>,
    pub interests: Option<Vec<String>>,
    pub transportation: Option<String>,
    pub include_food: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ItineraryRow> for Itinerary {
    fn from(r: ItineraryRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            days: r.days,
            start_date: r.start_date,
            pace: Pace::parse(&r.pace),
            budget: r.budget,
            interests: r.interests,
            transportation: r.transportation,
            include_food: r.include_food,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Flat activity as stored in `itinerary_activities`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ActivityRecord {
    pub itinerary_id: Uuid,
    pub day: i32,
    pub time: String,
    pub title: String,
    pub location: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
}

/// Per-user totals for the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItineraryCounts {
    pub itineraries: i64,
    pub activities: i64,
}
