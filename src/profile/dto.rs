use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{repo_types::{ProfileChanges, User}, services::sanitize_input};

/// Full profile of the signed-in user.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            location: u.location,
            bio: u.bio,
            avatar_url: u.avatar_url,
            email_verified: u.email_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> ProfileChanges {
        ProfileChanges {
            name: sanitize_input(self.name.as_deref()),
            location: sanitize_input(self.location.as_deref()),
            bio: sanitize_input(self.bio.as_deref()),
            avatar_url: sanitize_input(self.avatar_url.as_deref()),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProfileStats {
    pub saved_itineraries: i64,
    pub activities: i64,
    pub hours_explored: i64,
}

/// Each activity counts for an hour and a half, rounded half to even.
pub fn hours_explored(activities: i64) -> i64 {
    (activities as f64 * 1.5).round_ties_even() as i64
}
