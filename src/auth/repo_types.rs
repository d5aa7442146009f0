use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,         // lowercased
    pub password_hash: String, // Argon2 PHC string
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub created_at: OffsetDateTime,
}

/// Outstanding one-time email verification code.
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerification {
    pub email: String,
    pub code: String,
    pub expires_at: OffsetDateTime,
}

/// Registration data; the user row and its code are written together.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub code: String,
    pub code_expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    InvalidCode,
    UnknownUser,
}

/// Profile fields to overwrite; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
