use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // assigned by the store
    pub email: String,              // unique, normalized
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, never exposed
    pub name: String,
    pub age: i32,
    pub address: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a new row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub address: String,
}

/// Partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
}
