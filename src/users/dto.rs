use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

/// Request body for account registration.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idade")]
    pub age: i32,
    #[serde(rename = "endereço", alias = "endereco")]
    pub address: String,
}

/// Request body for a partial update. Absent fields are left unchanged.
#[derive(Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    #[serde(rename = "senha")]
    pub password: Option<String>,
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "idade")]
    pub age: Option<i32>,
    #[serde(rename = "endereço", alias = "endereco")]
    pub address: Option<String>,
}

// Passwords never reach the logs.
impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("address", &self.address)
            .finish()
    }
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("age", &self.age)
            .field("address", &self.address)
            .finish()
    }
}

/// Outbound representation of a user. Has no password field at all.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "idade")]
    pub age: i32,
    #[serde(rename = "endereço")]
    pub address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            age: u.age,
            address: u.address,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
