use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        repo_types::{NewUser, User, UserChanges},
    },
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases, then checks the shape. Stored emails are always normalized.
pub(crate) fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn check_age(age: i32) -> Result<(), AppError> {
    if age < 0 {
        return Err(AppError::Validation("age must not be negative".into()));
    }
    Ok(())
}

/// Path identifiers are UUIDs; anything else is rejected before reaching the store.
pub(crate) fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidIdentifier)
}

pub async fn register(state: &AppState, req: CreateUserRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email)?;
    check_password(&req.password)?;
    check_age(req.age)?;

    let password_hash = state.passwords.hash_blocking(req.password).await?;
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            name: req.name,
            age: req.age,
            address: req.address,
        })
        .await?;
    Ok(user)
}

pub async fn list(state: &AppState) -> Result<Vec<User>, AppError> {
    Ok(state.users.find_all().await?)
}

pub async fn get(state: &AppState, id: Uuid) -> Result<User, AppError> {
    Ok(state.users.find_by_id(id).await?)
}

/// Applies a partial update. A supplied password is hashed here; the store only
/// ever sees the replacement hash.
pub async fn update(state: &AppState, id: Uuid, req: UpdateUserRequest) -> Result<User, AppError> {
    let email = req.email.as_deref().map(normalize_email).transpose()?;
    if let Some(age) = req.age {
        check_age(age)?;
    }
    // An empty `senha` means "keep the current password".
    let password_hash = match req.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            check_password(&password)?;
            Some(state.passwords.hash_blocking(password).await?)
        }
        None => None,
    };

    let user = state
        .users
        .update_by_id(
            id,
            UserChanges {
                email,
                password_hash,
                name: req.name,
                age: req.age,
                address: req.address,
            },
        )
        .await?;
    Ok(user)
}
