use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence port for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, RepoError>;
    async fn find_all(&self) -> Result<Vec<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<User, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<User, RepoError>;
    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> Result<User, RepoError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique violations can only come from `users_email_key`.
fn map_write_error(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::DuplicateEmail,
        _ => RepoError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, age, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, age, address, created_at, updated_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.age)
        .bind(&new.address)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, address, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, address, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, age, address, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email         = COALESCE($2, email),
                   password_hash = COALESCE($3, password_hash),
                   name          = COALESCE($4, name),
                   age           = COALESCE($5, age),
                   address       = COALESCE($6, address),
                   updated_at    = now()
             WHERE id = $1
            RETURNING id, email, password_hash, name, age, address, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.name)
        .bind(changes.age)
        .bind(changes.address)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or(RepoError::NotFound)
    }
}
