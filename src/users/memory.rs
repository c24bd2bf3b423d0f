use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{RepoError, UserStore},
    repo_types::{NewUser, User, UserChanges},
};

/// Store used by tests; mirrors the `users_email_key` constraint.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.email == new.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            age: new.age,
            address: new.address,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.rows.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<User, RepoError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn update_by_id(&self, id: Uuid, changes: UserChanges) -> Result<User, RepoError> {
        let mut rows = self.rows.write().await;
        if let Some(email) = &changes.email {
            if rows.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::DuplicateEmail);
            }
        }
        let user = rows.iter_mut().find(|u| u.id == id).ok_or(RepoError::NotFound)?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(age) = changes.age {
            user.age = age;
        }
        if let Some(address) = changes.address {
            user.address = address;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            name: "Ana".into(),
            age: 30,
            address: "Rua A, 1".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_first_row_kept() {
        let store = MemoryUserStore::new();
        let first = store.create(new_user("ana@example.com")).await.unwrap();
        let err = store.create(new_user("ana@example.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateEmail));

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store
            .update_by_id(Uuid::new_v4(), UserChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("ana@example.com")).await.unwrap();
        let updated = store
            .update_by_id(
                user.id,
                UserChanges {
                    age: Some(31),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.age, 31);
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.password_hash, user.password_hash);
    }
}
