use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    password::Password,
    repo_types::{User, UserRow},
};
use crate::db::{bounded, StoreError};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `DuplicatePhoneNumber` when the number is taken.
    async fn insert(&self, name: &str, phone_number: &str, password: &Password)
        -> Result<User, StoreError>;

    async fn get_by_phone(&self, phone_number: &str) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        name: &str,
        phone_number: &str,
        password: &Password,
    ) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, phone_number, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, phone_number, password_hash, role, created_at
            "#,
        )
        .bind(name)
        .bind(phone_number)
        .bind(password.hash())
        .fetch_one(&self.db);

        match bounded(self.timeout, query).await {
            Ok(row) => row.try_into(),
            Err(StoreError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(StoreError::DuplicatePhoneNumber)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_by_phone(&self, phone_number: &str) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, phone_number, password_hash, role, created_at
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_one(&self.db);

        bounded(self.timeout, query).await?.try_into()
    }
}
