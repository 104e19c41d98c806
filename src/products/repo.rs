use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Product, ProductFields, ProductRow};
use crate::db::{bounded, StoreError};

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, fields: &ProductFields) -> Result<Product, StoreError>;

    async fn get(&self, id: i64) -> Result<Product, StoreError>;

    /// Replaces every writable field. `NotFound` when no product has this id.
    async fn update(&self, id: i64, fields: &ProductFields) -> Result<Product, StoreError>;
}

#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
    timeout: Duration,
}

impl PgProductStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, fields: &ProductFields) -> Result<Product, StoreError> {
        let query = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, description, price, stock_available, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, stock_available, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.stock_available)
        .bind(&fields.image_url)
        .fetch_one(&self.db);

        Ok(bounded(self.timeout, query).await?.into())
    }

    async fn get(&self, id: i64) -> Result<Product, StoreError> {
        let query = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, price, stock_available, image_url,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db);

        Ok(bounded(self.timeout, query).await?.into())
    }

    async fn update(&self, id: i64, fields: &ProductFields) -> Result<Product, StoreError> {
        let query = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3,
                stock_available = $4, image_url = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING id, name, description, price, stock_available, image_url,
                      created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.stock_available)
        .bind(&fields.image_url)
        .bind(id)
        .fetch_one(&self.db);

        Ok(bounded(self.timeout, query).await?.into())
    }
}
