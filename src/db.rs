use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::DbConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate phone number")]
    DuplicatePhoneNumber,

    /// A guarded write found the row changed since it was read.
    #[error("record changed since it was read")]
    EditConflict,

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("row decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub async fn connect(database_url: &str, cfg: &DbConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .max_lifetime(Duration::from_secs(15))
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Runs one storage call under a deadline.
///
/// Timeouts are not retried; the caller's request fails.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(sqlx::Error::RowNotFound)) => Err(StoreError::NotFound),
        Ok(Err(e)) => Err(StoreError::Database(e)),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, sqlx::Error>(1)
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn bounded_maps_missing_rows() {
        let missing = async { Err::<i64, _>(sqlx::Error::RowNotFound) };
        let err = bounded(Duration::from_secs(1), missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
