use std::{sync::Arc, time::Duration};

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
    },
    config::AppConfig,
    db,
    products::repo::{PgProductStore, ProductStore},
    reports::repo::{PgReportStore, ReportStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserStore>,
    pub reports: Arc<dyn ReportStore>,
    pub products: Arc<dyn ProductStore>,
}

impl AppState {
    /// Connects to Postgres and wires the stores. The pool is returned too so
    /// the caller can run migrations before serving.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let pool = db::connect(&config.database_url, &config.db).await?;
        let timeout = Duration::from_secs(config.db.query_timeout_secs);

        let state = Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserStore::new(pool.clone(), timeout)),
            Arc::new(PgReportStore::new(pool.clone(), timeout)),
            Arc::new(PgProductStore::new(pool.clone(), timeout)),
        );
        Ok((state, pool))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        reports: Arc<dyn ReportStore>,
        products: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            config,
            users,
            reports,
            products,
        }
    }
}
