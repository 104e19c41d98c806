//! In-memory stores and request helpers for router-level tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

use crate::{
    auth::{
        claims::Role,
        password::Password,
        repo::UserStore,
        repo_types::User,
    },
    config::{AppConfig, DbConfig, JwtConfig},
    db::StoreError,
    products::{
        repo::ProductStore,
        repo_types::{Product, ProductFields},
    },
    reports::{
        lifecycle::{ReportStatus, TransitionPolicy},
        repo::{ReportStore, LEADERBOARD_SIZE},
        repo_types::{LeaderboardEntry, NewReport, Page, Report, ReportFilter, ReportStats},
    },
    state::AppState,
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(
        &self,
        name: &str,
        phone_number: &str,
        password: &Password,
    ) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone_number == phone_number) {
            return Err(StoreError::DuplicatePhoneNumber);
        }
        let user = User {
            id: users.len() as i64 + 1,
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            password: password.clone(),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_phone(&self, phone_number: &str) -> Result<User, StoreError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.phone_number == phone_number)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// Counts every trait call so tests can assert that validation failures
/// never reach storage.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
    calls: AtomicUsize,
}

impl MemoryReportStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn page(found: impl Iterator<Item = Report>, page: Page) -> Vec<Report> {
        found
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, new: &NewReport) -> Result<Report, StoreError> {
        self.touch();
        let mut reports = self.reports.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let report = Report {
            id: reports.len() as i64 + 1,
            user_id: new.user_id,
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category,
            location: new.location.clone(),
            before_image: new.before_image.clone(),
            after_image: None,
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
            user_name: None,
        };
        reports.push(report.clone());
        Ok(report)
    }

    async fn get(&self, id: i64) -> Result<Report, StoreError> {
        self.touch();
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ReportFilter, page: Page) -> Result<Vec<Report>, StoreError> {
        self.touch();
        let reports = self.reports.lock().unwrap();
        let found = reports
            .iter()
            .rev()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.category.map_or(true, |c| r.category == c))
            .cloned();
        Ok(Self::page(found, page))
    }

    async fn list_by_user(&self, user_id: i64, page: Page) -> Result<Vec<Report>, StoreError> {
        self.touch();
        let reports = self.reports.lock().unwrap();
        let found = reports.iter().rev().filter(|r| r.user_id == user_id).cloned();
        Ok(Self::page(found, page))
    }

    async fn update_status(&self, current: &Report, next: &Report) -> Result<(), StoreError> {
        self.touch();
        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .iter_mut()
            .find(|r| {
                r.id == current.id
                    && r.status == current.status
                    && r.completed_at == current.completed_at
            })
            .ok_or(StoreError::EditConflict)?;
        report.status = next.status;
        report.after_image = next.after_image.clone();
        report.completed_at = next.completed_at;
        report.updated_at = next.updated_at;
        Ok(())
    }

    async fn stats(&self) -> Result<ReportStats, StoreError> {
        self.touch();
        let reports = self.reports.lock().unwrap();
        let count = |status: ReportStatus| reports.iter().filter(|r| r.status == status).count() as i64;
        Ok(ReportStats {
            total_reports: reports.len() as i64,
            pending_reports: count(ReportStatus::Pending),
            in_progress_reports: count(ReportStatus::InProgress),
            completed_reports: count(ReportStatus::Completed),
            rejected_reports: count(ReportStatus::Rejected),
        })
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.touch();
        let reports = self.reports.lock().unwrap();
        let mut entries: Vec<LeaderboardEntry> = Vec::new();
        for r in reports.iter() {
            match entries.iter_mut().find(|e| e.user_id == r.user_id) {
                Some(e) => e.report_count += 1,
                None => entries.push(LeaderboardEntry {
                    user_id: r.user_id,
                    user_name: format!("user-{}", r.user_id),
                    phone_number: format!("{:010}", r.user_id),
                    report_count: 1,
                }),
            }
        }
        entries.sort_by(|a, b| b.report_count.cmp(&a.report_count).then(a.user_id.cmp(&b.user_id)));
        entries.truncate(LEADERBOARD_SIZE as usize);
        Ok(entries)
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, fields: &ProductFields) -> Result<Product, StoreError> {
        let mut products = self.products.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: products.len() as i64 + 1,
            name: fields.name.clone(),
            description: fields.description.clone(),
            price: fields.price,
            stock_available: fields.stock_available,
            image_url: fields.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());
        Ok(product)
    }

    async fn get(&self, id: i64) -> Result<Product, StoreError> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: i64, fields: &ProductFields) -> Result<Product, StoreError> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        product.name = fields.name.clone();
        product.description = fields.description.clone();
        product.price = fields.price;
        product.stock_available = fields.stock_available;
        product.image_url = fields.image_url.clone();
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: "test".into(),
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "postgres://localhost/citystars_test".into(),
        jwt: JwtConfig {
            secret: "test-secret-with-enough-entropy".into(),
            ttl_hours: 24,
        },
        db: DbConfig {
            max_connections: 1,
            query_timeout_secs: 1,
        },
        transition_policy: TransitionPolicy::Permissive,
    }
}

pub fn fake_state() -> AppState {
    let config = Arc::new(test_config());
    AppState::from_parts(
        config,
        Arc::new(MemoryUserStore::default()),
        Arc::new(MemoryReportStore::default()),
        Arc::new(MemoryProductStore::default()),
    )
}

pub fn token_for(state: &AppState, user_id: i64, role: Role) -> String {
    state
        .jwt
        .issue_authentication(user_id, role)
        .expect("token issued")
        .signed
}

/// Sends one request through the router and decodes the JSON body
/// (`Value::Null` when the body is empty).
pub async fn call(
    router: &Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request built");

    let res = router.clone().oneshot(req).await.expect("router responded");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body read");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
