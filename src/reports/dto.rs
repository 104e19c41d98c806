use serde::Deserialize;

use super::repo_types::Page;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub before_image: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub after_image: String,
}

/// Raw query string. Kept as strings so bad paging values fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> Page {
        let limit = self
            .limit
            .as_deref()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = self
            .offset
            .as_deref()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);
        Page { limit, offset }
    }
}
