//! Report status state machine.
//!
//! Admins may move a report to any status. `completed_at` is stamped the
//! first time a report enters `completed` and never rewritten afterwards,
//! even if the report leaves and re-enters that status.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Report;
use crate::validator::{permitted_value, Validator};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl ReportStatus {
    pub const ALL: [&'static str; 4] = ["pending", "in-progress", "completed", "rejected"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Completed => "completed",
            ReportStatus::Rejected => "rejected",
        }
    }

    /// No further move is expected in normal operation. Not enforced under
    /// [`TransitionPolicy::Permissive`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Rejected)
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "in-progress" => Ok(ReportStatus::InProgress),
            "completed" => Ok(ReportStatus::Completed),
            "rejected" => Ok(ReportStatus::Rejected),
            other => Err(format!("unknown report status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pothole,
    Streetlight,
    Water,
    Garbage,
    Road,
    Other,
}

impl Category {
    pub const ALL: [&'static str; 6] = ["pothole", "streetlight", "water", "garbage", "road", "other"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pothole => "pothole",
            Category::Streetlight => "streetlight",
            Category::Water => "water",
            Category::Garbage => "garbage",
            Category::Road => "road",
            Category::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pothole" => Ok(Category::Pothole),
            "streetlight" => Ok(Category::Streetlight),
            "water" => Ok(Category::Water),
            "garbage" => Ok(Category::Garbage),
            "road" => Ok(Category::Road),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown report category {other:?}")),
        }
    }
}

/// Which status moves an admin may make.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status to any status, including back to `pending`.
    #[default]
    Permissive,
    /// Terminal reports stay put and nothing returns to `pending`.
    Forward,
}

impl TransitionPolicy {
    pub fn allows(&self, from: ReportStatus, to: ReportStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Forward => {
                if from == to {
                    return true;
                }
                !from.is_terminal() && to != ReportStatus::Pending
            }
        }
    }
}

/// A validated status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ReportStatus,
    /// `None` keeps whatever image is already stored.
    pub after_image: Option<String>,
}

pub fn validate_status_change(v: &mut Validator, status: &str, after_image: &str) {
    v.check(!status.is_empty(), "status", "must be provided");
    v.check(permitted_value(status, &ReportStatus::ALL), "status", "invalid status");
    if status == ReportStatus::Completed.as_str() {
        v.check(
            !after_image.is_empty(),
            "after_image",
            "after image is required when marking as completed",
        );
    }
}

impl StatusChange {
    /// Runs the update rules; nothing here touches storage.
    pub fn parse(status: &str, after_image: &str) -> Result<Self, Validator> {
        let mut v = Validator::new();
        validate_status_change(&mut v, status, after_image);
        if !v.valid() {
            return Err(v);
        }
        let status = match status.parse() {
            Ok(s) => s,
            Err(_) => {
                v.add_error("status", "invalid status");
                return Err(v);
            }
        };
        let after_image = (!after_image.is_empty()).then(|| after_image.to_string());
        Ok(Self { status, after_image })
    }
}

impl Report {
    /// Applies a status change. Stores persist the resulting status fields
    /// as given.
    pub fn apply(&mut self, change: &StatusChange, now: OffsetDateTime) {
        self.status = change.status;
        if let Some(image) = &change.after_image {
            self.after_image = Some(image.clone());
        }
        if change.status == ReportStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
    }
}
