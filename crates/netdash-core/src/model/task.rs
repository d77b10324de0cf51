// ── Task domain types ──

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use super::id::RecordId;
use super::lenient;
use crate::view::Tone;

/// Rendered in place of a missing `created_at` timestamp.
pub const NO_TIMESTAMP: &str = "-";

/// Lifecycle state of a background task.
///
/// The set is open: statuses the client does not recognize are carried
/// verbatim in `Other` and rendered with a neutral tone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TaskStatus {
    Pending,
    PendingApproval,
    InProgress,
    Completed,
    Failed,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::PendingApproval => "pending_approval",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Completed => Tone::Success,
            Self::InProgress => Tone::Primary,
            Self::Pending => Tone::Info,
            Self::Failed => Tone::Danger,
            Self::PendingApproval => Tone::Warning,
            Self::Other(_) => Tone::Secondary,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Option<String>> for TaskStatus {
    fn from(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match raw.as_str() {
            "pending" => Self::Pending,
            "pending_approval" => Self::PendingApproval,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        Self::from(Some(raw.to_owned()))
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// Reported completion percentage, kept exactly as the server sent it
/// (fractions and out-of-range values included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Progress(Number);

impl Default for Progress {
    fn default() -> Self {
        Self(Number::from(0_u64))
    }
}

impl From<i64> for Progress {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn lenient_progress<'de, D: Deserializer<'de>>(de: D) -> Result<Progress, D::Error> {
    lenient::number(de).map(Progress)
}

/// A task id of an unusable shape counts as missing.
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<RecordId>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(de)?;
    Ok(raw.and_then(|value| RecordId::deserialize(value).ok()))
}

fn lenient_status<'de, D: Deserializer<'de>>(de: D) -> Result<TaskStatus, D::Error> {
    lenient::opt_string(de).map(TaskStatus::from)
}

/// A `task_status_update` payload.
///
/// Only `task_id` is needed to place an update; every other field falls
/// back to its default when missing, null or of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, deserialize_with = "lenient_id")]
    pub task_id: Option<RecordId>,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub task_type: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: Progress,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
}

/// One row of the task table.
///
/// Type and creation time are fixed when the row is first seen; later
/// updates only move status, progress and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub task_id: RecordId,
    pub task_type: String,
    pub status: TaskStatus,
    pub progress: Progress,
    pub message: Option<String>,
    pub created_at: Option<String>,
}

impl TaskRow {
    pub fn progress_label(&self) -> String {
        format!("{}%", self.progress)
    }

    pub fn created_at_label(&self) -> &str {
        self.created_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_TIMESTAMP)
    }
}
