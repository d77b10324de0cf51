// ── Task board ──
//
// Incremental upsert keyed by task id. New tasks go to the top of the
// table; known tasks change in place without moving.

use indexmap::IndexMap;
use tracing::warn;

use crate::model::{RecordId, TaskRow, TaskStatus, TaskUpdate};
use crate::notify::Notification;
use crate::view::TaskChange;

#[derive(Debug, Default)]
pub struct TaskBoard {
    rows: IndexMap<RecordId, TaskRow>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&TaskRow> {
        self.rows.get(id)
    }

    /// Rows, most recently inserted first.
    pub fn rows(&self) -> impl Iterator<Item = &TaskRow> {
        self.rows.values()
    }

    /// Upsert one task update.
    ///
    /// Updates without a task id cannot be placed and are dropped.
    pub fn apply(&mut self, update: TaskUpdate) -> Option<TaskChange> {
        let Some(task_id) = update.task_id else {
            warn!(status = %update.status, "task update without task_id dropped");
            return None;
        };

        if let Some(row) = self.rows.get_mut(&task_id) {
            row.status = update.status;
            row.progress = update.progress;
            row.message = update.message;
            return Some(TaskChange::Updated(row.clone()));
        }

        let row = TaskRow {
            task_id: task_id.clone(),
            task_type: update.task_type,
            status: update.status,
            progress: update.progress,
            message: update.message,
            created_at: update.created_at,
        };
        self.rows.shift_insert(0, task_id, row.clone());
        Some(TaskChange::Inserted(row))
    }
}

/// Notification raised by a task reaching a terminal status.
///
/// Fires on every update carrying `completed`/`failed`, including repeats.
pub fn task_notification(row: &TaskRow) -> Option<Notification> {
    match row.status {
        TaskStatus::Completed => Some(Notification::success(format!(
            "任务 #{} 已完成",
            row.task_id
        ))),
        TaskStatus::Failed => {
            let text = match row.message.as_deref() {
                Some(message) => format!("任务 #{} 失败: {message}", row.task_id),
                None => format!("任务 #{} 失败", row.task_id),
            };
            Some(Notification::error(text))
        }
        _ => None,
    }
}
