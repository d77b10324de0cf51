//! Terminal rendering of the dashboard.
//!
//! `TerminalView` prints each surface update as it happens: connection
//! badges and task changes as timestamped lines, device snapshots as a
//! full table. Notifications go to stderr.

use std::io::{self, Write};

use tabled::Tabled;

use netdash_core::{
    Badge, DashboardView, Device, DeviceSummary, Notification, NotificationLevel,
    NotificationSink, TaskChange, TaskRow, Tone,
};

use crate::output::{paint, print_output, render_table};

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP Address")]
    ip_address: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Checked")]
    last_checked: String,
}

impl DeviceTableRow {
    fn new(d: &Device, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            ip_address: d.ip_address.clone(),
            status: paint(d.status.as_ref(), d.status.tone(), color),
            last_checked: d.last_checked_label().to_owned(),
        }
    }
}

#[derive(Tabled)]
struct TaskTableRow {
    #[tabled(rename = "Task")]
    id: String,
    #[tabled(rename = "Type")]
    task_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl TaskTableRow {
    fn new(t: &TaskRow, color: bool) -> Self {
        Self {
            id: t.task_id.to_string(),
            task_type: t.task_type.clone(),
            status: paint(t.status.as_str(), t.status.tone(), color),
            progress: t.progress_label(),
            created_at: t.created_at_label().to_owned(),
        }
    }
}

/// Render tasks in board order (newest first).
pub fn render_tasks<'a>(rows: impl Iterator<Item = &'a TaskRow>, color: bool) -> String {
    let rows: Vec<TaskTableRow> = rows.map(|t| TaskTableRow::new(t, color)).collect();
    render_table(&rows)
}

/// Status cells carry the device status tone.
pub fn render_devices(devices: &[Device], color: bool) -> String {
    let rows: Vec<DeviceTableRow> = devices.iter().map(|d| DeviceTableRow::new(d, color)).collect();
    render_table(&rows)
}

// ── View ────────────────────────────────────────────────────────────

pub struct TerminalView {
    color: bool,
    quiet: bool,
}

impl TerminalView {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }

    fn line(&self, text: &str) {
        print_output(&format!("[{}] {text}", timestamp()), self.quiet);
    }
}

impl DashboardView for TerminalView {
    fn connection_badge(&mut self, badge: &Badge) {
        let label = paint(&format!("● {}", badge.label), badge.tone, self.color);
        self.line(&format!("连接状态: {label}"));
    }

    fn device_summary(&mut self, summary: &DeviceSummary) {
        let online = paint(&summary.online.to_string(), Tone::Success, self.color);
        let offline = paint(&summary.offline.to_string(), Tone::Danger, self.color);
        let unknown = paint(&summary.unknown.to_string(), Tone::Warning, self.color);
        self.line(&format!(
            "设备: 在线 {online} · 离线 {offline} · 未知 {unknown} · 总计 {}",
            summary.total
        ));
    }

    fn device_table(&mut self, devices: &[Device]) {
        if devices.is_empty() {
            self.line("设备列表为空");
            return;
        }
        print_output(&render_devices(devices, self.color), self.quiet);
    }

    fn task_row(&mut self, change: &TaskChange) {
        self.line(&format_task_change(change, self.color));
    }
}

/// One task line. Inserts also show the creation time, which later
/// updates never change.
fn format_task_change(change: &TaskChange, color: bool) -> String {
    let (marker, row) = match change {
        TaskChange::Inserted(row) => ("+", row),
        TaskChange::Updated(row) => ("~", row),
    };
    let status = paint(row.status.as_str(), row.status.tone(), color);
    let mut text = format!(
        "{marker} 任务 #{} {} {status} {}",
        row.task_id,
        row.task_type,
        row.progress_label()
    );
    if let TaskChange::Inserted(_) = change {
        text.push_str(&format!(" @ {}", row.created_at_label()));
    }
    if let Some(ref message) = row.message {
        text.push_str(&format!(" ({message})"));
    }
    text
}

// ── Notifications ───────────────────────────────────────────────────

pub struct TerminalNotifier {
    color: bool,
}

impl TerminalNotifier {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn format(&self, notification: &Notification) -> String {
        let (icon, tone) = match notification.level {
            NotificationLevel::Success => ("✓", Tone::Success),
            NotificationLevel::Info => ("ℹ", Tone::Info),
            NotificationLevel::Warning => ("!", Tone::Warning),
            NotificationLevel::Error => ("✗", Tone::Danger),
        };
        paint(&format!("{icon} {}", notification.message), tone, self.color)
    }
}

impl NotificationSink for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", self.format(&notification));
    }
}
