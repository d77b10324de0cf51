// End-to-end reconciliation scenarios: channel payloads in, view calls and
// notifications out.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use netdash_core::connection::{LABEL_CONNECTED, LABEL_CONNECTING, LABEL_DISCONNECTED, LABEL_UNAVAILABLE};
use netdash_core::form::{BUTTON_BUSY_LABEL, BUTTON_IDLE_LABEL, GENERIC_FAILURE};
use netdash_core::{
    Badge, ChannelEvent, Dashboard, DashboardEvent, DashboardView, Device, DeviceSummary,
    DhcpForm, DhcpRequest, EventChannel, Notification, NotificationLevel, Progress, RecordId,
    RecordingSink, SubmitButton, SubmitFailure, SubmitReceipt, Submitter, TaskChange, TaskStatus,
    Tone, bridge_channel, event_channel,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::{Notify, broadcast, mpsc};
use tokio_util::sync::CancellationToken;

// ── Test doubles ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ViewCall {
    Badge(Badge),
    Summary(DeviceSummary),
    Table(Vec<Device>),
    Task(TaskChange),
    Button(SubmitButton),
    FormReset,
}

#[derive(Debug, Default)]
struct RecordingView {
    calls: Vec<ViewCall>,
}

impl RecordingView {
    fn tables(&self) -> Vec<&Vec<Device>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn badges(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ViewCall::Badge(b) => Some(b.label.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DashboardView for RecordingView {
    fn connection_badge(&mut self, badge: &Badge) {
        self.calls.push(ViewCall::Badge(badge.clone()));
    }

    fn device_summary(&mut self, summary: &DeviceSummary) {
        self.calls.push(ViewCall::Summary(*summary));
    }

    fn device_table(&mut self, devices: &[Device]) {
        self.calls.push(ViewCall::Table(devices.to_vec()));
    }

    fn task_row(&mut self, change: &TaskChange) {
        self.calls.push(ViewCall::Task(change.clone()));
    }

    fn submit_button(&mut self, button: &SubmitButton) {
        self.calls.push(ViewCall::Button(button.clone()));
    }

    fn form_reset(&mut self) {
        self.calls.push(ViewCall::FormReset);
    }
}

#[derive(Clone)]
struct FakeSubmitter {
    outcome: Result<SubmitReceipt, SubmitFailure>,
    calls: Arc<Mutex<Vec<DhcpRequest>>>,
    gate: Option<Arc<Notify>>,
}

impl FakeSubmitter {
    fn answering(outcome: Result<SubmitReceipt, SubmitFailure>) -> Self {
        Self {
            outcome,
            calls: Arc::default(),
            gate: None,
        }
    }
}

impl Submitter for FakeSubmitter {
    async fn submit(&self, request: DhcpRequest) -> Result<SubmitReceipt, SubmitFailure> {
        self.calls.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome.clone()
    }
}

struct FakeChannel {
    events: broadcast::Sender<Arc<ChannelEvent>>,
    emitted: Mutex<Vec<String>>,
}

impl EventChannel for FakeChannel {
    fn subscribe(&self) -> broadcast::Receiver<Arc<ChannelEvent>> {
        self.events.subscribe()
    }

    fn emit(&self, name: &str, _payload: Value) {
        self.emitted.lock().unwrap().push(name.to_owned());
    }
}

fn receipt(task_id: &str) -> Result<SubmitReceipt, SubmitFailure> {
    Ok(SubmitReceipt {
        task_id: task_id.into(),
    })
}

fn dashboard(
    submitter: FakeSubmitter,
) -> (
    Dashboard<RecordingView, RecordingSink, FakeSubmitter>,
    RecordingSink,
    mpsc::Sender<DashboardEvent>,
    mpsc::Receiver<DashboardEvent>,
) {
    let (tx, rx) = event_channel();
    let sink = RecordingSink::new();
    let dash = Dashboard::new(RecordingView::default(), sink.clone(), submitter, &tx);
    (dash, sink, tx, rx)
}

fn channel_message(name: &str, payload: Value) -> DashboardEvent {
    DashboardEvent::from_channel(&ChannelEvent::Message {
        name: name.into(),
        payload,
    })
    .unwrap()
}

fn filled_form() -> DhcpForm {
    DhcpForm {
        device_ids: "1,2".into(),
        pool_name: "office".into(),
        network: "10.1.2.0".into(),
        mask: "255.255.255.0".into(),
        gateway: "10.1.2.1".into(),
        dns: "8.8.8.8".into(),
        domain: "corp.local".into(),
        lease_days: "7".into(),
    }
}

async fn wait_for_notifications(sink: &RecordingSink, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.snapshot().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

// ── Devices ─────────────────────────────────────────────────────────

#[test]
fn summary_counters_zero_fill() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "device_status_update",
        json!({"summary": {"online": 3, "offline": 1}}),
    ));

    assert_eq!(
        dash.view().calls,
        vec![ViewCall::Summary(DeviceSummary {
            online: 3,
            offline: 1,
            unknown: 0,
            total: 0,
        })]
    );
    assert!(sink.snapshot().is_empty());
}

#[test]
fn device_table_is_replaced_per_snapshot() {
    let (mut dash, _sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "device_status_update",
        json!({"devices": [
            {"id": 1, "name": "sw-01", "ip_address": "10.0.0.1", "status": "online"},
            {"id": 2, "name": "sw-02", "ip_address": "10.0.0.2", "status": "offline"}
        ]}),
    ));
    dash.handle(channel_message(
        "device_status_update",
        json!({"devices": [
            {"id": 3, "name": "sw-03", "ip_address": "10.0.0.3", "status": "unknown"}
        ]}),
    ));

    let tables = dash.view().tables();
    assert_eq!(tables.len(), 2);
    let ids: Vec<RecordId> = tables[1].iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec![RecordId::from(3)]);
    assert_eq!(dash.devices().devices().len(), 1);
    assert_eq!(tables[1][0].status.tone(), Tone::Warning);
}

#[test]
fn loosely_typed_snapshot_still_replaces_the_table() {
    let (mut dash, _sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "device_status_update",
        json!({
            "summary": {"online": "1", "offline": 1.0, "total": -2},
            "devices": [
                {"id": 1, "name": null, "ip_address": "10.0.0.1", "status": "online"},
                {"id": 2, "name": "sw-02", "ip_address": null, "status": null,
                 "last_checked": null}
            ]
        }),
    ));

    assert_eq!(
        dash.devices().summary(),
        &DeviceSummary {
            online: 1,
            offline: 0,
            unknown: 0,
            total: 0,
        }
    );
    let tables = dash.view().tables();
    assert_eq!(tables.len(), 1);
    let ids: Vec<RecordId> = tables[0].iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec![RecordId::from(1), RecordId::from(2)]);
    assert_eq!(tables[0][0].name, "");
    assert_eq!(tables[0][1].last_checked_label(), "-");
}

// ── Tasks ───────────────────────────────────────────────────────────

#[test]
fn task_lifecycle_updates_one_row_and_notifies_once() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-1", "type": "dhcp_config", "status": "pending",
               "progress": 0, "created_at": "2024-05-01 10:00:00"}),
    ));
    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-1", "status": "completed", "progress": 100}),
    ));

    assert_eq!(dash.tasks().len(), 1);
    let row = dash.tasks().get(&RecordId::from("T-1")).unwrap();
    assert_eq!(row.status, TaskStatus::Completed);
    assert_eq!(row.progress, Progress::from(100));
    assert_eq!(row.task_type, "dhcp_config");

    let kinds: Vec<&str> = dash
        .view()
        .calls
        .iter()
        .map(|c| match c {
            ViewCall::Task(TaskChange::Inserted(_)) => "inserted",
            ViewCall::Task(TaskChange::Updated(_)) => "updated",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["inserted", "updated"]);

    assert_eq!(sink.snapshot(), vec![Notification::success("任务 #T-1 已完成")]);
}

#[test]
fn redelivered_completion_notifies_once_per_event() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    let completed = json!({"task_id": "T-1", "type": "dhcp_config", "status": "completed",
                           "progress": 100});
    dash.handle(channel_message("task_status_update", completed.clone()));
    dash.handle(channel_message("task_status_update", completed));

    assert_eq!(dash.tasks().len(), 1);
    assert_eq!(
        sink.snapshot(),
        vec![
            Notification::success("任务 #T-1 已完成"),
            Notification::success("任务 #T-1 已完成"),
        ]
    );
}

#[test]
fn null_and_fractional_task_fields_still_notify() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-1", "type": null, "status": "completed", "progress": null}),
    ));
    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-2", "status": "failed", "progress": 37.5, "message": "x"}),
    ));

    let row = dash.tasks().get(&RecordId::from("T-2")).unwrap();
    assert_eq!(row.progress_label(), "37.5%");
    assert_eq!(dash.tasks().get(&RecordId::from("T-1")).unwrap().task_type, "");
    assert_eq!(
        sink.snapshot(),
        vec![
            Notification::success("任务 #T-1 已完成"),
            Notification::error("任务 #T-2 失败: x"),
        ]
    );
}

#[test]
fn newest_task_is_on_top() {
    let (mut dash, _sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    for id in ["T-1", "T-2", "T-3"] {
        dash.handle(channel_message(
            "task_status_update",
            json!({"task_id": id, "status": "pending"}),
        ));
    }
    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-1", "status": "in_progress", "progress": 50}),
    ));

    let order: Vec<String> = dash.tasks().rows().map(|r| r.task_id.to_string()).collect();
    assert_eq!(order, ["T-3", "T-2", "T-1"]);
}

#[test]
fn unrecognized_status_is_neutral_and_silent() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": 7, "status": "paused", "progress": 10}),
    ));

    let row = dash.tasks().get(&RecordId::from(7)).unwrap();
    assert_eq!(row.status.tone(), Tone::Secondary);
    assert!(sink.snapshot().is_empty());
}

#[test]
fn failed_task_notifies_with_message() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message(
        "task_status_update",
        json!({"task_id": "T-9", "status": "failed", "progress": 30,
               "message": "device unreachable"}),
    ));

    let got = sink.snapshot();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].level, NotificationLevel::Error);
    assert_eq!(got[0].message, "任务 #T-9 失败: device unreachable");
}

// ── Connection ──────────────────────────────────────────────────────

#[test]
fn connection_badges_follow_channel() {
    let (mut dash, _sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(DashboardEvent::Connected);
    dash.handle(DashboardEvent::Connected);
    dash.handle(DashboardEvent::Disconnected);
    dash.handle(DashboardEvent::Connected);

    assert_eq!(
        dash.view().badges(),
        [LABEL_CONNECTED, LABEL_DISCONNECTED, LABEL_CONNECTED]
    );
}

#[test]
fn unavailable_channel_renders_once() {
    let (mut dash, _sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(DashboardEvent::ChannelUnavailable);
    dash.handle(DashboardEvent::Connected);
    dash.handle(DashboardEvent::ChannelUnavailable);

    assert_eq!(dash.view().badges(), [LABEL_UNAVAILABLE]);
}

#[test]
fn server_error_becomes_error_notification() {
    let (mut dash, sink, _tx, _rx) = dashboard(FakeSubmitter::answering(receipt("x")));

    dash.handle(channel_message("error", json!({"message": "获取设备状态失败"})));

    assert_eq!(sink.snapshot(), vec![Notification::error("获取设备状态失败")]);
}

// ── Form submission ─────────────────────────────────────────────────

#[tokio::test]
async fn successful_submit_resets_form_and_notifies() {
    let submitter = FakeSubmitter::answering(receipt("T-42"));
    let calls = Arc::clone(&submitter.calls);
    let (dash, sink, tx, rx) = dashboard(submitter);
    let cancel = CancellationToken::new();
    let run = tokio::spawn(dash.run(rx, cancel.clone()));

    tx.send(DashboardEvent::SubmitRequested(filled_form()))
        .await
        .unwrap();
    wait_for_notifications(&sink, 1).await;
    drop(tx);
    let dash = run.await.unwrap();

    assert_eq!(
        sink.snapshot(),
        vec![Notification::success("DHCP配置任务已提交，任务ID: T-42")]
    );
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(calls.lock().unwrap()[0].pool_name, "office");

    let calls = &dash.view().calls;
    assert_eq!(calls[0], ViewCall::Badge(Badge::new(Tone::Secondary, LABEL_CONNECTING)));
    let tail: Vec<&ViewCall> = calls.iter().skip(2).collect();
    assert_eq!(
        tail,
        [
            &ViewCall::Button(SubmitButton {
                enabled: false,
                busy: true,
                label: BUTTON_BUSY_LABEL,
            }),
            &ViewCall::Button(SubmitButton {
                enabled: true,
                busy: false,
                label: BUTTON_IDLE_LABEL,
            }),
            &ViewCall::FormReset,
        ]
    );
    assert_eq!(dash.form().form(), &DhcpForm::default());
}

#[tokio::test]
async fn failed_submit_keeps_form() {
    let submitter = FakeSubmitter::answering(Err(SubmitFailure::new(None)));
    let (dash, sink, tx, rx) = dashboard(submitter);
    let run = tokio::spawn(dash.run(rx, CancellationToken::new()));

    tx.send(DashboardEvent::SubmitRequested(filled_form()))
        .await
        .unwrap();
    wait_for_notifications(&sink, 1).await;
    drop(tx);
    let dash = run.await.unwrap();

    assert_eq!(sink.snapshot(), vec![Notification::error(GENERIC_FAILURE)]);
    assert!(!dash.view().calls.contains(&ViewCall::FormReset));
    assert_eq!(dash.form().form().pool_name, "office");
    assert!(!dash.form().in_flight());
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let gate = Arc::new(Notify::new());
    let mut submitter = FakeSubmitter::answering(receipt("T-1"));
    submitter.gate = Some(Arc::clone(&gate));
    let calls = Arc::clone(&submitter.calls);
    let (dash, sink, tx, rx) = dashboard(submitter);
    let run = tokio::spawn(dash.run(rx, CancellationToken::new()));

    tx.send(DashboardEvent::SubmitRequested(filled_form()))
        .await
        .unwrap();
    tx.send(DashboardEvent::SubmitRequested(DhcpForm::default()))
        .await
        .unwrap();

    // Let both events be handled before the first request completes.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sink.snapshot().is_empty());
    gate.notify_one();

    wait_for_notifications(&sink, 1).await;
    drop(tx);
    let _dash = run.await.unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(sink.snapshot().len(), 1);
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    let (dash, _sink, _tx, rx) = dashboard(FakeSubmitter::answering(receipt("x")));
    let cancel = CancellationToken::new();
    let run = tokio::spawn(dash.run(rx, cancel.clone()));
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
}

// ── Bridge ──────────────────────────────────────────────────────────

#[tokio::test]
async fn bridge_forwards_and_requests_snapshot_on_connect() {
    let (events, _keep) = broadcast::channel(16);
    let channel = Arc::new(FakeChannel {
        events: events.clone(),
        emitted: Mutex::new(Vec::new()),
    });
    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let bridge = tokio::spawn(bridge_channel(Arc::clone(&channel), tx, true, cancel.clone()));

    tokio::time::timeout(Duration::from_secs(5), async {
        while events.receiver_count() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    events.send(Arc::new(ChannelEvent::Connected)).unwrap();
    events
        .send(Arc::new(ChannelEvent::Message {
            name: "traffic_data_update".into(),
            payload: json!({}),
        }))
        .unwrap();
    events
        .send(Arc::new(ChannelEvent::Message {
            name: "task_status_update".into(),
            payload: json!({"task_id": "T-1", "status": "pending"}),
        }))
        .unwrap();

    assert_eq!(rx.recv().await, Some(DashboardEvent::Connected));
    let Some(DashboardEvent::TaskStatus(update)) = rx.recv().await else {
        panic!("expected task status");
    };
    assert_eq!(update.task_id, Some(RecordId::from("T-1")));
    assert_eq!(
        *channel.emitted.lock().unwrap(),
        vec!["request_device_status".to_owned()]
    );

    cancel.cancel();
    bridge.await.unwrap();
}

#[tokio::test]
async fn bridge_without_snapshot_request_stays_quiet() {
    let (events, _keep) = broadcast::channel(16);
    let channel = Arc::new(FakeChannel {
        events: events.clone(),
        emitted: Mutex::new(Vec::new()),
    });
    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let bridge = tokio::spawn(bridge_channel(Arc::clone(&channel), tx, false, cancel.clone()));

    tokio::time::timeout(Duration::from_secs(5), async {
        while events.receiver_count() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    events.send(Arc::new(ChannelEvent::Connected)).unwrap();
    assert_eq!(rx.recv().await, Some(DashboardEvent::Connected));
    assert!(channel.emitted.lock().unwrap().is_empty());

    cancel.cancel();
    bridge.await.unwrap();
}
