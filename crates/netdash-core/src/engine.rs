// ── Reconciliation loop ──
//
// One task owns all dashboard state. Channel events, operator submits and
// HTTP completions arrive on the same mpsc queue and are applied strictly
// in delivery order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionIndicator, ConnectionSignal};
use crate::event::DashboardEvent;
use crate::form::{DhcpForm, FormController};
use crate::notify::{Notification, NotificationSink};
use crate::store::{DeviceBoard, TaskBoard, task_notification};
use crate::submit::{SubmitFailure, Submitter};
use crate::view::DashboardView;
use netdash_api::SubmitReceipt;

/// Queue depth for dashboard events.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Create the queue feeding a [`Dashboard`].
pub fn event_channel() -> (mpsc::Sender<DashboardEvent>, mpsc::Receiver<DashboardEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

pub struct Dashboard<V, N, S> {
    connection: ConnectionIndicator,
    devices: DeviceBoard,
    tasks: TaskBoard,
    form: FormController,
    view: V,
    notifier: N,
    submitter: Arc<S>,
    /// Weak so the loop still ends once every external sender is gone.
    events: mpsc::WeakSender<DashboardEvent>,
}

impl<V, N, S> Dashboard<V, N, S>
where
    V: DashboardView,
    N: NotificationSink,
    S: Submitter,
{
    /// `events` is the sender side of the queue this dashboard will be run
    /// on; submit completions are posted back through it.
    pub fn new(view: V, notifier: N, submitter: S, events: &mpsc::Sender<DashboardEvent>) -> Self {
        Self {
            connection: ConnectionIndicator::new(),
            devices: DeviceBoard::new(),
            tasks: TaskBoard::new(),
            form: FormController::new(),
            view,
            notifier,
            submitter: Arc::new(submitter),
            events: events.downgrade(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn connection(&self) -> &ConnectionIndicator {
        &self.connection
    }

    pub fn devices(&self) -> &DeviceBoard {
        &self.devices
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // ── Loop ─────────────────────────────────────────────────────────

    /// Consume events until the queue closes or `cancel` fires, then hand
    /// the dashboard back.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<DashboardEvent>,
        cancel: CancellationToken,
    ) -> Self {
        self.view
            .connection_badge(&self.connection.state().badge());
        self.view.submit_button(&self.form.button());

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("dashboard loop cancelled");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        debug!("dashboard event queue closed");
                        break;
                    };
                    self.handle(event);
                }
            }
        }
        self
    }

    /// Apply one event. Synchronous except that a submit request spawns
    /// its HTTP call on the current runtime.
    pub fn handle(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::ChannelUnavailable => {
                self.signal(ConnectionSignal::Unavailable);
            }
            DashboardEvent::Connected => self.signal(ConnectionSignal::Established),
            DashboardEvent::Disconnected => self.signal(ConnectionSignal::Lost),
            DashboardEvent::DeviceStatus(update) => {
                let change = self.devices.apply(update);
                if change.summary {
                    self.view.device_summary(self.devices.summary());
                }
                if change.table {
                    self.view.device_table(self.devices.devices());
                }
            }
            DashboardEvent::TaskStatus(update) => {
                let Some(change) = self.tasks.apply(update) else {
                    return;
                };
                self.view.task_row(&change);
                if let Some(notification) = task_notification(change.row()) {
                    self.notifier.notify(notification);
                }
            }
            DashboardEvent::ServerError { message } => {
                warn!(%message, "server reported an error");
                self.notifier.notify(Notification::error(message));
            }
            DashboardEvent::SubmitRequested(form) => self.start_submit(form),
            DashboardEvent::SubmitFinished(outcome) => self.finish_submit(outcome),
        }
    }

    fn signal(&mut self, signal: ConnectionSignal) {
        if let Some(badge) = self.connection.apply(signal) {
            info!(state = %self.connection.state(), "connection state changed");
            self.view.connection_badge(&badge);
        }
    }

    fn start_submit(&mut self, form: DhcpForm) {
        let request = match self.form.begin(form) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "submit ignored");
                return;
            }
        };
        self.view.submit_button(&self.form.button());

        let Some(tx) = self.events.upgrade() else {
            warn!("event queue closed, abandoning submission");
            self.finish_submit(Err(SubmitFailure::new(None)));
            return;
        };
        let submitter = Arc::clone(&self.submitter);
        tokio::spawn(async move {
            let outcome = submitter.submit(request).await;
            if tx.send(DashboardEvent::SubmitFinished(outcome)).await.is_err() {
                debug!("dashboard gone before submission finished");
            }
        });
    }

    fn finish_submit(&mut self, outcome: Result<SubmitReceipt, SubmitFailure>) {
        let Some(resolution) = self.form.finish(outcome) else {
            return;
        };
        self.view.submit_button(&self.form.button());
        if resolution.reset {
            self.view.form_reset();
        }
        self.notifier.notify(resolution.notification);
    }
}
