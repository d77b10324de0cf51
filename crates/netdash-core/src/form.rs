// ── DHCP form controller ──
//
// One submission at a time. The phase is checked and flipped before any
// request leaves, so a second submit while busy never reaches the network.

use netdash_api::{DhcpRequest, SubmitReceipt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::notify::Notification;
use crate::submit::SubmitFailure;
use crate::view::SubmitButton;

pub const BUTTON_IDLE_LABEL: &str = "提交配置";
pub const BUTTON_BUSY_LABEL: &str = "提交中...";
pub const GENERIC_FAILURE: &str = "提交失败";

/// Operator-entered DHCP pool configuration, kept as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpForm {
    pub device_ids: String,
    pub pool_name: String,
    pub network: String,
    pub mask: String,
    pub gateway: String,
    pub dns: String,
    pub domain: String,
    pub lease_days: String,
}

impl DhcpForm {
    pub fn to_request(&self) -> DhcpRequest {
        DhcpRequest {
            device_ids: self.device_ids.clone(),
            pool_name: self.pool_name.clone(),
            network: self.network.clone(),
            mask: self.mask.clone(),
            gateway: self.gateway.clone(),
            dns: self.dns.clone(),
            domain: self.domain.clone(),
            lease_days: self.lease_days.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Submitting,
}

/// How a finished submission resolves on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub notification: Notification,
    /// Whether the form fields were cleared (success only).
    pub reset: bool,
}

#[derive(Debug, Default)]
pub struct FormController {
    form: DhcpForm,
    phase: FormPhase,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &DhcpForm {
        &self.form
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn button(&self) -> SubmitButton {
        match self.phase {
            FormPhase::Idle => SubmitButton {
                enabled: true,
                busy: false,
                label: BUTTON_IDLE_LABEL,
            },
            FormPhase::Submitting => SubmitButton {
                enabled: false,
                busy: true,
                label: BUTTON_BUSY_LABEL,
            },
        }
    }

    /// Start a submission of `form`, returning the request body to send.
    ///
    /// Fails with [`CoreError::SubmissionInFlight`] while a previous
    /// submission is unresolved; the held form is left untouched.
    pub fn begin(&mut self, form: DhcpForm) -> Result<DhcpRequest, CoreError> {
        if self.in_flight() {
            return Err(CoreError::SubmissionInFlight);
        }
        self.form = form;
        self.phase = FormPhase::Submitting;
        debug!(pool = %self.form.pool_name, "submission started");
        Ok(self.form.to_request())
    }

    /// Resolve the in-flight submission.
    ///
    /// Returns `None` if nothing was in flight.
    pub fn finish(
        &mut self,
        outcome: Result<SubmitReceipt, SubmitFailure>,
    ) -> Option<Resolution> {
        if !self.in_flight() {
            warn!("submission result arrived with nothing in flight");
            return None;
        }
        self.phase = FormPhase::Idle;

        Some(match outcome {
            Ok(receipt) => {
                self.form = DhcpForm::default();
                Resolution {
                    notification: Notification::success(format!(
                        "DHCP配置任务已提交，任务ID: {}",
                        receipt.task_id
                    )),
                    reset: true,
                }
            }
            Err(failure) => Resolution {
                notification: Notification::error(failure.display_message()),
                reset: false,
            },
        })
    }
}
