//! `netdash submit`: queue a DHCP configuration and report the task id.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use netdash_core::{DhcpForm, FormController, NotificationLevel, NotificationSink, Submitter};

use crate::cli::{GlobalOpts, SubmitArgs};
use crate::config;
use crate::error::CliError;
use crate::output;
use crate::terminal::TerminalNotifier;

impl From<SubmitArgs> for DhcpForm {
    fn from(args: SubmitArgs) -> Self {
        Self {
            device_ids: args.device_ids,
            pool_name: args.pool_name,
            network: args.network,
            mask: args.mask,
            gateway: args.gateway,
            dns: args.dns,
            domain: args.domain,
            lease_days: args.lease_days,
        }
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(netdash_core::form::BUTTON_BUSY_LABEL);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub async fn handle(args: SubmitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let client = cfg.dhcp_client()?;
    let notifier = TerminalNotifier::new(output::should_color(&config::color_mode(global)));

    let mut form = FormController::new();
    let request = form.begin(DhcpForm::from(args))?;

    let progress = spinner(global.quiet);
    let outcome = Submitter::submit(&client, request).await;
    progress.finish_and_clear();
    let timed_out = outcome.as_ref().err().and_then(|f| f.timeout_secs);

    let Some(resolution) = form.finish(outcome) else {
        return Err(CliError::Internal("submission was not in flight".into()));
    };

    if resolution.notification.level == NotificationLevel::Success {
        if !global.quiet {
            notifier.notify(resolution.notification);
        }
        Ok(())
    } else if let Some(seconds) = timed_out {
        Err(CliError::Timeout { seconds })
    } else {
        Err(CliError::SubmissionFailed {
            message: resolution.notification.message,
        })
    }
}
