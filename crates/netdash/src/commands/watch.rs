//! `netdash watch`: follow the real-time channel until interrupted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use netdash_core::{Dashboard, DashboardEvent, RealtimeHandle, bridge_channel, event_channel};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, print_output};
use crate::terminal::{TerminalNotifier, TerminalView, render_tasks};

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::resolve(global)?;
    if args.no_realtime {
        cfg.realtime = false;
    }
    if args.no_snapshot {
        cfg.request_snapshot = false;
    }

    let color = output::should_color(&config::color_mode(global));
    let client = cfg.dhcp_client()?;
    let (tx, rx) = event_channel();
    let cancel = CancellationToken::new();
    let dashboard = Dashboard::new(
        TerminalView::new(color, global.quiet),
        TerminalNotifier::new(color),
        client,
        &tx,
    );

    let channel = if cfg.realtime {
        let ws_url = cfg.websocket_url()?;
        info!(url = %ws_url, "opening real-time channel");
        let handle = Arc::new(RealtimeHandle::connect(
            ws_url,
            cfg.reconnect.clone(),
            cancel.child_token(),
        ));
        tokio::spawn(bridge_channel(
            Arc::clone(&handle),
            tx,
            cfg.request_snapshot,
            cancel.clone(),
        ));
        Some(handle)
    } else {
        if tx.try_send(DashboardEvent::ChannelUnavailable).is_err() {
            warn!("dashboard queue unavailable");
        }
        // Dropping the only sender lets the loop drain and finish.
        drop(tx);
        None
    };

    let stop = cancel.clone();
    let watched = channel.clone();
    tokio::spawn(async move {
        match watched {
            Some(handle) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("interrupted"),
                    () = handle.closed() => warn!("real-time channel gave up"),
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        stop.cancel();
    });

    let dashboard = dashboard.run(rx, cancel.clone()).await;
    cancel.cancel();
    if let Some(handle) = channel {
        handle.shutdown();
    }

    if !dashboard.tasks().is_empty() {
        print_output(&render_tasks(dashboard.tasks().rows(), color), global.quiet);
    }
    Ok(())
}
