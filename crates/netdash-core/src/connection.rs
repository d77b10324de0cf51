// ── Connection indicator ──
//
// Mirrors the real-time channel's liveness into a badge. Each transition
// re-renders exactly once; repeated signals for the current state render
// nothing.

use tracing::debug;

use crate::view::{Badge, Tone};

pub const LABEL_CONNECTING: &str = "连接中";
pub const LABEL_CONNECTED: &str = "已连接";
pub const LABEL_DISCONNECTED: &str = "已断开";
pub const LABEL_UNAVAILABLE: &str = "未启用";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// Initial state before the channel reports anything.
    #[default]
    Connecting,
    Connected,
    Disconnected,
    /// The channel could not be set up at all. Terminal.
    Unavailable,
}

impl ConnectionState {
    pub fn badge(self) -> Badge {
        match self {
            Self::Connecting => Badge::new(Tone::Secondary, LABEL_CONNECTING),
            Self::Connected => Badge::new(Tone::Success, LABEL_CONNECTED),
            Self::Disconnected => Badge::new(Tone::Danger, LABEL_DISCONNECTED),
            Self::Unavailable => Badge::new(Tone::Secondary, LABEL_UNAVAILABLE),
        }
    }
}

/// Channel signal fed into the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSignal {
    Established,
    Lost,
    Unavailable,
}

#[derive(Debug, Default)]
pub struct ConnectionIndicator {
    state: ConnectionState,
}

impl ConnectionIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply a signal, returning the badge to render if the state changed.
    ///
    /// `Unavailable` only applies before the channel has ever reported, and
    /// once applied no further signal changes the indicator.
    pub fn apply(&mut self, signal: ConnectionSignal) -> Option<Badge> {
        let next = match (self.state, signal) {
            (ConnectionState::Unavailable, _) => {
                debug!(?signal, "channel unavailable, ignoring signal");
                return None;
            }
            (ConnectionState::Connecting, ConnectionSignal::Unavailable) => {
                ConnectionState::Unavailable
            }
            (_, ConnectionSignal::Unavailable) => {
                debug!(state = %self.state, "late unavailable signal ignored");
                return None;
            }
            (_, ConnectionSignal::Established) => ConnectionState::Connected,
            (_, ConnectionSignal::Lost) => ConnectionState::Disconnected,
        };

        if next == self.state {
            return None;
        }
        self.state = next;
        Some(next.badge())
    }
}
