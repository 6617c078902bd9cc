use crate::broker::CloseReason;
use broker_reconnect_core::events::LifecycleEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`Connector`](crate::Connector), one per state transition.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    /// A connect attempt failed; another follows after `retry_in`.
    ConnectFailed {
        connector: String,
        timestamp: Instant,
        /// Consecutive failed attempts, starting at 1.
        attempt: u32,
        error: String,
        retry_in: Duration,
    },
    /// A connection was established.
    Connected {
        connector: String,
        timestamp: Instant,
        /// Attempts it took, including the successful one.
        attempts: u32,
    },
    /// The connection is up but opening a channel failed.
    ChannelFailed {
        connector: String,
        timestamp: Instant,
        error: String,
    },
    /// The connection closed with a reconnectable reason; a reconnect follows
    /// after `retry_in`.
    ConnectionClosed {
        connector: String,
        timestamp: Instant,
        reason: CloseReason,
        retry_in: Duration,
    },
    /// The connection closed with a reason the close policy does not reconnect.
    UnhandledClose {
        connector: String,
        timestamp: Instant,
        reason: CloseReason,
    },
    /// The connector was stopped.
    Stopped {
        connector: String,
        timestamp: Instant,
    },
}

impl LifecycleEvent for ConnectorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ConnectorEvent::ConnectFailed { .. } => "connect_failed",
            ConnectorEvent::Connected { .. } => "connected",
            ConnectorEvent::ChannelFailed { .. } => "channel_failed",
            ConnectorEvent::ConnectionClosed { .. } => "connection_closed",
            ConnectorEvent::UnhandledClose { .. } => "unhandled_close",
            ConnectorEvent::Stopped { .. } => "stopped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ConnectorEvent::ConnectFailed { timestamp, .. }
            | ConnectorEvent::Connected { timestamp, .. }
            | ConnectorEvent::ChannelFailed { timestamp, .. }
            | ConnectorEvent::ConnectionClosed { timestamp, .. }
            | ConnectorEvent::UnhandledClose { timestamp, .. }
            | ConnectorEvent::Stopped { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            ConnectorEvent::ConnectFailed { connector, .. }
            | ConnectorEvent::Connected { connector, .. }
            | ConnectorEvent::ChannelFailed { connector, .. }
            | ConnectorEvent::ConnectionClosed { connector, .. }
            | ConnectorEvent::UnhandledClose { connector, .. }
            | ConnectorEvent::Stopped { connector, .. } => connector,
        }
    }
}
