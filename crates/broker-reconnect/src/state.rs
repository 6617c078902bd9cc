//! Connection state tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Where the connector is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// Created but not started.
    Idle,

    /// A connect attempt is in flight or the retry delay is running.
    Connecting,

    /// A connection is established.
    Connected,

    /// The last connection closed with a reason the close policy does not
    /// reconnect. Nothing further happens until the connector is stopped.
    Disconnected,

    /// Stopped for good.
    Stopped,
}

/// Shared view of a connector's state.
///
/// Cheap to clone; all clones observe the same connector.
#[derive(Clone)]
pub struct ConnectorState {
    state: Arc<AtomicU8>,

    /// Consecutive failed connect attempts since the last success.
    attempts: Arc<AtomicU32>,

    /// Successful connects over the connector's lifetime.
    connections: Arc<AtomicU64>,
}

impl ConnectorState {
    /// Creates state for a connector that has not started.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(Self::encode(ConnectionState::Idle))),
            attempts: Arc::new(AtomicU32::new(0)),
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        Self::decode(self.state.load(Ordering::Acquire))
    }

    /// Consecutive failed connect attempts since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Number of successful connects so far.
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Acquire)
    }

    /// Returns `true` while a connection is established.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub(crate) fn mark_connecting(&self) {
        self.set(ConnectionState::Connecting);
    }

    /// Records a failed attempt and returns the new consecutive count.
    pub(crate) fn record_failure(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Records a successful connect and returns how many attempts it took.
    pub(crate) fn mark_connected(&self) -> u32 {
        let failed = self.attempts.swap(0, Ordering::AcqRel);
        self.connections.fetch_add(1, Ordering::AcqRel);
        self.set(ConnectionState::Connected);
        failed + 1
    }

    pub(crate) fn mark_disconnected(&self) {
        self.set(ConnectionState::Disconnected);
    }

    pub(crate) fn mark_stopped(&self) {
        self.set(ConnectionState::Stopped);
    }

    fn set(&self, state: ConnectionState) {
        self.state.store(Self::encode(state), Ordering::Release);
    }

    fn encode(state: ConnectionState) -> u8 {
        match state {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Disconnected => 3,
            ConnectionState::Stopped => 4,
        }
    }

    fn decode(encoded: u8) -> ConnectionState {
        match encoded {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Disconnected,
            _ => ConnectionState::Stopped,
        }
    }
}

impl Default for ConnectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorState")
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .field("connections", &self.connections())
            .finish()
    }
}
