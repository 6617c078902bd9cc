//! The broker capability the connector drives.
//!
//! The connector never speaks a wire protocol itself. Connecting is any
//! [`tower::Service`] that turns a broker address into a [`BrokerConnection`],
//! and the connection knows how to open channels and how to report that it
//! has gone away.

use broker_reconnect_core::reply_code;
use std::fmt;
use std::future::Future;

/// A live transport session to a broker.
///
/// # Examples
///
/// ```
/// use broker_reconnect::{BrokerConnection, CloseReason};
/// use tokio::sync::watch;
///
/// struct InMemory {
///     closed: watch::Sender<Option<CloseReason>>,
/// }
///
/// impl BrokerConnection for InMemory {
///     type Channel = u16;
///     type Error = std::io::Error;
///
///     async fn create_channel(&self) -> Result<u16, std::io::Error> {
///         Ok(1)
///     }
///
///     async fn closed(&self) -> CloseReason {
///         let mut rx = self.closed.subscribe();
///         loop {
///             let current = rx.borrow_and_update().clone();
///             if let Some(reason) = current {
///                 return reason;
///             }
///             if rx.changed().await.is_err() {
///                 return CloseReason::connection_forced("dropped");
///             }
///         }
///     }
///
///     async fn close(&self) {
///         self.closed.send_replace(Some(CloseReason::normal()));
///     }
/// }
/// ```
pub trait BrokerConnection: Send + Sync + 'static {
    /// Channel handed to the caller once the connection is up.
    type Channel: Send + 'static;

    /// Error produced when a channel cannot be opened.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a new channel on this connection.
    fn create_channel(&self) -> impl Future<Output = Result<Self::Channel, Self::Error>> + Send;

    /// Resolves once the connection has closed, with the broker's reason.
    ///
    /// Must resolve even when the close happened before the future was first
    /// polled, and must keep resolving to the same reason if polled again.
    fn closed(&self) -> impl Future<Output = CloseReason> + Send;

    /// Closes the connection from our side.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloseReason {
    code: u16,
    text: String,
}

impl CloseReason {
    /// Creates a close reason with an arbitrary reply code.
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// A `320 CONNECTION_FORCED` close: the peer or an operator ended the session.
    pub fn connection_forced(text: impl Into<String>) -> Self {
        Self::new(reply_code::CONNECTION_FORCED, text)
    }

    /// A `200 REPLY_SUCCESS` close, as sent for a requested shutdown.
    pub fn normal() -> Self {
        Self::new(reply_code::REPLY_SUCCESS, "OK")
    }

    /// The broker reply code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The broker's human readable explanation.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns `true` for the recognized "connection forced/closed" status.
    pub fn is_connection_forced(&self) -> bool {
        self.code == reply_code::CONNECTION_FORCED
    }

    /// Returns `true` if the code marks a connection-level error, after which
    /// the connection cannot be used.
    pub fn is_hard_error(&self) -> bool {
        reply_code::is_hard_error(self.code)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match reply_code::name(self.code) {
            Some(name) => write!(f, "{} {}: {}", self.code, name, self.text),
            None => write!(f, "{}: {}", self.code, self.text),
        }
    }
}
