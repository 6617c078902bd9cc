//! Close classification: which connection closes restart the retry loop.

use crate::broker::CloseReason;
use std::sync::Arc;

/// Decides whether a closed connection is reconnected.
///
/// Closes that match are reported to the channel handler as
/// [`ConnectorError::ConnectionClosed`](crate::ConnectorError::ConnectionClosed)
/// and followed by a reconnect after the configured interval. Closes that do
/// not match leave the connector [`Disconnected`](crate::ConnectionState::Disconnected):
/// no handler call, no reconnect, only an `UnhandledClose` event.
#[derive(Clone, Default)]
pub enum ClosePolicy {
    /// Only `320 CONNECTION_FORCED` closes are reconnected.
    #[default]
    ForcedOnly,

    /// Closes carrying a hard (connection-level) error code are reconnected,
    /// `320 CONNECTION_FORCED` included. Normal shutdowns and soft codes are not.
    HardErrors,

    /// Every close is reconnected, whatever its code.
    Any,

    /// Caller supplied classification.
    Custom(Arc<dyn Fn(&CloseReason) -> bool + Send + Sync>),
}

impl ClosePolicy {
    /// Builds a [`ClosePolicy::Custom`] from a closure.
    ///
    /// # Examples
    ///
    /// ```
    /// use broker_reconnect::{ClosePolicy, CloseReason};
    ///
    /// // Reconnect on forced closes and internal broker errors.
    /// let policy = ClosePolicy::custom(|reason| matches!(reason.code(), 320 | 541));
    ///
    /// assert!(policy.should_reconnect(&CloseReason::new(541, "internal error")));
    /// assert!(!policy.should_reconnect(&CloseReason::new(200, "bye")));
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&CloseReason) -> bool + Send + Sync + 'static,
    {
        ClosePolicy::Custom(Arc::new(f))
    }

    /// Returns `true` if a connection closed for `reason` should be reconnected.
    pub fn should_reconnect(&self, reason: &CloseReason) -> bool {
        match self {
            ClosePolicy::ForcedOnly => reason.is_connection_forced(),
            ClosePolicy::HardErrors => reason.is_hard_error(),
            ClosePolicy::Any => true,
            ClosePolicy::Custom(f) => f(reason),
        }
    }
}

impl std::fmt::Debug for ClosePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForcedOnly => write!(f, "ClosePolicy::ForcedOnly"),
            Self::HardErrors => write!(f, "ClosePolicy::HardErrors"),
            Self::Any => write!(f, "ClosePolicy::Any"),
            Self::Custom(_) => write!(f, "ClosePolicy::Custom"),
        }
    }
}
