//! Error types for the connector.

use crate::broker::CloseReason;

/// Errors delivered to the channel handler, or returned by [`Connector::start`](crate::Connector::start).
///
/// Failed connect attempts never show up here; they are retried and only
/// reported through events and logs.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError<E> {
    /// A previously delivered connection closed with a reconnectable reason.
    /// The connector is already on its way to reconnecting.
    #[error("connection closed ({reason})")]
    ConnectionClosed {
        /// What the broker reported.
        reason: CloseReason,
    },

    /// The connection came up but a channel could not be opened on it.
    /// The connection stays up; channel creation is not retried.
    #[error("failed to create channel: {0}")]
    ChannelCreation(#[source] E),

    /// `start` was called on a connector that is already running.
    #[error("connector already started")]
    AlreadyStarted,

    /// `start` was called on a connector that has been stopped.
    #[error("connector stopped")]
    Stopped,
}

impl<E> ConnectorError<E> {
    /// Returns `true` for [`ConnectorError::ConnectionClosed`].
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, ConnectorError::ConnectionClosed { .. })
    }

    /// Returns `true` for [`ConnectorError::ChannelCreation`].
    pub fn is_channel_creation(&self) -> bool {
        matches!(self, ConnectorError::ChannelCreation(_))
    }

    /// The close reason, for [`ConnectorError::ConnectionClosed`].
    pub fn close_reason(&self) -> Option<&CloseReason> {
        match self {
            ConnectorError::ConnectionClosed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Invalid connector configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The retry interval must be positive.
    #[error("retry interval must be greater than zero")]
    ZeroInterval,

    /// No broker address was given.
    #[error("broker address must not be empty")]
    EmptyAddress,
}
