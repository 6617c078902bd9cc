//! Fixed-interval reconnection for message-broker connections.
//!
//! A [`Connector`] keeps exactly one broker connection alive on behalf of a
//! caller. It retries failed connects forever at a fixed interval, opens a
//! channel on every fresh connection and hands it to the caller, and starts
//! over when the broker forcibly closes the connection.
//!
//! # Features
//!
//! - **Quiet retries**: failed connect attempts never reach the channel handler
//! - **Fixed interval**: no backoff, no jitter, no attempt limit
//! - **Close classification**: [`ClosePolicy`] decides which closes are reconnected
//! - **Event system**: every transition is published as a [`ConnectorEvent`]
//! - **Pluggable transport**: connecting is any [`tower::Service`] yielding a
//!   [`BrokerConnection`]
//!
//! # Feature flags
//!
//! - `tracing`: diagnostic logging through the `tracing` crate
//! - `metrics`: counters and a gauge through the `metrics` crate
//! - `serde`: serialization for [`ConnectionState`] and [`CloseReason`]
//! - `tcp`: the plain TCP transport adapter, [`TcpBroker`]
//!
//! # Examples
//!
//! ```rust
//! use broker_reconnect::{BrokerConnection, CloseReason, ConnectorConfig};
//! use std::time::Duration;
//!
//! struct Loopback;
//!
//! impl BrokerConnection for Loopback {
//!     type Channel = u16;
//!     type Error = std::io::Error;
//!
//!     async fn create_channel(&self) -> Result<u16, std::io::Error> {
//!         Ok(1)
//!     }
//!
//!     async fn closed(&self) -> CloseReason {
//!         std::future::pending().await
//!     }
//!
//!     async fn close(&self) {}
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let make = tower::service_fn(|_address: String| async {
//!     Ok::<_, std::io::Error>(Loopback)
//! });
//!
//! let connector = ConnectorConfig::builder()
//!     .name("orders")
//!     .interval(Duration::from_millis(250))
//!     .on_connected(|attempts| println!("connected after {} attempt(s)", attempts))
//!     .build()?
//!     .connector(make);
//!
//! let (tx, rx) = tokio::sync::oneshot::channel();
//! let mut tx = Some(tx);
//! connector
//!     .start(move |result| {
//!         if let Some(tx) = tx.take() {
//!             let _ = tx.send(result.is_ok());
//!         }
//!     })
//!     .await?;
//!
//! assert!(rx.await?);
//! connector.stop().await;
//! # Ok(())
//! # }
//! ```

mod broker;
mod config;
mod connector;
mod error;
mod events;
mod policy;
mod state;
#[cfg(feature = "tcp")]
mod tcp;

pub use broker::{BrokerConnection, CloseReason};
pub use config::{ConnectorConfig, ConnectorConfigBuilder, DEFAULT_ADDRESS, DEFAULT_INTERVAL};
pub use connector::{ChannelResult, Connector};
pub use error::{ConfigError, ConnectorError};
pub use events::ConnectorEvent;
pub use policy::ClosePolicy;
pub use state::{ConnectionState, ConnectorState};
#[cfg(feature = "tcp")]
pub use tcp::{DEFAULT_CHANNEL_MAX, DEFAULT_PORT, TcpBroker, TcpChannel, TcpConnection, TcpError};

pub use broker_reconnect_core::events::{EventListener, EventListeners, LifecycleEvent};
pub use broker_reconnect_core::reply_code;
