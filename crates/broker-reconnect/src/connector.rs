use crate::broker::{BrokerConnection, CloseReason};
use crate::config::ConnectorConfig;
use crate::error::ConnectorError;
use crate::events::ConnectorEvent;
use crate::state::ConnectorState;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// What a channel handler receives: a fresh channel, or why there is none.
pub type ChannelResult<C> =
    Result<<C as BrokerConnection>::Channel, ConnectorError<<C as BrokerConnection>::Error>>;

enum Lifecycle<M> {
    Idle(M),
    Running(JoinHandle<()>),
    Stopped,
}

/// Acquires and keeps a single broker connection, handing a channel to the
/// caller every time a connection comes up.
///
/// A connector owns one background task and at most one connection. Failed
/// connect attempts are retried after the configured interval, forever and
/// without telling the handler. Once connected, a channel is opened and the
/// handler is called exactly once with the outcome. When that connection
/// later closes with a reason the [`ClosePolicy`](crate::ClosePolicy)
/// accepts, the handler receives [`ConnectorError::ConnectionClosed`] and the
/// retry loop starts over.
///
/// # Examples
///
/// ```no_run
/// use broker_reconnect::{BrokerConnection, ConnectorConfig};
/// use std::time::Duration;
///
/// # async fn example<M>(make: M) -> Result<(), Box<dyn std::error::Error>>
/// # where
/// #     M: tower::Service<String> + Send + 'static,
/// #     M::Response: BrokerConnection,
/// #     M::Error: std::fmt::Display + Send,
/// #     M::Future: Send,
/// # {
/// let connector = ConnectorConfig::builder()
///     .name("orders")
///     .address("amqp://localhost")
///     .interval(Duration::from_secs(2))
///     .build()?
///     .connector(make);
///
/// connector
///     .start(|result| match result {
///         Ok(_channel) => println!("got a channel"),
///         Err(e) => eprintln!("lost connection: {}", e),
///     })
///     .await?;
///
/// // ...
///
/// connector.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Connector<M> {
    config: Arc<ConnectorConfig>,
    state: ConnectorState,
    shutdown: watch::Sender<bool>,
    lifecycle: Mutex<Lifecycle<M>>,
}

impl<M> Connector<M> {
    /// Creates an idle connector around the connect service `make`.
    pub fn new(make: M, config: ConnectorConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "connector_connect_attempts_total",
                    "Total number of broker connect attempts"
                );
                describe_counter!(
                    "connector_connections_closed_total",
                    "Total number of established connections that closed"
                );
                describe_counter!(
                    "connector_channels_total",
                    "Total number of channel requests on fresh connections"
                );
                describe_gauge!(
                    "connector_connected",
                    "Whether the connector currently holds a live connection (0 or 1)"
                );
            });
        }

        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            state: ConnectorState::new(),
            shutdown,
            lifecycle: Mutex::new(Lifecycle::Idle(make)),
        }
    }

    /// Shared view of the connector's state.
    pub fn state(&self) -> &ConnectorState {
        &self.state
    }

    /// The configuration this connector runs with.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Stops the connector.
    ///
    /// Interrupts whatever is pending (a connect attempt, the retry delay, a
    /// channel request or the wait for a close), closes the live connection
    /// if there is one, and waits for the background task to finish. The
    /// handler is not called again. Stopping is final; calling `stop` again
    /// does nothing.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let mut lifecycle = self.lifecycle.lock().await;
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(task) => {
                let _ = task.await;
            }
            Lifecycle::Idle(_) => {
                self.state.mark_stopped();
                emit_stopped(&self.config);
            }
            Lifecycle::Stopped => {}
        }
    }
}

impl<M> Connector<M>
where
    M: Service<String> + Send + 'static,
    M::Response: BrokerConnection,
    M::Error: Display + Send,
    M::Future: Send,
{
    /// Starts the reconnection task and returns immediately.
    ///
    /// Every result is delivered through `handler`, in order, from a single
    /// task:
    /// - `Ok(channel)` after each successful connect;
    /// - `Err(ChannelCreation(e))` instead, when the channel could not be
    ///   opened (the connection stays up and nothing is retried);
    /// - `Err(ConnectionClosed { .. })` when a delivered connection later
    ///   closes with a reconnectable reason.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start<H>(
        &self,
        handler: H,
    ) -> Result<(), ConnectorError<<M::Response as BrokerConnection>::Error>>
    where
        H: FnMut(ChannelResult<M::Response>) + Send + 'static,
    {
        let mut lifecycle = self.lifecycle.lock().await;
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle(make) => {
                let run = Run {
                    config: Arc::clone(&self.config),
                    state: self.state.clone(),
                    shutdown: self.shutdown.subscribe(),
                };
                *lifecycle = Lifecycle::Running(tokio::spawn(run.drive(make, handler)));
                Ok(())
            }
            running @ Lifecycle::Running(_) => {
                *lifecycle = running;
                Err(ConnectorError::AlreadyStarted)
            }
            Lifecycle::Stopped => Err(ConnectorError::Stopped),
        }
    }
}

impl<M> Drop for Connector<M> {
    fn drop(&mut self) {
        if let Lifecycle::Running(task) = self.lifecycle.get_mut() {
            task.abort();
        }
    }
}

impl<M> std::fmt::Debug for Connector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

/// The background half of a connector.
struct Run {
    config: Arc<ConnectorConfig>,
    state: ConnectorState,
    shutdown: watch::Receiver<bool>,
}

impl Run {
    async fn drive<M, H>(mut self, mut make: M, mut handler: H)
    where
        M: Service<String>,
        M::Response: BrokerConnection,
        M::Error: Display,
        H: FnMut(ChannelResult<M::Response>),
    {
        let config = Arc::clone(&self.config);

        loop {
            self.state.mark_connecting();

            #[cfg(feature = "tracing")]
            tracing::debug!(
                connector = %config.name,
                address = %config.address,
                "connecting to broker"
            );

            let connection = tokio::select! {
                biased;
                _ = stop_requested(&mut self.shutdown) => break,
                result = connect(&mut make, &config.address) => match result {
                    Ok(connection) => Some(connection),
                    Err(error) => {
                        self.connect_failed(error.to_string());
                        None
                    }
                },
            };

            let Some(connection) = connection else {
                if self.pause(config.interval).await {
                    continue;
                }
                break;
            };

            self.connected();

            // `closed()` reports closes that happen from here on, so nothing
            // is missed while the channel request is in flight.
            let channel = tokio::select! {
                biased;
                _ = stop_requested(&mut self.shutdown) => {
                    connection.close().await;
                    break;
                }
                channel = connection.create_channel() => channel,
            };

            match channel {
                Ok(channel) => {
                    #[cfg(feature = "metrics")]
                    counter!("connector_channels_total", "connector" => config.name.clone(), "result" => "success")
                        .increment(1);

                    deliver(&mut handler, Ok(channel));
                }
                Err(error) => {
                    self.channel_failed(error.to_string());
                    deliver(&mut handler, Err(ConnectorError::ChannelCreation(error)));
                }
            }

            let reason = tokio::select! {
                biased;
                _ = stop_requested(&mut self.shutdown) => {
                    connection.close().await;
                    break;
                }
                reason = connection.closed() => reason,
            };
            drop(connection);

            if !config.close_policy.should_reconnect(&reason) {
                self.unhandled_close(reason);
                stop_requested(&mut self.shutdown).await;
                break;
            }

            self.connection_closed(&reason);
            deliver(&mut handler, Err(ConnectorError::ConnectionClosed { reason }));

            self.state.mark_connecting();
            if !self.pause(config.interval).await {
                break;
            }
        }

        self.state.mark_stopped();

        #[cfg(feature = "metrics")]
        gauge!("connector_connected", "connector" => config.name.clone()).set(0.0);

        emit_stopped(&config);
    }

    /// Waits out the retry interval. Returns `false` if stopped meanwhile.
    async fn pause(&mut self, interval: Duration) -> bool {
        tokio::select! {
            biased;
            _ = stop_requested(&mut self.shutdown) => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }

    fn connect_failed(&self, error: String) {
        let attempt = self.state.record_failure();

        #[cfg(feature = "tracing")]
        tracing::warn!(
            connector = %self.config.name,
            attempt,
            error = %error,
            retry_in = ?self.config.interval,
            "cannot connect to broker, retrying"
        );

        #[cfg(feature = "metrics")]
        counter!("connector_connect_attempts_total", "connector" => self.config.name.clone(), "result" => "failure")
            .increment(1);

        self.config
            .event_listeners
            .emit(&ConnectorEvent::ConnectFailed {
                connector: self.config.name.clone(),
                timestamp: Instant::now(),
                attempt,
                error,
                retry_in: self.config.interval,
            });
    }

    fn connected(&self) {
        let attempts = self.state.mark_connected();

        #[cfg(feature = "tracing")]
        tracing::info!(connector = %self.config.name, attempts, "connected to broker");

        #[cfg(feature = "metrics")]
        {
            counter!("connector_connect_attempts_total", "connector" => self.config.name.clone(), "result" => "success")
                .increment(1);
            gauge!("connector_connected", "connector" => self.config.name.clone()).set(1.0);
        }

        self.config.event_listeners.emit(&ConnectorEvent::Connected {
            connector: self.config.name.clone(),
            timestamp: Instant::now(),
            attempts,
        });
    }

    fn channel_failed(&self, error: String) {
        #[cfg(feature = "tracing")]
        tracing::warn!(connector = %self.config.name, error = %error, "failed to create channel");

        #[cfg(feature = "metrics")]
        counter!("connector_channels_total", "connector" => self.config.name.clone(), "result" => "failure")
            .increment(1);

        self.config
            .event_listeners
            .emit(&ConnectorEvent::ChannelFailed {
                connector: self.config.name.clone(),
                timestamp: Instant::now(),
                error,
            });
    }

    fn connection_closed(&self, reason: &CloseReason) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            connector = %self.config.name,
            reason = %reason,
            retry_in = ?self.config.interval,
            "connection to broker closed"
        );

        #[cfg(feature = "metrics")]
        {
            counter!("connector_connections_closed_total", "connector" => self.config.name.clone(), "kind" => "reconnect")
                .increment(1);
            gauge!("connector_connected", "connector" => self.config.name.clone()).set(0.0);
        }

        self.config
            .event_listeners
            .emit(&ConnectorEvent::ConnectionClosed {
                connector: self.config.name.clone(),
                timestamp: Instant::now(),
                reason: reason.clone(),
                retry_in: self.config.interval,
            });
    }

    fn unhandled_close(&self, reason: CloseReason) {
        self.state.mark_disconnected();

        #[cfg(feature = "tracing")]
        tracing::warn!(
            connector = %self.config.name,
            reason = %reason,
            "connection closed with a reason the close policy does not reconnect"
        );

        #[cfg(feature = "metrics")]
        {
            counter!("connector_connections_closed_total", "connector" => self.config.name.clone(), "kind" => "unhandled")
                .increment(1);
            gauge!("connector_connected", "connector" => self.config.name.clone()).set(0.0);
        }

        self.config
            .event_listeners
            .emit(&ConnectorEvent::UnhandledClose {
                connector: self.config.name.clone(),
                timestamp: Instant::now(),
                reason,
            });
    }
}

async fn connect<M>(make: &mut M, address: &str) -> Result<M::Response, M::Error>
where
    M: Service<String>,
{
    make.ready().await?.call(address.to_string()).await
}

/// Resolves once `stop` was called or the connector was dropped.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Calls the handler, keeping a panicking handler from taking the task down.
fn deliver<T, H>(handler: &mut H, result: T)
where
    H: FnMut(T),
{
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(result)));
}

fn emit_stopped(config: &ConnectorConfig) {
    #[cfg(feature = "tracing")]
    tracing::info!(connector = %config.name, "connector stopped");

    config.event_listeners.emit(&ConnectorEvent::Stopped {
        connector: config.name.clone(),
        timestamp: Instant::now(),
    });
}
