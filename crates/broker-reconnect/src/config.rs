use crate::broker::CloseReason;
use crate::error::ConfigError;
use crate::events::ConnectorEvent;
use crate::policy::ClosePolicy;
use broker_reconnect_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Broker address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "amqp://localhost";

/// Retry interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for a [`Connector`](crate::Connector).
///
/// The retry interval is fixed for the connector's lifetime: every failed
/// connect and every reconnectable close waits exactly this long, with no
/// jitter, no growth and no attempt limit.
pub struct ConnectorConfig {
    pub(crate) name: String,
    pub(crate) address: String,
    pub(crate) interval: Duration,
    pub(crate) close_policy: ClosePolicy,
    pub(crate) event_listeners: EventListeners<ConnectorEvent>,
}

impl ConnectorConfig {
    /// Creates a new builder.
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::new()
    }

    /// Name used in events, logs and metric labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Broker address handed to the connect service.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Delay between a failure and the next connect attempt.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Which closes are reconnected.
    pub fn close_policy(&self) -> &ClosePolicy {
        &self.close_policy
    }

    /// Wraps `make` in a [`Connector`](crate::Connector) using this configuration.
    pub fn connector<M>(self, make: M) -> crate::Connector<M> {
        crate::Connector::new(make, self)
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            interval: DEFAULT_INTERVAL,
            close_policy: ClosePolicy::default(),
            event_listeners: EventListeners::new(),
        }
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("interval", &self.interval)
            .field("close_policy", &self.close_policy)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`ConnectorConfig`].
pub struct ConnectorConfigBuilder {
    name: String,
    address: String,
    interval: Duration,
    close_policy: ClosePolicy,
    event_listeners: EventListeners<ConnectorEvent>,
}

impl Default for ConnectorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - name: `"<unnamed>"`
    /// - address: `"amqp://localhost"`
    /// - interval: 2 seconds
    /// - close policy: [`ClosePolicy::ForcedOnly`]
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            interval: DEFAULT_INTERVAL,
            close_policy: ClosePolicy::default(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this connector (used in events, logs and metrics).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the broker address passed to the connect service.
    pub fn address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the fixed retry interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use broker_reconnect::ConnectorConfig;
    /// use std::time::Duration;
    ///
    /// let config = ConnectorConfig::builder()
    ///     .interval(Duration::from_millis(500))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.interval(), Duration::from_millis(500));
    /// ```
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets which connection closes are reconnected.
    pub fn close_policy(mut self, policy: ClosePolicy) -> Self {
        self.close_policy = policy;
        self
    }

    /// Reconnects after every close, not only `320 CONNECTION_FORCED`.
    pub fn reconnect_on_any_close(self) -> Self {
        self.close_policy(ClosePolicy::Any)
    }

    /// Registers a listener for every connector event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConnectorEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Registers a callback for failed connect attempts.
    ///
    /// # Callback Signature
    /// `Fn(u32, &str)` - the consecutive attempt number (starting at 1) and
    /// the connect error's message.
    ///
    /// # Examples
    ///
    /// ```
    /// use broker_reconnect::ConnectorConfig;
    ///
    /// let config = ConnectorConfig::builder()
    ///     .on_connect_failed(|attempt, error| {
    ///         eprintln!("connect attempt {} failed: {}", attempt, error);
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn on_connect_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::ConnectFailed { attempt, error, .. } = event {
                f(*attempt, error);
            }
        }));
        self
    }

    /// Registers a callback for established connections.
    ///
    /// # Callback Signature
    /// `Fn(u32)` - how many attempts the connection took.
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::Connected { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback for channel creation failures.
    pub fn on_channel_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::ChannelFailed { error, .. } = event {
                f(error);
            }
        }));
        self
    }

    /// Registers a callback for reconnectable closes.
    pub fn on_connection_closed<F>(mut self, f: F) -> Self
    where
        F: Fn(&CloseReason) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::ConnectionClosed { reason, .. } = event {
                f(reason);
            }
        }));
        self
    }

    /// Registers a callback for closes the close policy does not reconnect.
    pub fn on_unhandled_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&CloseReason) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::UnhandledClose { reason, .. } = event {
                f(reason);
            }
        }));
        self
    }

    /// Registers a callback for when the connector stops.
    pub fn on_stopped<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ConnectorEvent| {
            if let ConnectorEvent::Stopped { .. } = event {
                f();
            }
        }));
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<ConnectorConfig, ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }

        Ok(ConnectorConfig {
            name: self.name,
            address: self.address,
            interval: self.interval,
            close_policy: self.close_policy,
            event_listeners: self.event_listeners,
        })
    }
}
