//! Scripted broker double shared by the connector tests.

#![allow(dead_code)]

use broker_reconnect::{BrokerConnection, ChannelResult, CloseReason};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::time::Instant;
use tower::Service;

/// What the broker does with the next connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Refuse the connection.
    Refuse,
    /// Accept, and open channels normally.
    Accept,
    /// Accept, but fail every channel request.
    AcceptBrokenChannel,
    /// Never answer.
    Hang,
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<Instant>>,
    addresses: Mutex<Vec<String>>,
    sessions: Mutex<Vec<Session>>,
    live: AtomicUsize,
    peak_live: AtomicUsize,
}

/// Connect service whose answers follow a script, then accept forever.
#[derive(Clone, Default)]
pub struct MockBroker {
    inner: Arc<Inner>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(steps: impl IntoIterator<Item = Step>) -> Self {
        let broker = Self::new();
        broker.push(steps);
        broker
    }

    /// Refuses `n` attempts, then accepts.
    pub fn refusing(n: usize) -> Self {
        Self::scripted(std::iter::repeat(Step::Refuse).take(n))
    }

    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.inner.script.lock().unwrap().extend(steps);
    }

    /// Times at which connect attempts were made.
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.inner.attempts.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.inner.attempts.lock().unwrap().len()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.inner.addresses.lock().unwrap().clone()
    }

    /// Handle to the `n`th accepted connection.
    pub fn session(&self, n: usize) -> Session {
        self.inner.sessions.lock().unwrap()[n].clone()
    }

    pub fn sessions(&self) -> usize {
        self.inner.sessions.lock().unwrap().len()
    }

    /// Connections currently alive (not yet dropped by the connector).
    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub fn peak_live(&self) -> usize {
        self.inner.peak_live.load(Ordering::SeqCst)
    }
}

impl Service<String> for MockBroker {
    type Response = MockConnection;
    type Error = std::io::Error;
    type Future = Pin<Box<dyn Future<Output = Result<MockConnection, std::io::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, address: String) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        inner.attempts.lock().unwrap().push(Instant::now());
        inner.addresses.lock().unwrap().push(address);
        let step = inner
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Accept);

        Box::pin(async move {
            match step {
                Step::Refuse => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
                Step::Hang => std::future::pending().await,
                Step::Accept | Step::AcceptBrokenChannel => {
                    let session = Session {
                        id: inner.sessions.lock().unwrap().len(),
                        closed: Arc::new(watch::Sender::new(None)),
                        closed_by_client: Arc::new(AtomicBool::new(false)),
                    };
                    inner.sessions.lock().unwrap().push(session.clone());
                    let live = inner.live.fetch_add(1, Ordering::SeqCst) + 1;
                    inner.peak_live.fetch_max(live, Ordering::SeqCst);

                    Ok(MockConnection {
                        session,
                        broken_channel: step == Step::AcceptBrokenChannel,
                        inner,
                    })
                }
            }
        })
    }
}

/// Broker-side view of one accepted connection.
#[derive(Clone)]
pub struct Session {
    pub id: usize,
    closed: Arc<watch::Sender<Option<CloseReason>>>,
    closed_by_client: Arc<AtomicBool>,
}

impl Session {
    /// Closes the connection from the broker side.
    pub fn close_with(&self, code: u16, text: &str) {
        self.closed.send_replace(Some(CloseReason::new(code, text)));
    }

    pub fn force_close(&self) {
        self.close_with(320, "CONNECTION_FORCED - broker forced connection closure");
    }

    /// Whether the connector closed this connection itself.
    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

pub struct MockConnection {
    session: Session,
    broken_channel: bool,
    inner: Arc<Inner>,
}

impl BrokerConnection for MockConnection {
    type Channel = usize;
    type Error = std::io::Error;

    async fn create_channel(&self) -> Result<usize, std::io::Error> {
        if self.broken_channel {
            Err(std::io::Error::other("channel_max reached"))
        } else {
            Ok(self.session.id)
        }
    }

    async fn closed(&self) -> CloseReason {
        let mut rx = self.session.closed.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                return CloseReason::connection_forced("dropped");
            }
        }
    }

    async fn close(&self) {
        self.session.closed_by_client.store(true, Ordering::SeqCst);
        self.session.closed.send_replace(Some(CloseReason::normal()));
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.inner.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A handler outcome, reduced to something comparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Channel(usize),
    ChannelFailed,
    Closed(u16),
    Other(String),
}

/// Records every handler invocation with the (simulated) time it happened.
#[derive(Clone, Default)]
pub struct Deliveries {
    log: Arc<Mutex<Vec<(Instant, Outcome)>>>,
}

impl Deliveries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> impl FnMut(ChannelResult<MockConnection>) + Send + 'static {
        let log = Arc::clone(&self.log);
        move |result| {
            let outcome = match result {
                Ok(channel) => Outcome::Channel(channel),
                Err(e) if e.is_channel_creation() => Outcome::ChannelFailed,
                Err(e) => match e.close_reason() {
                    Some(reason) => Outcome::Closed(reason.code()),
                    None => Outcome::Other(e.to_string()),
                },
            };
            log.lock().unwrap().push((Instant::now(), outcome));
        }
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.log.lock().unwrap().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}
