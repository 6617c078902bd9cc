//! Connector stress tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use broker_reconnect::ConnectorConfig;
use tokio::time::sleep;

use super::ConcurrencyTracker;
use super::support::{Deliveries, MockBroker, Outcome};

/// Test: A long outage followed by recovery
#[tokio::test(start_paused = true)]
#[ignore]
async fn stress_long_outage() {
    println!("\n=== Connector: 200k refused attempts ===");

    let refusals = 200_000;
    let broker = MockBroker::refusing(refusals);
    let deliveries = Deliveries::new();
    let connector = ConnectorConfig::builder()
        .interval(Duration::from_millis(1))
        .build()
        .unwrap()
        .connector(broker.clone());

    let start = Instant::now();
    connector.start(deliveries.handler()).await.unwrap();
    sleep(Duration::from_millis(refusals as u64 + 10)).await;
    let elapsed = start.elapsed();

    println!("  Attempts: {}", broker.attempts());
    println!("  Wall time: {:?}", elapsed);

    assert_eq!(broker.attempts(), refusals + 1);
    assert_eq!(deliveries.outcomes(), vec![Outcome::Channel(0)]);

    connector.stop().await;
}

/// Test: Thousands of forced closes in a row
#[tokio::test(start_paused = true)]
#[ignore]
async fn stress_close_churn() {
    println!("\n=== Connector: 5k forced closes ===");

    let closes = 5_000;
    let broker = MockBroker::new();
    let deliveries = Deliveries::new();
    let connector = ConnectorConfig::builder()
        .interval(Duration::from_millis(1))
        .build()
        .unwrap()
        .connector(broker.clone());

    let start = Instant::now();
    connector.start(deliveries.handler()).await.unwrap();
    sleep(Duration::from_millis(1)).await;

    for n in 0..closes {
        broker.session(n).force_close();
        sleep(Duration::from_millis(2)).await;
    }
    let elapsed = start.elapsed();

    println!("  Sessions: {}", broker.sessions());
    println!("  Deliveries: {}", deliveries.len());
    println!("  Peak live connections: {}", broker.peak_live());
    println!("  Wall time: {:?}", elapsed);

    assert_eq!(broker.sessions(), closes + 1);
    assert_eq!(deliveries.len(), 2 * closes + 1);
    assert_eq!(broker.peak_live(), 1);

    connector.stop().await;
    assert_eq!(broker.live(), 0);
}

/// Test: Many independent connectors in one process
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_many_connectors() {
    println!("\n=== Connector: 1000 connectors ===");

    let tracker = ConcurrencyTracker::new();
    let count = 1_000;
    let start = Instant::now();
    let mut handles = Vec::new();

    for i in 0..count {
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            tracker.enter();

            let broker = MockBroker::refusing(i % 5);
            let deliveries = Deliveries::new();
            let connector = ConnectorConfig::builder()
                .name(format!("connector-{}", i))
                .interval(Duration::from_millis(5))
                .build()
                .unwrap()
                .connector(broker.clone());

            connector.start(deliveries.handler()).await.unwrap();
            while deliveries.len() == 0 {
                sleep(Duration::from_millis(5)).await;
            }
            connector.stop().await;

            tracker.exit();
            (broker.attempts(), broker.live(), deliveries.outcomes())
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let (attempts, live, outcomes) = handle.await.unwrap();
        assert_eq!(attempts, i % 5 + 1);
        assert_eq!(live, 0);
        assert_eq!(outcomes, vec![Outcome::Channel(0)]);
    }

    println!("  Connectors: {}", count);
    println!("  Peak concurrent: {}", tracker.peak());
    println!("  Time: {:?}", start.elapsed());
}
