//! Minimal driver: keep one broker connection alive until Ctrl-C.
//!
//! Run with: cargo run --example driver -p broker-reconnect --features tcp,tracing
//!
//! Set `AMQP_URL` to point at a broker (defaults to `amqp://localhost`) and
//! `RUST_LOG=broker_reconnect=debug` to see the connector's own logging.
//! Restarting or stopping the broker shows the reconnect loop at work.

use broker_reconnect::{ConnectorConfig, TcpBroker};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let address = std::env::var("AMQP_URL").unwrap_or_else(|_| "amqp://localhost".to_string());
    println!("Broker Reconnect - Driver\n");
    println!("  Broker: {}", address);
    println!("  Retry interval: 2s\n");

    let connector = ConnectorConfig::builder()
        .name("driver")
        .address(address)
        .interval(Duration::from_secs(2))
        .on_connect_failed(|_, _| println!("Cannot connect to broker! Retrying to connect..."))
        .on_connected(|_| println!("Connected to broker!"))
        .on_connection_closed(|_| println!("Connection to server closed!"))
        .on_unhandled_close(|reason| println!("Connection closed ({}), not reconnecting", reason))
        .build()?
        .connector(TcpBroker::new().connect_timeout(Duration::from_secs(5)));

    connector
        .start(|result| match result {
            Ok(channel) => println!("Yeeehaaa! (channel {})", channel.id()),
            Err(e) if e.is_connection_closed() => {}
            Err(e) => println!("No channel: {}", e),
        })
        .await?;

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");
    connector.stop().await;

    Ok(())
}
