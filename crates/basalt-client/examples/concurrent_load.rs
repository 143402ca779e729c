//! Bounded concurrent execution of one statement template.
//!
//! Fans 200 parameter tuples out with at most 8 requests in flight against an
//! in-memory transport with simulated latency, then prints the aggregate.
//!
//! Run with: cargo run --example concurrent_load

use async_trait::async_trait;
use basalt_client::{
    Client, ClientConfig, ConcurrentOptions, NodeChannel, NodeTransport, RetryPolicy,
    StatementRequest, TransportError, TransportResponse, Value,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct MemoryTransport;

struct MemoryChannel;

#[async_trait]
impl NodeTransport for MemoryTransport {
    async fn open(
        &self,
        _addr: &str,
        _keyspace: &str,
    ) -> Result<Box<dyn NodeChannel>, TransportError> {
        Ok(Box::new(MemoryChannel))
    }
}

#[async_trait]
impl NodeChannel for MemoryChannel {
    fn datacenter(&self) -> Option<&str> {
        Some("dc1")
    }

    async fn send(&self, _request: &StatementRequest) -> Result<TransportResponse, TransportError> {
        // simulated write latency
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(TransportResponse::Affected {
            count: 1,
            warnings: Vec::new(),
        })
    }

    async fn close(&self) {}
}

#[tokio::main]
async fn main() -> basalt_client::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::builder()
        .client_name("concurrent-example")
        .contact_points(vec!["127.0.0.1:9042".to_string()])
        .keyspace("company")
        .local_datacenter("dc1")
        .retry_policy(RetryPolicy::FailFast)
        .build();

    let client = Client::connect(config, Arc::new(MemoryTransport)).await?;

    let params: Vec<Vec<Value>> = (0..200)
        .map(|i| vec![Value::Int(i), Value::Text(format!("user-{i}"))])
        .collect();

    let started = Instant::now();
    let set = client
        .execute_concurrent(
            "INSERT INTO employees (eid, name) VALUES (?, ?)",
            params,
            ConcurrentOptions {
                concurrency: Some(8),
                ..Default::default()
            },
        )
        .await;
    let elapsed = started.elapsed();

    println!(
        "{} tuples in {:?}: {} succeeded, {} failed, {} skipped",
        set.len(),
        elapsed,
        set.succeeded(),
        set.failed(),
        set.skipped()
    );
    if let Some((idx, err)) = set.first_failure() {
        println!("first failure at tuple {idx}: {err}");
    }

    client.shutdown().await;
    Ok(())
}
