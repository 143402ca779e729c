//! Basic usage: connect, execute, batch, and stream rows.
//!
//! Runs against a tiny in-memory transport so the example works without a
//! cluster. Swap `MemoryTransport` for a real driver adapter in production.
//!
//! Run with: cargo run --example basic_usage

use async_trait::async_trait;
use basalt_client::{
    Batch, Client, ClientConfig, NodeChannel, NodeTransport, RequestPayload, RetryPolicy, Row,
    Statement, StatementRequest, TransportError, TransportResponse, Value,
};
use std::sync::Arc;

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

    async fn send(&self, request: &StatementRequest) -> Result<TransportResponse, TransportError> {
        Ok(match &request.payload {
            RequestPayload::Query { .. } => TransportResponse::Rows {
                rows: vec![
                    Row::from_pairs(vec![
                        ("eid".to_string(), Value::Int(1)),
                        ("name".to_string(), Value::Text("kkhatri".to_string())),
                    ]),
                    Row::from_pairs(vec![
                        ("eid".to_string(), Value::Int(2)),
                        ("name".to_string(), Value::Text("lchaplin".to_string())),
                    ]),
                ],
                paging_state: None,
                warnings: Vec::new(),
            },
            RequestPayload::Batch { statements } => TransportResponse::Affected {
                count: statements.len() as u64,
                warnings: Vec::new(),
            },
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
        .client_name("basic-example")
        .contact_points(vec!["127.0.0.1:9042".to_string()])
        .keyspace("company")
        .local_datacenter("dc1")
        .retry_policy(RetryPolicy::FailFast)
        .build();

    let client = Client::connect(config, Arc::new(MemoryTransport)).await?;

    // single statement with a bound parameter
    let result = client
        .execute(
            Statement::new("SELECT eid, name FROM employees WHERE eid = ?")
                .bind(vec![Value::Int(1)]),
        )
        .await?;
    println!("coordinator: {}", result.coordinator());
    for row in result.rows() {
        println!("row: {:?}", row.to_map());
    }

    // batches only admit mutations; validation happens before dispatch
    let batch = Batch::new()
        .add("INSERT INTO employees (eid, name) VALUES (3, 'mturner')")
        .add("UPDATE employees SET name = 'm.turner' WHERE eid = 3");
    let outcome = client.batch(batch).await?;
    println!("batch affected {} row(s)", outcome.affected());

    // lazy streaming, page by page
    let mut stream = client
        .stream_rows(Statement::new("SELECT eid, name FROM employees"))
        .await?;
    while let Some(row) = stream.next().await {
        let row = row?;
        println!(
            "streamed: {}",
            row.get("name").and_then(|v| v.as_str()).unwrap_or("?")
        );
    }

    client.shutdown().await;
    Ok(())
}
