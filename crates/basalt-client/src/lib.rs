//! Basalt client library
//!
//! Asynchronous client for a wide-column store: locality-aware connection
//! pooling, opt-in retry policies, cancellable row streaming, and bounded
//! concurrent execution, with application-observable events for every
//! operation.
//!
//! # Quick start
//!
//! ```ignore
//! use basalt_client::{Client, ClientConfig, Statement, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> basalt_client::Result<()> {
//!     let config = ClientConfig::builder()
//!         .client_name("example")
//!         .contact_points(vec!["127.0.0.1:9042".into()])
//!         .keyspace("app")
//!         .local_datacenter("datacenter1")
//!         .build();
//!
//!     let client = Client::connect(config, transport).await?;
//!
//!     let result = client
//!         .execute(
//!             Statement::new("SELECT name, age FROM employees WHERE id = ?")
//!                 .bind(vec![Value::Int(42)]),
//!         )
//!         .await?;
//!
//!     for row in result.rows() {
//!         println!("{:?}", row.get("name"));
//!     }
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Retries
//!
//! The default policy is [`RetryPolicy::FailFast`]: every failure surfaces
//! to the caller after a single attempt. Opt in to retries explicitly:
//!
//! ```ignore
//! use basalt_client::{BackoffPolicy, RetryPolicy};
//!
//! let config = ClientConfig::builder()
//!     .retry_policy(RetryPolicy::Backoff(BackoffPolicy::default()))
//!     .build();
//! ```
//!
//! # Transport
//!
//! The wire protocol is abstracted behind [`NodeTransport`] and
//! [`NodeChannel`]; the client owns everything above it (selection, retry,
//! paging, cancellation, events).

pub mod client;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod events;
pub mod pool;
pub mod retry;
pub mod statement;
pub mod stream;
pub mod transport;
pub mod types;

pub use client::Client;
pub use concurrent::{ConcurrentJobSet, ConcurrentOptions, Outcome};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use events::{ClientEvent, EventKind, EventSink, TracingSink};
pub use pool::{Health, NodeStats, PoolStats};
pub use retry::{BackoffPolicy, RetryDecision, RetryPolicy, RetryTarget};
pub use statement::{Batch, Consistency, Statement, StatementOptions};
pub use stream::{CancelHandle, RowStream};
pub use transport::{
    NodeChannel, NodeTransport, RequestPayload, StatementRequest, TransportError,
    TransportResponse,
};
pub use types::{ExecutionResult, Row, Value};
