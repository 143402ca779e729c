//! Narrow boundary to the underlying driver/transport component
//!
//! The client never parses wire bytes. Everything protocol-level (framing,
//! compression, authentication, the query grammar) lives behind this
//! capability set: `open(node) -> channel`, `send(request) -> response`,
//! `close()`. Implementations wrap whatever low-level driver the host
//! application links against; tests use in-memory channels.

use crate::statement::ExecOptions;
use crate::types::{Row, Value};
use async_trait::async_trait;
use thiserror::Error;

/// Structured errors surfaced by the transport
///
/// These are the classification input for the retry coordinator: timeouts and
/// unavailability are retryable subject to idempotency, overload is retryable
/// with backoff, invalid statements are never retried.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("node unavailable")]
    Unavailable,

    #[error("coordinator overloaded")]
    Overloaded,

    #[error("invalid statement: {0}")]
    Invalid(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Payload of a request: a single query or an atomic batch
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Query {
        text: String,
        params: Vec<Value>,
    },
    Batch {
        statements: Vec<(String, Vec<Value>)>,
    },
}

/// A fully-resolved request handed to a channel
#[derive(Debug, Clone)]
pub struct StatementRequest {
    pub payload: RequestPayload,
    pub options: ExecOptions,
    /// Opaque continuation token for fetching the next server page
    pub paging_state: Option<Vec<u8>>,
}

impl StatementRequest {
    /// Short human-readable form for logs and error context
    pub fn describe(&self) -> String {
        match &self.payload {
            RequestPayload::Query { text, .. } => text.clone(),
            RequestPayload::Batch { statements } => {
                format!("BATCH({} statements)", statements.len())
            }
        }
    }
}

/// Structured response from a channel
#[derive(Debug, Clone)]
pub enum TransportResponse {
    /// One server page of rows
    Rows {
        rows: Vec<Row>,
        /// Present when more pages remain
        paging_state: Option<Vec<u8>>,
        warnings: Vec<String>,
    },
    /// Affected-row count for a mutation or batch
    Affected { count: u64, warnings: Vec<String> },
}

/// Factory for channels to individual nodes
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// Open a channel to `addr`, switching to `keyspace` during the handshake.
    async fn open(
        &self,
        addr: &str,
        keyspace: &str,
    ) -> std::result::Result<Box<dyn NodeChannel>, TransportError>;
}

/// One live channel to one node
#[async_trait]
pub trait NodeChannel: Send + Sync {
    /// Data center the node reported during the handshake, if known.
    ///
    /// Nodes with an unknown data center are treated as remote by the pool's
    /// locality-aware selection.
    fn datacenter(&self) -> Option<&str> {
        None
    }

    /// Issue one request and await its structured response.
    async fn send(
        &self,
        request: &StatementRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;

    /// Close the channel. Idempotent.
    async fn close(&self);
}
