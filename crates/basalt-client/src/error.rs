//! Error types for the basalt client library

use crate::transport::TransportError;
use thiserror::Error;

/// Result type alias for basalt client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the basalt client
///
/// Terminal failures carry their diagnostic context: the query text,
/// the coordinator node that produced the error, and the number of attempts
/// the retry coordinator made before giving up.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not establish a connection to any contact point at startup
    #[error("failed to connect to cluster: {0}")]
    Connection(String),

    /// No node is currently selectable for a request
    #[error("no healthy node available: {0}")]
    NoHealthyNode(String),

    /// A request exceeded its timeout
    #[error("request to {node} timed out after {attempts} attempt(s) (query: {query})")]
    Timeout {
        node: String,
        query: String,
        attempts: u32,
    },

    /// The coordinator reported overload / backpressure
    #[error("coordinator {node} overloaded after {attempts} attempt(s) (query: {query})")]
    Overloaded {
        node: String,
        query: String,
        attempts: u32,
    },

    /// The statement was rejected as malformed; never retried
    #[error("invalid statement on {node}: {message} (query: {query})")]
    Validation {
        message: String,
        query: String,
        node: String,
        attempts: u32,
    },

    /// A batch was rejected before dispatch
    #[error("batch rejected: {0}")]
    BatchValidation(String),

    /// The caller cancelled an in-flight operation
    #[error("operation cancelled (query: {0})")]
    Cancelled(String),

    /// The client has been shut down; no new work is accepted
    #[error("client is shut down")]
    Shutdown,

    /// Row-to-struct deserialization failed
    #[error("failed to deserialize row: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl Error {
    /// Map a transport-level error into the client taxonomy, attaching the
    /// coordinator identity, query text, and attempt count.
    pub(crate) fn from_transport(
        err: TransportError,
        node: &str,
        query: &str,
        attempts: u32,
    ) -> Self {
        match err {
            TransportError::Timeout => Error::Timeout {
                node: node.to_string(),
                query: query.to_string(),
                attempts,
            },
            TransportError::Overloaded => Error::Overloaded {
                node: node.to_string(),
                query: query.to_string(),
                attempts,
            },
            TransportError::Invalid(message) => Error::Validation {
                message,
                query: query.to_string(),
                node: node.to_string(),
                attempts,
            },
            TransportError::Unavailable => Error::NoHealthyNode(format!(
                "node {} unavailable after {} attempt(s) (query: {})",
                node, attempts, query
            )),
            TransportError::ConnectionLost(message) => Error::NoHealthyNode(format!(
                "connection to {} lost after {} attempt(s): {} (query: {})",
                node, attempts, message, query
            )),
        }
    }

    /// Node identity attached to this error, when one exists.
    pub fn node(&self) -> Option<&str> {
        match self {
            Error::Timeout { node, .. }
            | Error::Overloaded { node, .. }
            | Error::Validation { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Attempt count recorded by the retry coordinator, when one exists.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::Timeout { attempts, .. }
            | Error::Overloaded { attempts, .. }
            | Error::Validation { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
