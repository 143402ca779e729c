//! Structured event surface consumed by the host application
//!
//! Every layer reports through a per-client [`EventSink`]; the sink owns no
//! control flow. When the host registers nothing, events fall back to
//! `tracing` at the matching level, tagged with the client identity.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Category of an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Log,
    Warning,
    Error,
    Success,
}

/// A structured event delivered to the registered sink
#[derive(Debug, Clone)]
pub struct ClientEvent {
    /// Identity of the client instance that produced the event
    pub client_id: String,
    pub kind: EventKind,
    pub message: String,
    /// Structured payload (query text, node, timing, ...)
    pub data: JsonValue,
}

/// Injectable sink for client events
///
/// Registered per client instance; there is no process-global sink state.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

/// Default sink: routes events to `tracing` at the level matching the kind.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ClientEvent) {
        match event.kind {
            EventKind::Log | EventKind::Success => {
                info!(client = %event.client_id, data = %event.data, "{}", event.message)
            }
            EventKind::Warning => {
                warn!(client = %event.client_id, data = %event.data, "{}", event.message)
            }
            EventKind::Error => {
                error!(client = %event.client_id, data = %event.data, "{}", event.message)
            }
        }
    }
}

/// Internal handle pairing a sink with the owning client's identity
#[derive(Clone)]
pub(crate) struct Emitter {
    sink: Arc<dyn EventSink>,
    client_id: Arc<str>,
}

impl Emitter {
    pub(crate) fn new(sink: Arc<dyn EventSink>, client_id: &str) -> Self {
        Self {
            sink,
            client_id: Arc::from(client_id),
        }
    }

    pub(crate) fn client_id(&self) -> &str {
        &self.client_id
    }

    fn emit(&self, kind: EventKind, message: impl Into<String>, data: JsonValue) {
        self.sink.emit(ClientEvent {
            client_id: self.client_id.to_string(),
            kind,
            message: message.into(),
            data,
        });
    }

    pub(crate) fn log(&self, message: impl Into<String>, data: JsonValue) {
        self.emit(EventKind::Log, message, data);
    }

    pub(crate) fn warning(&self, message: impl Into<String>, data: JsonValue) {
        self.emit(EventKind::Warning, message, data);
    }

    pub(crate) fn error(&self, message: impl Into<String>, data: JsonValue) {
        self.emit(EventKind::Error, message, data);
    }

    pub(crate) fn success(&self, message: impl Into<String>, data: JsonValue) {
        self.emit(EventKind::Success, message, data);
    }
}
