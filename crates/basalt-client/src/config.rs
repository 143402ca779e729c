//! Client configuration
//!
//! Configuration is resolved once at construction and immutable afterwards;
//! changing the contact points requires building a new client.

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::statement::StatementOptions;
use std::time::Duration;
use uuid::Uuid;

/// Immutable configuration for a [`Client`](crate::Client)
///
/// Built via [`ClientConfig::builder`]. Defaults mirror the conservative end
/// of each option: the retry policy defaults to the explicit
/// [`RetryPolicy::FailFast`] variant, so retries only happen when a caller
/// opts in.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Name identifying this client in events and logs
    pub client_name: String,
    /// Ordered cluster node addresses to connect to at startup
    pub contact_points: Vec<String>,
    /// Logical namespace the client operates within
    pub keyspace: String,
    /// Preferred data center for locality-aware node selection
    pub local_datacenter: String,
    /// Retry policy applied to every operation
    pub retry_policy: RetryPolicy,
    /// Client-level statement option defaults (overridden per call)
    pub default_options: StatementOptions,
    /// Default in-flight request bound for `execute_concurrent`
    pub concurrency: usize,
    /// Per-node in-flight cap; `None` leaves backpressure to the transport
    pub max_inflight_per_node: Option<usize>,
    /// Interval between background health probes of Down nodes
    pub probe_interval: Duration,
    /// How long shutdown waits for in-flight work before force-closing
    pub shutdown_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: format!("basalt-{}", &Uuid::new_v4().simple().to_string()[..8]),
            contact_points: vec!["127.0.0.1:9042".to_string()],
            keyspace: String::new(),
            local_datacenter: "datacenter1".to_string(),
            retry_policy: RetryPolicy::FailFast,
            default_options: StatementOptions::default(),
            concurrency: 100,
            max_inflight_per_node: None,
            probe_interval: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a new builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.contact_points.is_empty() {
            return Err(Error::Connection("no contact points configured".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the client name attached to events and logs
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Set the cluster contact points
    pub fn contact_points(mut self, points: Vec<String>) -> Self {
        self.config.contact_points = points;
        self
    }

    /// Set the keyspace used during the connection handshake
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.config.keyspace = keyspace.into();
        self
    }

    /// Set the preferred data center
    pub fn local_datacenter(mut self, dc: impl Into<String>) -> Self {
        self.config.local_datacenter = dc.into();
        self
    }

    /// Select the retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry_policy = policy;
        self
    }

    /// Set client-level statement option defaults
    pub fn default_options(mut self, options: StatementOptions) -> Self {
        self.config.default_options = options;
        self
    }

    /// Set the default concurrency level for `execute_concurrent`
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Cap in-flight requests per node; acquisition fails once every
    /// candidate node is at the cap
    pub fn max_inflight_per_node(mut self, limit: usize) -> Self {
        self.config.max_inflight_per_node = Some(limit);
        self
    }

    /// Set the background health probe interval
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    /// Set the shutdown grace period
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
