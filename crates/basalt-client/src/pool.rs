//! Connection pool: node health, locality-aware selection, recovery probing
//!
//! The pool owns one channel per contact point. Selection prefers nodes in
//! the configured data center and, among candidates, the node with the
//! fewest in-flight requests. A node marked Down is excluded until the
//! background probe re-opens its channel; probing runs on a fixed interval
//! independent of request traffic.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::events::Emitter;
use crate::transport::{NodeChannel, NodeTransport};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Health state of a node as tracked by the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Node is responsive
    Healthy,
    /// Node recently failed a request but its channel is still open;
    /// selectable at lower preference than Healthy
    Degraded,
    /// Channel is gone; excluded from selection until a probe succeeds
    Down,
}

/// Point-in-time view of one node, exposed through [`PoolStats`]
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub addr: String,
    pub datacenter: Option<String>,
    pub health: Health,
    pub in_flight: usize,
}

/// Point-in-time view of the pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub nodes: Vec<NodeStats>,
    pub total_in_flight: usize,
}

/// Routing constraint for one acquisition
#[derive(Debug, Clone)]
pub(crate) enum Route {
    /// Locality-aware least-in-flight selection over all candidates
    Any,
    /// Only the named node; fails if it is not selectable
    Pin(String),
    /// Prefer any other node; falls back to the named node when it is the
    /// only candidate left
    Avoid(String),
}

struct Node {
    addr: String,
    datacenter: RwLock<Option<String>>,
    health: RwLock<Health>,
    channel: RwLock<Option<Arc<dyn NodeChannel>>>,
    in_flight: AtomicUsize,
}

impl Node {
    fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            datacenter: RwLock::new(None),
            health: RwLock::new(Health::Down),
            channel: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn install_channel(&self, channel: Box<dyn NodeChannel>) {
        *self.datacenter.write() = channel.datacenter().map(|dc| dc.to_string());
        *self.channel.write() = Some(Arc::from(channel));
        *self.health.write() = Health::Healthy;
    }

    fn health(&self) -> Health {
        *self.health.read()
    }

    fn channel(&self) -> Option<Arc<dyn NodeChannel>> {
        self.channel.read().clone()
    }

    fn take_channel(&self) -> Option<Arc<dyn NodeChannel>> {
        self.channel.write().take()
    }

    fn is_local(&self, dc: &str) -> bool {
        self.datacenter.read().as_deref() == Some(dc)
    }
}

struct PoolShared {
    nodes: Vec<Arc<Node>>,
    transport: Arc<dyn NodeTransport>,
    local_dc: String,
    keyspace: String,
    max_inflight_per_node: Option<usize>,
    closed: AtomicBool,
    total_in_flight: AtomicUsize,
    drained: Notify,
    emitter: Emitter,
}

/// The connection pool. Owned by the client; acquisitions are safe under
/// concurrent calls without caller-side locking.
pub(crate) struct ConnectionPool {
    shared: Arc<PoolShared>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionPool {
    /// Open channels to every contact point.
    ///
    /// Unreachable nodes are marked Down and left to the probe loop; only a
    /// cluster with zero reachable nodes fails construction.
    pub(crate) async fn connect(
        config: &ClientConfig,
        transport: Arc<dyn NodeTransport>,
        emitter: Emitter,
    ) -> Result<Self> {
        let mut nodes = Vec::with_capacity(config.contact_points.len());
        let mut reachable = 0usize;

        for addr in &config.contact_points {
            let node = Arc::new(Node::new(addr));
            match transport.open(addr, &config.keyspace).await {
                Ok(channel) => {
                    node.install_channel(channel);
                    reachable += 1;
                    info!(node = %addr, "opened channel");
                }
                Err(err) => {
                    warn!(node = %addr, error = %err, "contact point unreachable at startup");
                    emitter.warning(
                        "contact point unreachable",
                        json!({ "node": addr, "error": err.to_string() }),
                    );
                }
            }
            nodes.push(node);
        }

        if reachable == 0 {
            return Err(Error::Connection(format!(
                "could not reach any of {} contact point(s)",
                config.contact_points.len()
            )));
        }

        let shared = Arc::new(PoolShared {
            nodes,
            transport,
            local_dc: config.local_datacenter.clone(),
            keyspace: config.keyspace.clone(),
            max_inflight_per_node: config.max_inflight_per_node,
            closed: AtomicBool::new(false),
            total_in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
            emitter,
        });

        let probe = tokio::spawn(probe_loop(shared.clone(), config.probe_interval));

        Ok(Self {
            shared,
            probe: Mutex::new(Some(probe)),
        })
    }

    /// Select a node and reserve an in-flight slot on it.
    ///
    /// Never blocks; returns [`Error::NoHealthyNode`] when nothing is
    /// selectable and [`Error::Shutdown`] after shutdown began.
    pub(crate) fn acquire(&self, route: &Route) -> Result<PooledConnection> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Shutdown);
        }

        match self.select(route) {
            Some(conn) => Ok(conn),
            None => match route {
                // retrying "on a different node" degenerates to the same
                // node when the cluster has no other candidate
                Route::Avoid(_) => self
                    .select(&Route::Any)
                    .ok_or_else(|| Error::NoHealthyNode("no selectable node".to_string())),
                Route::Pin(addr) => Err(Error::NoHealthyNode(format!(
                    "pinned node {} is not selectable",
                    addr
                ))),
                Route::Any => Err(Error::NoHealthyNode("no selectable node".to_string())),
            },
        }
    }

    fn select(&self, route: &Route) -> Option<PooledConnection> {
        let shared = &self.shared;
        let mut best: Option<((bool, bool, usize), Arc<Node>, Arc<dyn NodeChannel>)> = None;

        for node in &shared.nodes {
            match route {
                Route::Pin(addr) if node.addr != *addr => continue,
                Route::Avoid(addr) if node.addr == *addr => continue,
                _ => {}
            }
            let health = node.health();
            if health == Health::Down {
                continue;
            }
            let Some(channel) = node.channel() else {
                continue;
            };
            let in_flight = node.in_flight.load(Ordering::SeqCst);
            if let Some(limit) = shared.max_inflight_per_node {
                if in_flight >= limit {
                    continue;
                }
            }
            let key = (
                !node.is_local(&shared.local_dc),
                health == Health::Degraded,
                in_flight,
            );
            if best.as_ref().map_or(true, |(bk, _, _)| key < *bk) {
                best = Some((key, node.clone(), channel));
            }
        }

        best.map(|(_, node, channel)| {
            node.in_flight.fetch_add(1, Ordering::SeqCst);
            shared.total_in_flight.fetch_add(1, Ordering::SeqCst);
            debug!(node = %node.addr, "acquired connection");
            PooledConnection {
                node,
                channel,
                shared: shared.clone(),
            }
        })
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let nodes = self
            .shared
            .nodes
            .iter()
            .map(|node| NodeStats {
                addr: node.addr.clone(),
                datacenter: node.datacenter.read().clone(),
                health: node.health(),
                in_flight: node.in_flight.load(Ordering::SeqCst),
            })
            .collect();
        PoolStats {
            nodes,
            total_in_flight: self.shared.total_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Cooperative shutdown: stop accepting work, wait for in-flight
    /// requests up to `grace`, then force-close every channel.
    pub(crate) async fn shutdown(&self, grace: Duration) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.probe.lock().take() {
            handle.abort();
        }

        let shared = &self.shared;
        let drained = async {
            loop {
                let notified = shared.drained.notified();
                if shared.total_in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(grace, drained).await.is_err() {
            warn!(
                in_flight = shared.total_in_flight.load(Ordering::SeqCst),
                "shutdown grace elapsed with requests still in flight"
            );
        }

        for node in &shared.nodes {
            if let Some(channel) = node.take_channel() {
                channel.close().await;
            }
            *node.health.write() = Health::Down;
        }
        info!("connection pool closed");
    }
}

/// Re-probe Down nodes on a fixed interval, independent of request traffic.
async fn probe_loop(shared: Arc<PoolShared>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // immediate first tick

    loop {
        ticker.tick().await;
        if shared.closed.load(Ordering::SeqCst) {
            return;
        }
        for node in &shared.nodes {
            if node.health() != Health::Down {
                continue;
            }
            match shared.transport.open(&node.addr, &shared.keyspace).await {
                Ok(channel) => {
                    node.install_channel(channel);
                    info!(node = %node.addr, "node recovered");
                    shared
                        .emitter
                        .log("node recovered", json!({ "node": node.addr }));
                }
                Err(err) => {
                    debug!(node = %node.addr, error = %err, "probe failed");
                }
            }
        }
    }
}

/// RAII guard for one acquired connection.
///
/// Dropping the guard releases the in-flight slot on every exit path,
/// including panics and cancellation.
pub(crate) struct PooledConnection {
    node: Arc<Node>,
    channel: Arc<dyn NodeChannel>,
    shared: Arc<PoolShared>,
}

impl PooledConnection {
    pub(crate) fn node_addr(&self) -> &str {
        &self.node.addr
    }

    pub(crate) fn channel(&self) -> &Arc<dyn NodeChannel> {
        &self.channel
    }

    /// Reset Degraded back to Healthy after a successful request
    pub(crate) fn mark_healthy(&self) {
        let mut health = self.node.health.write();
        if *health == Health::Degraded {
            *health = Health::Healthy;
        }
    }

    /// Record a failed request on a node whose channel is still usable
    pub(crate) fn mark_degraded(&self) {
        let mut health = self.node.health.write();
        if *health == Health::Healthy {
            *health = Health::Degraded;
        }
    }

    /// Record loss of the channel; the node leaves selection until a probe
    /// re-opens it
    pub(crate) fn mark_down(&self) {
        *self.node.health.write() = Health::Down;
        if let Some(channel) = self.node.take_channel() {
            tokio::spawn(async move { channel.close().await });
        }
        self.shared
            .emitter
            .warning("node marked down", json!({ "node": self.node.addr }));
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.node.in_flight.fetch_sub(1, Ordering::SeqCst);
        let remaining = self.shared.total_in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 && self.shared.closed.load(Ordering::SeqCst) {
            self.shared.drained.notify_waiters();
        }
    }
}
