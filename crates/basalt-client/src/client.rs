//! Client construction and statement execution
//!
//! The client wires the execution path together: statements resolve their
//! options, the retry coordinator classifies failures, the pool selects
//! coordinators, and every call reports through the event sink.

use crate::concurrent::{ConcurrentJobSet, ConcurrentOptions, Outcome};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::events::{Emitter, EventSink, TracingSink};
use crate::pool::{ConnectionPool, PoolStats, PooledConnection, Route};
use crate::retry::{RetryDecision, RetryTarget};
use crate::statement::{Batch, ExecOptions, Statement};
use crate::stream::{spawn_pump, CancelHandle, RowStream};
use crate::transport::{
    NodeTransport, RequestPayload, StatementRequest, TransportError, TransportResponse,
};
use crate::types::{ExecutionResult, Value};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Asynchronous wide-column-store client
///
/// Construction resolves the configuration once; the connected client is
/// immutable. All operations are safe to call concurrently from many tasks.
///
/// # Example
///
/// ```ignore
/// use basalt_client::{Client, ClientConfig, Statement, Value};
///
/// let config = ClientConfig::builder()
///     .client_name("payments-worker")
///     .contact_points(vec!["10.0.0.1:9042".into(), "10.0.0.2:9042".into()])
///     .keyspace("payments")
///     .local_datacenter("us-east-1")
///     .build();
///
/// let client = Client::connect(config, transport).await?;
/// let result = client
///     .execute(Statement::new("SELECT * FROM ledger WHERE id = ?").bind(vec![Value::Int(7)]))
///     .await?;
/// ```
pub struct Client {
    config: ClientConfig,
    pool: ConnectionPool,
    emitter: Emitter,
}

impl Client {
    /// Connect using the default event sink (events go to `tracing`).
    pub async fn connect(config: ClientConfig, transport: Arc<dyn NodeTransport>) -> Result<Self> {
        Self::connect_with_sink(config, transport, Arc::new(TracingSink)).await
    }

    /// Connect with an application-provided event sink.
    ///
    /// Startup fails with [`Error::Connection`] only when no contact point is
    /// reachable; individual unreachable nodes are left to the health probe.
    pub async fn connect_with_sink(
        config: ClientConfig,
        transport: Arc<dyn NodeTransport>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let emitter = Emitter::new(sink, &config.client_name);
        info!(
            client = %config.client_name,
            contact_points = ?config.contact_points,
            keyspace = %config.keyspace,
            "connecting to cluster"
        );
        let pool = ConnectionPool::connect(&config, transport, emitter.clone()).await?;
        emitter.log(
            "connected",
            json!({
                "contact_points": config.contact_points,
                "keyspace": config.keyspace,
            }),
        );
        Ok(Self {
            config,
            pool,
            emitter,
        })
    }

    /// Identity of this client instance, attached to every event.
    pub fn client_id(&self) -> &str {
        self.emitter.client_id()
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Point-in-time pool state: node health and in-flight counts.
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Execute a single statement.
    ///
    /// Routed through the retry coordinator and the pool. Rows returned are
    /// at most one server page; use [`Client::stream_rows`] for full result
    /// sets.
    pub async fn execute(&self, statement: Statement) -> Result<ExecutionResult> {
        let opts = statement.options().resolve(&self.config.default_options);
        let request = StatementRequest {
            payload: RequestPayload::Query {
                text: statement.text().to_string(),
                params: statement.params().to_vec(),
            },
            options: opts.clone(),
            paging_state: None,
        };
        self.run_and_report(request, opts, None).await
    }

    /// Execute a single statement with caller-side cancellation.
    ///
    /// Once cancellation is observed the operation releases its pool slot,
    /// surfaces [`Error::Cancelled`], and is never retried.
    pub async fn execute_cancellable(
        &self,
        statement: Statement,
        cancel: &CancelHandle,
    ) -> Result<ExecutionResult> {
        let opts = statement.options().resolve(&self.config.default_options);
        let request = StatementRequest {
            payload: RequestPayload::Query {
                text: statement.text().to_string(),
                params: statement.params().to_vec(),
            },
            options: opts.clone(),
            paging_state: None,
        };
        self.run_and_report(request, opts, Some(cancel)).await
    }

    /// Execute a statement and deserialize all rows into typed structs.
    pub async fn query_as<T: serde::de::DeserializeOwned>(
        &self,
        statement: Statement,
    ) -> Result<Vec<T>> {
        self.execute(statement).await?.deserialize_rows()
    }

    /// Execute a batch of mutations atomically against one coordinator.
    ///
    /// The batch is validated client-side before dispatch: any non-mutation
    /// statement rejects the whole batch with [`Error::BatchValidation`]
    /// without contacting a node.
    pub async fn batch(&self, batch: Batch) -> Result<ExecutionResult> {
        if let Err(err) = batch.validate() {
            self.emitter.error(
                "batch rejected",
                json!({ "statements": batch.len(), "error": err.to_string() }),
            );
            return Err(err);
        }
        let opts = batch.options().resolve(&self.config.default_options);
        let statements = batch
            .statements()
            .iter()
            .map(|statement| (statement.text().to_string(), statement.params().to_vec()))
            .collect();
        let request = StatementRequest {
            payload: RequestPayload::Batch { statements },
            options: opts.clone(),
            paging_state: None,
        };
        self.run_and_report(request, opts, None).await
    }

    /// Execute a query and stream its rows page by page.
    ///
    /// The first page is fetched eagerly (with retries per the configured
    /// policy); subsequent pages are fetched lazily on the same coordinator
    /// as the stream is consumed. Later page fetches are never retried,
    /// since the paging state is bound to that coordinator: a mid-stream
    /// failure terminates the stream with one terminal error. Cancelling or
    /// dropping the stream stops delivery and returns the connection to the
    /// pool.
    pub async fn stream_rows(&self, statement: Statement) -> Result<RowStream> {
        let opts = statement.options().resolve(&self.config.default_options);
        let cancel = CancelHandle::new();
        let request = StatementRequest {
            payload: RequestPayload::Query {
                text: statement.text().to_string(),
                params: statement.params().to_vec(),
            },
            options: opts.clone(),
            paging_state: None,
        };

        let started = Instant::now();
        match self.run_statement(&request, &opts, Some(&cancel)).await {
            Ok((conn, initial)) => {
                debug!(
                    query = %statement.text(),
                    node = %conn.node_addr(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "row stream opened"
                );
                Ok(spawn_pump(conn, request, initial, cancel, self.emitter.clone()))
            }
            Err(err) => {
                self.emitter.error(
                    "statement failed",
                    json!({
                        "query": statement.text(),
                        "node": err.node(),
                        "attempts": err.attempts(),
                        "error": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }

    /// Fan one statement template out over a sequence of parameter tuples.
    ///
    /// Keeps exactly the configured number of requests in flight, refilling
    /// as each completes, until the input is exhausted. Outcomes are indexed
    /// by submission order regardless of completion order. A tuple that
    /// exhausts its retries is recorded as a per-tuple failure and does not
    /// abort the rest unless `stop_on_first_error` is set, in which case the
    /// remainder is recorded as [`Outcome::Skipped`].
    pub async fn execute_concurrent<I>(
        &self,
        text: &str,
        params: I,
        options: ConcurrentOptions,
    ) -> ConcurrentJobSet
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let level = options
            .concurrency
            .unwrap_or(self.config.concurrency)
            .max(1);
        let run = |idx: usize, tuple: Vec<Value>| {
            let statement = Statement::new(text)
                .bind(tuple)
                .with_options(options.options.clone());
            async move { (idx, self.execute(statement).await) }
        };

        let mut input = params.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut pending: HashSet<usize> = HashSet::new();
        let mut collected: Vec<(usize, Outcome)> = Vec::new();

        while in_flight.len() < level {
            match input.next() {
                Some((idx, tuple)) => {
                    pending.insert(idx);
                    in_flight.push(run(idx, tuple));
                }
                None => break,
            }
        }

        let mut stopped = false;
        while let Some((idx, result)) = in_flight.next().await {
            pending.remove(&idx);
            match result {
                Ok(res) => collected.push((idx, Outcome::Success(res))),
                Err(err) => {
                    collected.push((idx, Outcome::Failure(err)));
                    if options.stop_on_first_error {
                        stopped = true;
                    }
                }
            }
            if stopped {
                break;
            }
            if let Some((idx, tuple)) = input.next() {
                pending.insert(idx);
                in_flight.push(run(idx, tuple));
            }
        }

        if stopped {
            // abandon in-flight attempts and drain the rest of the input
            drop(in_flight);
            for idx in pending.drain() {
                collected.push((idx, Outcome::Skipped));
            }
            for (idx, _) in input {
                collected.push((idx, Outcome::Skipped));
            }
        }

        let set = ConcurrentJobSet::from_indexed(collected);
        self.emitter.log(
            "concurrent execution finished",
            json!({
                "query": text,
                "total": set.len(),
                "succeeded": set.succeeded(),
                "failed": set.failed(),
                "skipped": set.skipped(),
            }),
        );
        set
    }

    /// Shut the client down: stop accepting work, wait for in-flight
    /// operations up to the configured grace period, then close every
    /// connection.
    pub async fn shutdown(&self) {
        info!(client = %self.client_id(), "shutting down client");
        self.pool.shutdown(self.config.shutdown_grace).await;
        self.emitter.log("client shut down", json!({}));
    }

    async fn run_and_report(
        &self,
        request: StatementRequest,
        opts: ExecOptions,
        cancel: Option<&CancelHandle>,
    ) -> Result<ExecutionResult> {
        let query = request.describe();
        let started = Instant::now();
        match self.run_statement(&request, &opts, cancel).await {
            Ok((conn, response)) => {
                let result = result_from_response(response, conn.node_addr());
                let elapsed_ms = started.elapsed().as_millis() as u64;
                debug!(
                    query = %query,
                    node = %result.coordinator(),
                    elapsed_ms,
                    "statement executed"
                );
                self.emitter.success(
                    "statement executed",
                    json!({
                        "query": query,
                        "node": result.coordinator(),
                        "elapsed_ms": elapsed_ms,
                    }),
                );
                Ok(result)
            }
            Err(err) => {
                self.emitter.error(
                    "statement failed",
                    json!({
                        "query": query,
                        "node": err.node(),
                        "attempts": err.attempts(),
                        "elapsed_ms": started.elapsed().as_millis() as u64,
                        "error": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }

    /// The attempt loop shared by every execution path.
    ///
    /// Returns the connection that served the successful attempt so that
    /// streaming can keep paging on the same coordinator.
    async fn run_statement(
        &self,
        request: &StatementRequest,
        opts: &ExecOptions,
        cancel: Option<&CancelHandle>,
    ) -> Result<(PooledConnection, TransportResponse)> {
        let query = request.describe();
        let policy = self.config.retry_policy;
        let mut attempt: u32 = 0;
        let mut route = Route::Any;
        let mut last_failure: Option<(TransportError, String)> = None;

        loop {
            if let Some(handle) = cancel {
                if handle.is_cancelled() {
                    return Err(Error::Cancelled(query));
                }
            }
            attempt += 1;
            let conn = match self.pool.acquire(&route) {
                Ok(conn) => conn,
                Err(acquire_err) => {
                    // a retry route can dead-end when the target node went
                    // down between attempts; surface the failure that
                    // triggered the retry, not the routing error
                    return Err(match last_failure {
                        Some((err, node)) => {
                            Error::from_transport(err, &node, &query, attempt - 1)
                        }
                        None => acquire_err,
                    });
                }
            };
            let node = conn.node_addr().to_string();

            let outcome = {
                let send = async {
                    match tokio::time::timeout(opts.timeout, conn.channel().send(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(TransportError::Timeout),
                    }
                };
                match cancel {
                    Some(handle) => tokio::select! {
                        _ = handle.cancelled() => None,
                        result = send => Some(result),
                    },
                    None => Some(send.await),
                }
            };
            let Some(result) = outcome else {
                debug!(query = %query, node = %node, "cancelled in flight");
                return Err(Error::Cancelled(query));
            };

            let err = match result {
                Ok(response) => {
                    conn.mark_healthy();
                    return Ok((conn, response));
                }
                Err(err) => err,
            };

            // only a lost channel takes the node out of selection; an
            // unavailable coordinator still holds an open channel and must
            // stay selectable for same-node retries
            match &err {
                TransportError::ConnectionLost(_) => conn.mark_down(),
                TransportError::Timeout
                | TransportError::Unavailable
                | TransportError::Overloaded => conn.mark_degraded(),
                TransportError::Invalid(_) => {}
            }

            match policy.decide(&err, opts.idempotent, attempt) {
                RetryDecision::Retry { delay, target } => {
                    drop(conn);
                    warn!(
                        query = %query,
                        node = %node,
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "retrying statement"
                    );
                    self.emitter.warning(
                        "retrying statement",
                        json!({
                            "query": query,
                            "node": node,
                            "attempt": attempt,
                            "error": err.to_string(),
                            "delay_ms": delay.as_millis() as u64,
                        }),
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    route = match target {
                        RetryTarget::SameNode => Route::Pin(node.clone()),
                        RetryTarget::NextNode => Route::Avoid(node.clone()),
                    };
                    last_failure = Some((err, node));
                }
                RetryDecision::Ignore => {
                    self.emitter.warning(
                        "failure ignored by retry policy",
                        json!({
                            "query": query,
                            "node": node,
                            "attempts": attempt,
                            "error": err.to_string(),
                        }),
                    );
                    return Ok((
                        conn,
                        TransportResponse::Affected {
                            count: 0,
                            warnings: Vec::new(),
                        },
                    ));
                }
                RetryDecision::Rethrow => {
                    drop(conn);
                    return Err(Error::from_transport(err, &node, &query, attempt));
                }
            }
        }
    }
}

fn result_from_response(response: TransportResponse, coordinator: &str) -> ExecutionResult {
    match response {
        TransportResponse::Rows { rows, warnings, .. } => {
            ExecutionResult::new(rows, None, coordinator.to_string(), warnings)
        }
        TransportResponse::Affected { count, warnings } => {
            ExecutionResult::new(Vec::new(), Some(count), coordinator.to_string(), warnings)
        }
    }
}
