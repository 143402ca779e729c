//! End-to-end tests for the client against an in-memory transport
//!
//! The transport scripts per-node responses and records every open and send,
//! so the tests can assert on routing, attempt counts, and concurrency
//! bounds without a real cluster.

use async_trait::async_trait;
use basalt_client::{
    BackoffPolicy, Batch, CancelHandle, Client, ClientConfig, ClientEvent, ConcurrentOptions,
    Error, EventKind, EventSink, Health, NodeChannel, NodeTransport, RequestPayload, RetryPolicy,
    Row, Statement, StatementRequest, TransportError, TransportResponse, Value,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type SendResult = Result<TransportResponse, TransportError>;

#[derive(Default)]
struct NodeScript {
    datacenter: Option<String>,
    responses: Mutex<VecDeque<SendResult>>,
}

struct Inner {
    nodes: HashMap<String, Arc<NodeScript>>,
    unreachable: Mutex<HashSet<String>>,
    sends: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

/// In-memory transport. When a node has no scripted response queued, a query
/// echoes its first bound parameter back as a single row and a batch reports
/// one affected row per statement.
#[derive(Clone)]
struct TestTransport {
    inner: Arc<Inner>,
}

impl TestTransport {
    fn new(nodes: &[(&str, &str)]) -> Self {
        Self {
            inner: Arc::new(Inner {
                nodes: nodes
                    .iter()
                    .map(|(addr, dc)| {
                        (
                            addr.to_string(),
                            Arc::new(NodeScript {
                                datacenter: Some(dc.to_string()),
                                responses: Mutex::new(VecDeque::new()),
                            }),
                        )
                    })
                    .collect(),
                unreachable: Mutex::new(HashSet::new()),
                sends: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                latency: Mutex::new(None),
            }),
        }
    }

    fn mark_unreachable(&self, addr: &str) {
        self.inner.unreachable.lock().insert(addr.to_string());
    }

    fn mark_reachable(&self, addr: &str) {
        self.inner.unreachable.lock().remove(addr);
    }

    fn script(&self, addr: &str, result: SendResult) {
        self.inner.nodes[addr].responses.lock().push_back(result);
    }

    fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock() = Some(latency);
    }

    fn send_count(&self) -> usize {
        self.inner.sends.lock().len()
    }

    fn sends(&self) -> Vec<(String, String)> {
        self.inner.sends.lock().clone()
    }

    fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

struct TestChannel {
    addr: String,
    script: Arc<NodeScript>,
    inner: Arc<Inner>,
}

#[async_trait]
impl NodeTransport for TestTransport {
    async fn open(
        &self,
        addr: &str,
        _keyspace: &str,
    ) -> Result<Box<dyn NodeChannel>, TransportError> {
        if self.inner.unreachable.lock().contains(addr) {
            return Err(TransportError::Unavailable);
        }
        let script = self
            .inner
            .nodes
            .get(addr)
            .cloned()
            .ok_or_else(|| TransportError::ConnectionLost(format!("unknown node {addr}")))?;
        Ok(Box::new(TestChannel {
            addr: addr.to_string(),
            script,
            inner: self.inner.clone(),
        }))
    }
}

#[async_trait]
impl NodeChannel for TestChannel {
    fn datacenter(&self) -> Option<&str> {
        self.script.datacenter.as_deref()
    }

    async fn send(&self, request: &StatementRequest) -> SendResult {
        self.inner
            .sends
            .lock()
            .push((self.addr.clone(), request.describe()));

        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let latency = *self.inner.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(scripted) = self.script.responses.lock().pop_front() {
            return scripted;
        }
        Ok(match &request.payload {
            RequestPayload::Query { params, .. } => TransportResponse::Rows {
                rows: vec![Row::from_pairs(vec![(
                    "p0".to_string(),
                    params.first().cloned().unwrap_or(Value::Null),
                )])],
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

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ClientEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ClientEvent) {
        self.events.lock().push(event);
    }
}

fn config(nodes: &[&str], policy: RetryPolicy) -> ClientConfig {
    ClientConfig::builder()
        .client_name("test-client")
        .contact_points(nodes.iter().map(|n| n.to_string()).collect())
        .keyspace("test_ks")
        .local_datacenter("dc1")
        .retry_policy(policy)
        .probe_interval(Duration::from_millis(50))
        .build()
}

async fn connect(transport: &TestTransport, nodes: &[&str], policy: RetryPolicy) -> Client {
    Client::connect(config(nodes, policy), Arc::new(transport.clone()))
        .await
        .unwrap()
}

fn fast_backoff(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::Backoff(BackoffPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
    })
}

fn page(ids: std::ops::Range<i64>, next: Option<&[u8]>) -> SendResult {
    Ok(TransportResponse::Rows {
        rows: ids
            .map(|id| Row::from_pairs(vec![("id".to_string(), Value::Int(id))]))
            .collect(),
        paging_state: next.map(|state| state.to_vec()),
        warnings: Vec::new(),
    })
}

#[tokio::test]
async fn test_execute_returns_rows_from_coordinator() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let result = client
        .execute(Statement::new("SELECT * FROM t WHERE id = ?").bind(vec![Value::Int(42)]))
        .await
        .unwrap();

    assert_eq!(result.coordinator(), "n1");
    assert_eq!(result.rows().len(), 1);
    assert_eq!(
        result.rows()[0].get("p0").and_then(|v| v.as_i64()),
        Some(42)
    );
}

#[tokio::test]
async fn test_fail_fast_makes_exactly_one_attempt() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", Err(TransportError::Overloaded));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let err = client
        .execute(Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Overloaded { attempts: 1, .. }));
    assert_eq!(transport.send_count(), 1);
}

#[tokio::test]
async fn test_retry_exhaustion_reports_attempt_count() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    for _ in 0..3 {
        transport.script("n1", Err(TransportError::Overloaded));
    }
    let client = connect(&transport, &["n1"], fast_backoff(3)).await;

    let err = client
        .execute(Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Overloaded { attempts: 3, .. }));
    assert_eq!(transport.send_count(), 3);
}

#[tokio::test]
async fn test_invalid_statement_never_retried() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script(
        "n1",
        Err(TransportError::Invalid("unknown column nope".to_string())),
    );
    let client = connect(&transport, &["n1"], fast_backoff(5)).await;

    let err = client
        .execute(Statement::new("SELECT nope FROM t"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(transport.send_count(), 1);
}

#[tokio::test]
async fn test_idempotent_timeout_retries_on_next_node() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::Timeout));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    let result = client
        .execute(Statement::new("SELECT 1").idempotent(true))
        .await
        .unwrap();

    assert_eq!(result.coordinator(), "n2");
    let nodes: Vec<String> = transport.sends().into_iter().map(|(node, _)| node).collect();
    assert_eq!(nodes, vec!["n1", "n2"]);
}

#[tokio::test]
async fn test_non_idempotent_timeout_stays_on_same_node() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::Timeout));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    let result = client.execute(Statement::new("SELECT 1")).await.unwrap();

    assert_eq!(result.coordinator(), "n1");
    let nodes: Vec<String> = transport.sends().into_iter().map(|(node, _)| node).collect();
    assert_eq!(nodes, vec!["n1", "n1"]);
}

#[tokio::test]
async fn test_unavailable_degrades_node_but_keeps_it_selectable() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::Unavailable));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    let result = client
        .execute(Statement::new("SELECT 1").idempotent(true))
        .await
        .unwrap();
    assert_eq!(result.coordinator(), "n2");

    // the channel is still open; the node stays selectable for retries
    let stats = client.stats();
    let n1 = stats.nodes.iter().find(|n| n.addr == "n1").unwrap();
    assert_eq!(n1.health, Health::Degraded);
}

#[tokio::test]
async fn test_non_idempotent_unavailable_retries_on_same_node() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::Unavailable));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    let result = client
        .execute(Statement::new("UPDATE t SET a = 1 WHERE k = 1"))
        .await
        .unwrap();

    // the non-idempotent statement never moves to another coordinator
    assert_eq!(result.coordinator(), "n1");
    let nodes: Vec<String> = transport.sends().into_iter().map(|(node, _)| node).collect();
    assert_eq!(nodes, vec!["n1", "n1"]);
}

#[tokio::test]
async fn test_connection_lost_marks_node_down() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::ConnectionLost("reset".to_string())));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    let result = client
        .execute(Statement::new("SELECT 1").idempotent(true))
        .await
        .unwrap();
    assert_eq!(result.coordinator(), "n2");

    let stats = client.stats();
    let n1 = stats.nodes.iter().find(|n| n.addr == "n1").unwrap();
    assert_eq!(n1.health, Health::Down);
}

#[tokio::test]
async fn test_lost_pinned_node_surfaces_transport_failure_not_routing() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.script("n1", Err(TransportError::ConnectionLost("reset".to_string())));
    let client = connect(&transport, &["n1", "n2"], fast_backoff(3)).await;

    // non-idempotent, so the retry is pinned to n1, whose channel is gone
    let err = client
        .execute(Statement::new("UPDATE t SET a = 1 WHERE k = 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoHealthyNode(_)));
    assert!(err.to_string().contains("connection to n1 lost"));
    assert!(err.to_string().contains("1 attempt(s)"));
    // the statement never ran on n2
    assert_eq!(transport.send_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_probe_recovers_down_node() {
    let transport = TestTransport::new(&[("n1", "dc1"), ("n2", "dc1")]);
    transport.mark_unreachable("n2");
    let client = connect(&transport, &["n1", "n2"], RetryPolicy::FailFast).await;

    let n2_health = |client: &Client| {
        client
            .stats()
            .nodes
            .iter()
            .find(|n| n.addr == "n2")
            .unwrap()
            .health
    };
    assert_eq!(n2_health(&client), Health::Down);

    transport.mark_reachable("n2");
    // past the next probe tick
    tokio::time::sleep(Duration::from_millis(120)).await;
    for _ in 0..50 {
        if n2_health(&client) == Health::Healthy {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(n2_health(&client), Health::Healthy);
}

#[tokio::test]
async fn test_batch_rejected_client_side_without_dispatch() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    let sink = Arc::new(RecordingSink::default());
    let client = Client::connect_with_sink(
        config(&["n1"], RetryPolicy::FailFast),
        Arc::new(transport.clone()),
        sink.clone(),
    )
    .await
    .unwrap();

    let batch = Batch::new()
        .add("UPDATE t SET a = 1 WHERE k = 1")
        .add("SELECT * FROM t");
    let err = client.batch(batch).await.unwrap_err();

    assert!(matches!(err, Error::BatchValidation(_)));
    assert_eq!(transport.send_count(), 0);
    assert!(sink
        .events
        .lock()
        .iter()
        .any(|e| e.kind == EventKind::Error && e.message == "batch rejected"));
}

#[tokio::test]
async fn test_batch_of_mutations_executes_atomically() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let batch = Batch::new()
        .add("INSERT INTO t (k) VALUES (1)")
        .add("DELETE FROM t WHERE k = 2");
    let result = client.batch(batch).await.unwrap();

    assert_eq!(result.affected(), 2);
    let sends = transport.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].1, "BATCH(2 statements)");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_respects_bound_and_submission_order() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.set_latency(Duration::from_millis(10));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let params: Vec<Vec<Value>> = (0..10).map(|i| vec![Value::Int(i)]).collect();
    let set = client
        .execute_concurrent(
            "SELECT * FROM t WHERE id = ?",
            params,
            ConcurrentOptions {
                concurrency: Some(3),
                ..Default::default()
            },
        )
        .await;

    assert_eq!(set.len(), 10);
    assert!(set.all_succeeded());
    assert!(transport.max_in_flight() <= 3);
    assert_eq!(transport.max_in_flight(), 3);
    // the i-th outcome echoes the i-th tuple, regardless of completion order
    for (i, outcome) in set.outcomes().iter().enumerate() {
        let result = outcome.result().unwrap();
        assert_eq!(
            result.rows()[0].get("p0").and_then(|v| v.as_i64()),
            Some(i as i64)
        );
    }
}

#[tokio::test]
async fn test_concurrent_stop_on_first_error_skips_remainder() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script(
        "n1",
        Ok(TransportResponse::Affected {
            count: 1,
            warnings: Vec::new(),
        }),
    );
    transport.script("n1", Err(TransportError::Invalid("bad".to_string())));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let params: Vec<Vec<Value>> = (0..4).map(|i| vec![Value::Int(i)]).collect();
    let set = client
        .execute_concurrent(
            "UPDATE t SET a = 1 WHERE id = ?",
            params,
            ConcurrentOptions {
                concurrency: Some(1),
                stop_on_first_error: true,
                ..Default::default()
            },
        )
        .await;

    assert_eq!(set.len(), 4);
    assert!(set.outcomes()[0].is_success());
    assert!(set.outcomes()[1].is_failure());
    assert!(set.outcomes()[2].is_skipped());
    assert!(set.outcomes()[3].is_skipped());
    assert_eq!(set.first_failure().map(|(idx, _)| idx), Some(1));
}

#[tokio::test]
async fn test_concurrent_failure_does_not_abort_remainder() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script(
        "n1",
        Ok(TransportResponse::Affected {
            count: 1,
            warnings: Vec::new(),
        }),
    );
    transport.script("n1", Err(TransportError::Invalid("bad".to_string())));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let params: Vec<Vec<Value>> = (0..4).map(|i| vec![Value::Int(i)]).collect();
    let set = client
        .execute_concurrent(
            "UPDATE t SET a = 1 WHERE id = ?",
            params,
            ConcurrentOptions {
                concurrency: Some(1),
                ..Default::default()
            },
        )
        .await;

    assert_eq!(set.succeeded(), 3);
    assert_eq!(set.failed(), 1);
    assert_eq!(set.skipped(), 0);
    assert!(set.outcomes()[1].is_failure());
}

#[tokio::test]
async fn test_stream_walks_all_pages() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", page(0..2, Some(b"next")));
    transport.script("n1", page(2..3, None));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let mut stream = client
        .stream_rows(Statement::new("SELECT id FROM t"))
        .await
        .unwrap();

    let mut ids = Vec::new();
    while let Some(row) = stream.next().await {
        ids.push(row.unwrap().get("id").and_then(|v| v.as_i64()).unwrap());
    }
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(transport.send_count(), 2);
}

#[tokio::test]
async fn test_stream_cancel_stops_delivery_and_releases_slot() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", page(0..3, Some(b"next")));
    transport.script("n1", page(3..6, None));
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let mut stream = client
        .stream_rows(Statement::new("SELECT id FROM t"))
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get("id").and_then(|v| v.as_i64()), Some(0));
    assert_eq!(second.get("id").and_then(|v| v.as_i64()), Some(1));

    stream.cancel();
    // no row is delivered after cancellation, buffered or not
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());

    // the pump task drops its connection guard, draining the pool
    for _ in 0..100 {
        if client.stats().total_in_flight == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(client.stats().total_in_flight, 0);
}

#[tokio::test]
async fn test_stream_surfaces_terminal_error_once() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", page(0..1, Some(b"next")));
    transport.script(
        "n1",
        Err(TransportError::ConnectionLost("reset by peer".to_string())),
    );
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let mut stream = client
        .stream_rows(Statement::new("SELECT id FROM t"))
        .await
        .unwrap();

    assert!(stream.next().await.unwrap().is_ok());
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::NoHealthyNode(_)));
    assert!(stream.next().await.is_none());

    let stats = client.stats();
    assert_eq!(stats.nodes[0].health, Health::Down);
}

#[tokio::test]
async fn test_cancellable_execute_observes_cancellation() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let cancel = CancelHandle::new();
    cancel.cancel();
    let err = client
        .execute_cancellable(Statement::new("SELECT 1"), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled(_)));
    assert_eq!(transport.send_count(), 0);
}

#[tokio::test]
async fn test_backoff_or_ignore_yields_empty_result() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", Err(TransportError::Overloaded));
    transport.script("n1", Err(TransportError::Overloaded));
    let policy = RetryPolicy::BackoffOrIgnore(BackoffPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
    });
    let client = connect(&transport, &["n1"], policy).await;

    let result = client.execute(Statement::new("SELECT 1")).await.unwrap();

    assert!(result.rows().is_empty());
    assert_eq!(result.affected(), 0);
    assert_eq!(transport.send_count(), 2);
}

#[tokio::test]
async fn test_shutdown_rejects_new_work() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    client.shutdown().await;
    let err = client
        .execute(Statement::new("SELECT 1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Shutdown));
}

#[tokio::test]
async fn test_error_events_carry_query_and_node() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script("n1", Err(TransportError::Timeout));
    let sink = Arc::new(RecordingSink::default());
    let client = Client::connect_with_sink(
        config(&["n1"], RetryPolicy::FailFast),
        Arc::new(transport.clone()),
        sink.clone(),
    )
    .await
    .unwrap();

    let text = "SELECT * FROM employees";
    client.execute(Statement::new(text)).await.unwrap_err();

    let events = sink.events.lock();
    let failure = events
        .iter()
        .find(|e| e.kind == EventKind::Error)
        .expect("a failure event should have been emitted");
    assert_eq!(failure.client_id, "test-client");
    assert_eq!(failure.data["query"], text);
    assert_eq!(failure.data["node"], "n1");
    assert_eq!(failure.data["attempts"], 1);
}

#[tokio::test]
async fn test_validation_failure_keeps_node_and_attempts() {
    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script(
        "n1",
        Err(TransportError::Invalid("unknown column nope".to_string())),
    );
    let sink = Arc::new(RecordingSink::default());
    let client = Client::connect_with_sink(
        config(&["n1"], RetryPolicy::FailFast),
        Arc::new(transport.clone()),
        sink.clone(),
    )
    .await
    .unwrap();

    let err = client
        .execute(Statement::new("SELECT nope FROM t"))
        .await
        .unwrap_err();

    assert_eq!(err.node(), Some("n1"));
    assert_eq!(err.attempts(), Some(1));

    let events = sink.events.lock();
    let failure = events
        .iter()
        .find(|e| e.kind == EventKind::Error)
        .expect("a failure event should have been emitted");
    assert_eq!(failure.data["node"], "n1");
    assert_eq!(failure.data["attempts"], 1);
    assert_eq!(failure.data["query"], "SELECT nope FROM t");
}

#[tokio::test]
async fn test_query_as_deserializes_rows() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Employee {
        eid: i64,
        name: String,
    }

    let transport = TestTransport::new(&[("n1", "dc1")]);
    transport.script(
        "n1",
        Ok(TransportResponse::Rows {
            rows: vec![Row::from_pairs(vec![
                ("eid".to_string(), Value::Int(7)),
                ("name".to_string(), Value::Text("ross".to_string())),
            ])],
            paging_state: None,
            warnings: Vec::new(),
        }),
    );
    let client = connect(&transport, &["n1"], RetryPolicy::FailFast).await;

    let employees: Vec<Employee> = client
        .query_as(Statement::new("SELECT eid, name FROM employees"))
        .await
        .unwrap();

    assert_eq!(
        employees,
        vec![Employee {
            eid: 7,
            name: "ross".to_string()
        }]
    );
}
