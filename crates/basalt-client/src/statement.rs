//! Statements, per-call options, and batches

use crate::error::{Error, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many replicas must acknowledge before a request completes.
///
/// Enforcement is delegated to the transport; the client only carries the
/// level on each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Consistency {
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalOne,
    LocalQuorum,
    EachQuorum,
}

/// System-wide fallbacks applied when neither the call site nor the client
/// configuration sets an option.
pub(crate) const SYSTEM_CONSISTENCY: Consistency = Consistency::LocalQuorum;
pub(crate) const SYSTEM_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
pub(crate) const SYSTEM_PAGE_SIZE: usize = 5000;

/// Per-call statement options
///
/// Every field is optional; unset fields fall through to the client defaults
/// and then to the system defaults. Precedence is always
/// call-site > client default > system default, resolved once per request by
/// [`StatementOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOptions {
    /// Consistency level for this request
    pub consistency: Option<Consistency>,
    /// Client-side request timeout
    pub timeout: Option<Duration>,
    /// Whether the statement is safe to retry on a different node
    pub idempotent: Option<bool>,
    /// Prepare the statement before executing it
    pub prepare: Option<bool>,
    /// Rows per server page
    pub page_size: Option<usize>,
}

impl StatementOptions {
    /// Field-wise overlay: values set on `self` win over `fallback`.
    pub fn or(&self, fallback: &StatementOptions) -> StatementOptions {
        StatementOptions {
            consistency: self.consistency.or(fallback.consistency),
            timeout: self.timeout.or(fallback.timeout),
            idempotent: self.idempotent.or(fallback.idempotent),
            prepare: self.prepare.or(fallback.prepare),
            page_size: self.page_size.or(fallback.page_size),
        }
    }

    /// Resolve against the client defaults and the system defaults into a
    /// fully-populated option set.
    pub(crate) fn resolve(&self, client_defaults: &StatementOptions) -> ExecOptions {
        let merged = self.or(client_defaults);
        ExecOptions {
            consistency: merged.consistency.unwrap_or(SYSTEM_CONSISTENCY),
            timeout: merged.timeout.unwrap_or(SYSTEM_REQUEST_TIMEOUT),
            idempotent: merged.idempotent.unwrap_or(false),
            prepare: merged.prepare.unwrap_or(true),
            page_size: merged.page_size.unwrap_or(SYSTEM_PAGE_SIZE),
        }
    }
}

/// Fully-resolved options attached to a request going over the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOptions {
    pub consistency: Consistency,
    pub timeout: Duration,
    pub idempotent: bool,
    pub prepare: bool,
    pub page_size: usize,
}

/// A query/command template with bound parameters and per-call options
///
/// Immutable once submitted to the client.
#[derive(Debug, Clone)]
pub struct Statement {
    text: String,
    params: Vec<Value>,
    options: StatementOptions,
}

impl Statement {
    /// Create a statement from query text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            options: StatementOptions::default(),
        }
    }

    /// Bind positional parameters
    pub fn bind(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Replace the per-call options wholesale
    pub fn with_options(mut self, options: StatementOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the consistency level for this call
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.options.consistency = Some(consistency);
        self
    }

    /// Mark the statement idempotent, allowing retries on a different node
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.options.idempotent = Some(idempotent);
        self
    }

    /// Set the client-side timeout for this call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set the server page size for this call
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.options.page_size = Some(page_size);
        self
    }

    /// Query text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound parameters
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Per-call options
    pub fn options(&self) -> &StatementOptions {
        &self.options
    }

    /// Whether the statement is a mutation (INSERT, UPDATE, or DELETE)
    ///
    /// Detection is keyword-based on the leading token. Batches only admit
    /// mutations; the check runs client-side before any node is contacted.
    pub fn is_mutation(&self) -> bool {
        let first = self
            .text
            .split_whitespace()
            .next()
            .map(|word| word.to_ascii_uppercase());
        matches!(first.as_deref(), Some("INSERT" | "UPDATE" | "DELETE"))
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::new(text)
    }
}

/// An ordered sequence of mutations executed all-or-nothing against a single
/// coordinator node.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    statements: Vec<Statement>,
    options: StatementOptions,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement to the batch
    pub fn add(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Set the options applied to the whole batch
    pub fn with_options(mut self, options: StatementOptions) -> Self {
        self.options = options;
        self
    }

    /// Statements in submission order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Options applied to the whole batch
    pub fn options(&self) -> &StatementOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Reject the batch if it is empty or contains a non-mutation statement.
    ///
    /// Runs before dispatch, so a malformed batch never reaches a node.
    pub fn validate(&self) -> Result<()> {
        if self.statements.is_empty() {
            return Err(Error::BatchValidation("batch contains no statements".to_string()));
        }
        for statement in &self.statements {
            if !statement.is_mutation() {
                return Err(Error::BatchValidation(format!(
                    "only INSERT, UPDATE, and DELETE statements are allowed in a batch (got: {})",
                    statement.text()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_detection() {
        assert!(Statement::new("INSERT INTO t (a) VALUES (?)").is_mutation());
        assert!(Statement::new("  update t SET a = ? WHERE k = ?").is_mutation());
        assert!(Statement::new("DELETE FROM t WHERE k = ?").is_mutation());
        assert!(!Statement::new("SELECT * FROM t").is_mutation());
        assert!(!Statement::new("").is_mutation());
    }

    #[test]
    fn test_batch_rejects_reads() {
        let batch = Batch::new()
            .add("UPDATE employees SET name = 'ross' WHERE eid = 11")
            .add("SELECT * FROM employees");

        let err = batch.validate().unwrap_err();
        assert!(matches!(err, Error::BatchValidation(_)));
        assert!(err.to_string().contains("SELECT"));
    }

    #[test]
    fn test_batch_rejects_empty() {
        assert!(matches!(
            Batch::new().validate(),
            Err(Error::BatchValidation(_))
        ));
    }

    #[test]
    fn test_batch_of_mutations_passes() {
        let batch = Batch::new()
            .add("UPDATE employees SET name = 'ross' WHERE eid = 11")
            .add("DELETE FROM employees WHERE eid = 12");
        assert!(batch.validate().is_ok());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_option_precedence_call_site_wins() {
        let client_defaults = StatementOptions {
            consistency: Some(Consistency::One),
            idempotent: Some(true),
            page_size: Some(100),
            ..Default::default()
        };
        let call_site = StatementOptions {
            consistency: Some(Consistency::Quorum),
            ..Default::default()
        };

        let resolved = call_site.resolve(&client_defaults);
        // call-site beats client default
        assert_eq!(resolved.consistency, Consistency::Quorum);
        // client default beats system default
        assert!(resolved.idempotent);
        assert_eq!(resolved.page_size, 100);
        // system defaults fill the rest
        assert_eq!(resolved.timeout, SYSTEM_REQUEST_TIMEOUT);
        assert!(resolved.prepare);
    }

    #[test]
    fn test_system_defaults() {
        let resolved = StatementOptions::default().resolve(&StatementOptions::default());
        assert_eq!(resolved.consistency, Consistency::LocalQuorum);
        assert_eq!(resolved.page_size, SYSTEM_PAGE_SIZE);
        assert!(!resolved.idempotent);
        assert!(resolved.prepare);
    }
}
