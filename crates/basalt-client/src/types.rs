//! Row and value types returned by query execution

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    /// Try to convert value to a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to convert value to an i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to convert value to an f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to convert value to a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A row returned from a query
///
/// Column metadata is shared across all rows of a result set.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    /// Create a new row with shared column metadata
    pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Create a row from (column, value) pairs
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        let (columns, values) = pairs.into_iter().unzip();
        Self {
            columns: Arc::new(columns),
            values,
        }
    }

    /// Get value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get value by index
    pub fn get_idx(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Get all column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get all values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Convert row to a HashMap
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    /// Deserialize row into a typed struct
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let json = serde_json::to_value(self.to_map())?;
        Ok(serde_json::from_value(json)?)
    }
}

/// The outcome of a successfully executed statement or batch
///
/// Carries the rows produced (or the affected-row count for mutations), the
/// coordinator node that served the request, and any server warnings.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    rows: Vec<Row>,
    affected: Option<u64>,
    coordinator: String,
    warnings: Vec<String>,
}

impl ExecutionResult {
    pub(crate) fn new(
        rows: Vec<Row>,
        affected: Option<u64>,
        coordinator: String,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            rows,
            affected,
            coordinator,
            warnings,
        }
    }

    /// Rows produced by the statement, in server order
    ///
    /// For a single `execute` call this is at most one server page; use
    /// `Client::stream_rows` to walk a full result set.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume the result, returning its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Affected-row count reported for a mutation, if the server sent one
    pub fn affected(&self) -> u64 {
        self.affected.unwrap_or(0)
    }

    /// The node that coordinated this request
    pub fn coordinator(&self) -> &str {
        &self.coordinator
    }

    /// Server warnings attached to the response
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Deserialize all rows into typed structs
    pub fn deserialize_rows<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| row.deserialize())
            .collect::<std::result::Result<Vec<T>, Error>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_value_conversions() {
        let v = Value::Int(42);
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_f64(), Some(42.0));
        assert!(!v.is_null());

        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.as_i64(), None);

        assert_eq!(Value::from("abc"), Value::Text("abc".to_string()));
        assert_eq!(Value::from(7i64), Value::Int(7));
    }

    #[test]
    fn test_row_access() {
        let row = Row::from_pairs(vec![
            ("eid".to_string(), Value::Int(10)),
            ("name".to_string(), Value::Text("kkhatri".to_string())),
        ]);

        assert_eq!(row.get("eid").and_then(|v| v.as_i64()), Some(10));
        assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("kkhatri"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_idx(0).and_then(|v| v.as_i64()), Some(10));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Employee {
        eid: i64,
        name: String,
    }

    #[test]
    fn test_row_deserialize() {
        let row = Row::from_pairs(vec![
            ("eid".to_string(), Value::Int(10)),
            ("name".to_string(), Value::Text("ross".to_string())),
        ]);

        let employee: Employee = row.deserialize().unwrap();
        assert_eq!(
            employee,
            Employee {
                eid: 10,
                name: "ross".to_string()
            }
        );
    }

    #[test]
    fn test_execution_result_accessors() {
        let result = ExecutionResult::new(Vec::new(), Some(2), "10.0.0.1:9042".to_string(), vec![]);
        assert_eq!(result.affected(), 2);
        assert_eq!(result.coordinator(), "10.0.0.1:9042");
        assert!(result.rows().is_empty());
    }
}
