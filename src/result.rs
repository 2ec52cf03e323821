use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A single result row: a semi-structured document.
pub type Row = Map<String, Value>;

/// Metadata reported alongside a materialized result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetaData {
    pub client_context_id: String,
    pub elapsed: Duration,
    pub result_count: usize,
}

/// A fully materialized result set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    rows: Vec<Row>,
    meta_data: QueryMetaData,
}

impl QueryResult {
    pub(crate) fn new(rows: Vec<Row>, client_context_id: String, elapsed: Duration) -> Self {
        let meta_data = QueryMetaData {
            client_context_id,
            elapsed,
            result_count: rows.len(),
        };

        Self { rows, meta_data }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn meta_data(&self) -> &QueryMetaData {
        &self.meta_data
    }

    /// Deserializes every row into `T`.
    ///
    /// A row that does not fit `T` is reported as a `QueryExecution` error
    /// naming its position.
    pub fn rows_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                serde_json::from_value(Value::Object(row.clone()))
                    .map_err(|e| Error::execution(format!("row {index}: {e}")))
            })
            .collect()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
