#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use cluster_query::{
    engine::{Engine, EngineRequest, EngineRows},
    Cluster, Error, Parameters, Result, Row,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const BUCKET: &str = "travel-sample";

/// Engine double over an in-memory document list.
///
/// Understands just enough of a statement to be useful in tests:
/// `select` statements with `field=$placeholder` conditions joined by
/// anything, and a trailing `limit n`.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub documents: Vec<Row>,
    pub requests: Mutex<Vec<EngineRequest>>,
    pub produced: Arc<AtomicUsize>,
    pub open_streams: Arc<AtomicUsize>,
    pub gate: Option<Arc<Notify>>,
    pub fail_after: Option<usize>,
    pub close_calls: AtomicUsize,
    pub closed: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            documents: travel_sample(),
            ..Default::default()
        }
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(&self, request: &EngineRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }

    fn matching(&self, request: &EngineRequest) -> Result<Vec<Row>> {
        let text = request.statement.text();
        if !text.trim_start().to_ascii_lowercase().starts_with("select") {
            return Err(Error::QueryExecution(format!("syntax error near '{text}'")));
        }

        let mut conditions = Vec::new();
        for (field, placeholder) in text
            .split_whitespace()
            .filter_map(|token| token.split_once("=$"))
        {
            let value = match &request.parameters {
                Parameters::Positional(values) => placeholder
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| values.get(i)),
                Parameters::Named(values) => values.get(placeholder),
                Parameters::None => None,
            };
            let value = value
                .cloned()
                .ok_or_else(|| Error::QueryExecution(format!("unbound ${placeholder}")))?;
            conditions.push((field.to_string(), value));
        }

        let limit = text
            .split_whitespace()
            .skip_while(|token| !token.eq_ignore_ascii_case("limit"))
            .nth(1)
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        Ok(self
            .documents
            .iter()
            .filter(|doc| {
                conditions
                    .iter()
                    .all(|(field, value)| doc.get(field) == Some(value))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        Ok(name == BUCKET)
    }

    async fn execute(&self, request: EngineRequest) -> Result<Vec<Row>> {
        self.record(&request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.matching(&request)
    }

    async fn stream(&self, request: EngineRequest) -> Result<EngineRows> {
        self.record(&request);

        let rows = self.matching(&request)?;
        let produced = self.produced.clone();
        let guard = StreamGuard::open(self.open_streams.clone());
        let fail_after = self.fail_after;

        let stream = futures::stream::iter(rows.into_iter().enumerate()).map(move |(i, row)| {
            let _open = &guard;
            if Some(i) == fail_after {
                return Err(Error::QueryExecution("index scan timed out".into()));
            }
            produced.fetch_add(1, Ordering::SeqCst);
            Ok(row)
        });

        Ok(stream.boxed())
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Counts open engine cursors.
#[derive(Debug)]
struct StreamGuard(Arc<AtomicUsize>);

impl StreamGuard {
    fn open(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// 15 documents: 8 US airlines, 4 French airlines, 3 US airports.
pub fn travel_sample() -> Vec<Row> {
    let mut docs = Vec::new();

    for i in 0..8 {
        docs.push(row(json!({
            "id": i,
            "type": "airline",
            "name": format!("US Airline {i}"),
            "country": "United States",
        })));
    }
    for i in 8..12 {
        docs.push(row(json!({
            "id": i,
            "type": "airline",
            "name": format!("French Airline {i}"),
            "country": "France",
        })));
    }
    for i in 12..15 {
        docs.push(row(json!({
            "id": i,
            "type": "airport",
            "name": format!("Airport {i}"),
            "country": "United States",
        })));
    }

    docs
}

pub fn cluster() -> (Cluster, Arc<MockEngine>) {
    cluster_with(MockEngine::new())
}

pub fn cluster_with(engine: MockEngine) -> (Cluster, Arc<MockEngine>) {
    let engine = Arc::new(engine);
    let cluster = Cluster::from_shared_engine(engine.clone());
    (cluster, engine)
}
