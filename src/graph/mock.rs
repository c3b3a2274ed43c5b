//! Scripted in-memory executor for tests.
//!
//! Records every `(query, params)` call and replays queued responses in
//! order. An exhausted queue answers with an empty row set, which is the
//! engine's shape for "matched nothing".

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::graph::{GraphExecutor, Params};

#[derive(Default)]
pub struct MockGraph {
    calls: Mutex<Vec<(String, Params)>>,
    responses: Mutex<VecDeque<Result<Vec<Value>>>>,
}

impl MockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for the next unanswered call.
    pub fn enqueue(&self, rows: Vec<Value>) {
        lock(&self.responses).push_back(Ok(rows));
    }

    /// Queue a failure for the next unanswered call.
    pub fn enqueue_error(&self, error: Error) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(String, Params)> {
        lock(&self.calls).clone()
    }

    /// The most recent call, if any.
    pub fn last_call(&self) -> Option<(String, Params)> {
        lock(&self.calls).last().cloned()
    }
}

#[async_trait]
impl GraphExecutor for MockGraph {
    async fn execute(&self, query: &str, params: Params) -> Result<Vec<Value>> {
        lock(&self.calls).push((query.to_string(), params));
        lock(&self.responses).pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Lock that shrugs off poisoning — a panicked test thread should not
/// cascade into every later assertion.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
