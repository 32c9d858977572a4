//! In-memory oracles for tests and offline runs.
//!
//! `ScriptedOracle` answers from a fixed table keyed by event name and
//! records every request it sees; `FailingOracle` always errors.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{OracleError, Result};
use crate::oracle::RepairOracle;
use crate::request::RepairRequest;

// ---------------------------------------------------------------------------
// ScriptedOracle
// ---------------------------------------------------------------------------

/// Deterministic oracle that answers by event name.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    answers: HashMap<String, String>,
    fallback: Option<String>,
    calls: Mutex<Vec<RepairRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` whenever `event` is repaired.
    pub fn with_answer(mut self, event: &str, text: &str) -> Self {
        self.answers.insert(event.to_string(), text.to_string());
        self
    }

    /// Answer for events with no scripted entry; otherwise they fail.
    pub fn with_fallback(mut self, text: &str) -> Self {
        self.fallback = Some(text.to_string());
        self
    }

    /// Requests seen so far, in call order.
    pub fn calls(&self) -> Vec<RepairRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl RepairOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn propose(&self, request: &RepairRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        self.answers
            .get(&request.event)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or(OracleError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// FailingOracle
// ---------------------------------------------------------------------------

/// Oracle whose every call fails with an API error.
#[derive(Debug, Default)]
pub struct FailingOracle {
    calls: Mutex<usize>,
}

impl FailingOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl RepairOracle for FailingOracle {
    fn name(&self) -> &str {
        "failing"
    }

    async fn propose(&self, _request: &RepairRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        Err(OracleError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
}
