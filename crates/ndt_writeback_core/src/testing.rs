//! In-memory port implementations for tests in this workspace.
//!
//! They record what they were asked to do so tests can assert on the exact
//! statements dispatched (or that nothing was dispatched at all).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Result, WriteBackError};
use crate::ports::{
    Actor, Dataset, DispatchMode, EventSink, ForwardedHeaders, IdentityProvider, SinkRecord,
    SparqlEndpoint, UpdateDispatcher,
};
use crate::security_label::SecurityLabel;
use crate::sparql::SparqlResults;
use crate::statement::Statement;

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Identity ──────────────────────────────────────────────────

/// Rejects every caller with the given status, as the access service would.
pub struct DeniedIdentity {
    status: u16,
}

impl DeniedIdentity {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl IdentityProvider for DeniedIdentity {
    async fn resolve(&self, _headers: &ForwardedHeaders) -> Result<Actor> {
        Err(WriteBackError::identity(Some(self.status), "access denied"))
    }
}

// ── SPARQL endpoint ───────────────────────────────────────────

/// Answers every query with a fixed result set (or fails every query).
#[derive(Default)]
pub struct ScriptedEndpoint {
    results: Mutex<Option<SparqlResults>>,
    queries: Mutex<Vec<(Dataset, String)>>,
    calls: AtomicUsize,
}

impl ScriptedEndpoint {
    pub fn returning(results: SparqlResults) -> Self {
        Self {
            results: Mutex::new(Some(results)),
            ..Self::default()
        }
    }

    /// Every query fails with `StoreUnavailable`.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_results(&self, results: SparqlResults) {
        *guard(&self.results) = Some(results);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(Dataset, String)> {
        guard(&self.queries).last().cloned()
    }
}

#[async_trait]
impl SparqlEndpoint for ScriptedEndpoint {
    async fn select(
        &self,
        dataset: Dataset,
        query: &str,
        _headers: &ForwardedHeaders,
    ) -> Result<SparqlResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        guard(&self.queries).push((dataset, query.to_string()));
        guard(&self.results)
            .clone()
            .ok_or_else(|| WriteBackError::store("scripted endpoint is down"))
    }
}

// ── Update dispatcher ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DispatchedUpdate {
    pub statement: Statement,
    pub label: SecurityLabel,
    pub headers: ForwardedHeaders,
}

/// Records every dispatch. Optionally fails them all.
#[derive(Default)]
pub struct RecordingDispatcher {
    dispatched: Mutex<Vec<DispatchedUpdate>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn dispatched(&self) -> Vec<DispatchedUpdate> {
        guard(&self.dispatched).clone()
    }

    pub fn count(&self) -> usize {
        guard(&self.dispatched).len()
    }
}

#[async_trait]
impl UpdateDispatcher for RecordingDispatcher {
    fn mode(&self) -> DispatchMode {
        DispatchMode::Direct
    }

    async fn dispatch(
        &self,
        statement: &Statement,
        label: &SecurityLabel,
        headers: &ForwardedHeaders,
    ) -> Result<()> {
        if self.fail {
            return Err(WriteBackError::store_status(503, "update endpoint refused"));
        }
        guard(&self.dispatched).push(DispatchedUpdate {
            statement: statement.clone(),
            label: label.clone(),
            headers: headers.clone(),
        });
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SinkRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        guard(&self.records).clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn accept(&self, record: SinkRecord) -> Result<()> {
        guard(&self.records).push(record);
        Ok(())
    }
}
