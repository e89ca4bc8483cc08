//! Buffered event sink.
//!
//! `accept` only puts the record on a bounded channel. A background task drains
//! the channel and hands each record to a [`RecordTransport`], retrying a few
//! times before giving up on it. Failures after acceptance are logged and never
//! reach the caller that wrote the record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ndt_writeback_core::{EventSink, Result, SinkRecord, WriteBackError};

use crate::{base_url, body_excerpt};

/// Delivers one record downstream.
#[async_trait]
pub trait RecordTransport: Send + Sync {
    async fn deliver(&self, record: &SinkRecord) -> Result<()>;
}

pub struct BufferedEventSink {
    tx: mpsc::Sender<SinkRecord>,
}

impl BufferedEventSink {
    /// Start the forwarding task. It runs until every sender is dropped and the
    /// buffer is drained.
    pub fn spawn(
        transport: Arc<dyn RecordTransport>,
        capacity: usize,
        max_attempts: u32,
        backoff: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(forward(rx, transport, max_attempts.max(1), backoff));
        (Self { tx }, handle)
    }
}

#[async_trait]
impl EventSink for BufferedEventSink {
    async fn accept(&self, record: SinkRecord) -> Result<()> {
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                WriteBackError::store("event sink buffer is full")
            }
            mpsc::error::TrySendError::Closed(_) => WriteBackError::store("event sink is closed"),
        })
    }
}

async fn forward(
    mut rx: mpsc::Receiver<SinkRecord>,
    transport: Arc<dyn RecordTransport>,
    max_attempts: u32,
    backoff: Duration,
) {
    tracing::info!(max_attempts, "event sink forwarder started");
    while let Some(record) = rx.recv().await {
        let mut attempt = 1;
        loop {
            match transport.deliver(&record).await {
                Ok(()) => {
                    tracing::debug!(attempt, bytes = record.body.len(), "record delivered");
                    break;
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(attempt, error = %e, "record delivery failed, retrying");
                    tokio::time::sleep(backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        attempt,
                        error = %e,
                        label = record.header("Security-Label").unwrap_or_default(),
                        "record dropped after final delivery attempt"
                    );
                    break;
                }
            }
        }
    }
    tracing::info!("event sink forwarder stopped");
}

// ── HTTP transport ────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RecordHeader<'a> {
    name: &'a str,
    value: &'a str,
}

/// JSON envelope posted for each record.
#[derive(Debug, Serialize)]
struct RecordEnvelope<'a> {
    key: Option<&'a str>,
    headers: Vec<RecordHeader<'a>>,
    value: &'a str,
}

impl<'a> From<&'a SinkRecord> for RecordEnvelope<'a> {
    fn from(record: &'a SinkRecord) -> Self {
        Self {
            key: record.key.as_deref(),
            headers: record
                .headers
                .iter()
                .map(|(name, value)| RecordHeader { name, value })
                .collect(),
            value: &record.body,
        }
    }
}

/// Posts each record to `{sink}/topics/{topic}`.
pub struct HttpRecordTransport {
    http: Client,
    url: String,
}

impl HttpRecordTransport {
    pub fn new(http: Client, sink_url: impl Into<String>, topic: &str) -> Self {
        Self {
            http,
            url: format!("{}/topics/{topic}", base_url(sink_url)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordTransport for HttpRecordTransport {
    async fn deliver(&self, record: &SinkRecord) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&RecordEnvelope::from(record))
            .send()
            .await
            .map_err(|e| WriteBackError::store(format!("sink {} unreachable: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = body_excerpt(response).await;
            return Err(WriteBackError::store_status(
                status.as_u16(),
                format!("sink {} returned {status}: {body}", self.url),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` deliveries, then records.
    struct FlakyTransport {
        failures: usize,
        attempts: AtomicUsize,
        delivered: Mutex<Vec<SinkRecord>>,
    }

    impl FlakyTransport {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecordTransport for FlakyTransport {
        async fn deliver(&self, record: &SinkRecord) -> Result<()> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(WriteBackError::store("flaky"));
            }
            self.delivered.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn record(body: &str) -> SinkRecord {
        SinkRecord {
            headers: vec![("Security-Label".into(), "classification=O".into())],
            key: None,
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn retries_until_delivered() {
        let transport = Arc::new(FlakyTransport::new(2));
        let (sink, handle) =
            BufferedEventSink::spawn(transport.clone(), 4, 3, Duration::from_millis(1));
        sink.accept(record("a")).await.unwrap();
        drop(sink);
        handle.await.unwrap();

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(transport.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_and_moves_on() {
        let transport = Arc::new(FlakyTransport::new(2));
        let (sink, handle) =
            BufferedEventSink::spawn(transport.clone(), 4, 2, Duration::from_millis(1));
        sink.accept(record("dropped")).await.unwrap();
        sink.accept(record("kept")).await.unwrap();
        drop(sink);
        handle.await.unwrap();

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].body, "kept");
    }

    #[tokio::test]
    async fn envelope_keeps_header_order() {
        let mut r = record("<s> <p> <o> .\n");
        r.headers.push(("Content-Type".into(), "application/n-triples".into()));
        let json = serde_json::to_value(RecordEnvelope::from(&r)).unwrap();
        assert_eq!(json["key"], serde_json::Value::Null);
        assert_eq!(json["headers"][0]["name"], "Security-Label");
        assert_eq!(json["headers"][1]["value"], "application/n-triples");
        assert_eq!(json["value"], "<s> <p> <o> .\n");
    }
}
