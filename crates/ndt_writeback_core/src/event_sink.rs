//! Event-sink dispatch path.
//!
//! The statement is serialized to N-Triples and handed to an [`EventSink`] as a
//! record whose headers carry the security label. `dispatch` returns as soon as
//! the sink has buffered the record: delivery downstream is at-least-once and
//! eventually consistent, with no durability promise to the caller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::ports::{DispatchMode, EventSink, ForwardedHeaders, SinkRecord, UpdateDispatcher};
use crate::security_label::{SecurityLabel, SECURITY_LABEL_HEADER};
use crate::statement::Statement;

pub const NTRIPLES_CONTENT_TYPE: &str = "application/n-triples";

pub struct EventSinkDispatcher {
    sink: Arc<dyn EventSink>,
}

impl EventSinkDispatcher {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn record(statement: &Statement, label: &SecurityLabel) -> SinkRecord {
        SinkRecord {
            headers: vec![
                (SECURITY_LABEL_HEADER.to_string(), label.serialize()),
                ("Content-Type".to_string(), NTRIPLES_CONTENT_TYPE.to_string()),
            ],
            key: None,
            body: statement.to_ntriples(),
        }
    }
}

#[async_trait]
impl UpdateDispatcher for EventSinkDispatcher {
    fn mode(&self) -> DispatchMode {
        DispatchMode::EventSink
    }

    /// Forwarded auth headers are not part of the record; the sink authenticates
    /// on its own terms.
    async fn dispatch(
        &self,
        statement: &Statement,
        label: &SecurityLabel,
        _headers: &ForwardedHeaders,
    ) -> Result<()> {
        let record = Self::record(statement, label);
        let bytes = record.body.len();
        self.sink.accept(record).await?;
        tracing::debug!(triples = statement.len(), bytes, "update handed to event sink");
        Ok(())
    }
}
