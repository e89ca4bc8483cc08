//! Shared handler state and production wiring.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use ndt_writeback_core::{
    BuildingDirectory, DispatchMode, EventSinkDispatcher, FixedIdentity, IdentityProvider,
    PrefixRegistry, RuntimeSettings, SecurityLabel, SparqlEndpoint, SubtypeResolver,
    UpdateDispatcher, WriteBackService,
};
use ndt_writeback_http::{
    build_client, AccessClient, BufferedEventSink, Datasets, DirectUpdateDispatcher,
    HttpRecordTransport, SparqlHttpClient,
};

use crate::config::ServerConfig;

const SINK_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WriteBackService>,
    pub buildings: Arc<BuildingDirectory>,
}

impl AppState {
    pub fn new(service: Arc<WriteBackService>, buildings: Arc<BuildingDirectory>) -> Self {
        Self { service, buildings }
    }

    /// Wire the HTTP adapters. In event-sink mode the forwarding task is
    /// spawned here and its handle returned.
    pub fn from_config(cfg: &ServerConfig) -> anyhow::Result<(Self, Option<JoinHandle<()>>)> {
        let prefixes = Arc::new(PrefixRegistry::with_defaults(&cfg.data_uri));
        let http = build_client(cfg.request_timeout)?;

        let endpoint: Arc<dyn SparqlEndpoint> = Arc::new(SparqlHttpClient::new(
            http.clone(),
            &cfg.store_url,
            Datasets {
                ontology: cfg.ontology_dataset.clone(),
                knowledge: cfg.knowledge_dataset.clone(),
            },
            Arc::clone(&prefixes),
        ));

        let identity: Arc<dyn IdentityProvider> = if cfg.dev {
            tracing::warn!("DEV mode: every caller is the fixed development user");
            Arc::new(FixedIdentity::development())
        } else {
            Arc::new(AccessClient::new(http.clone(), &cfg.access_url))
        };

        let (dispatcher, forwarder): (Arc<dyn UpdateDispatcher>, Option<JoinHandle<()>>) =
            match cfg.update_mode {
                DispatchMode::Direct => (
                    Arc::new(DirectUpdateDispatcher::new(
                        http.clone(),
                        &cfg.store_url,
                        &cfg.knowledge_dataset,
                        Arc::clone(&prefixes),
                    )),
                    None,
                ),
                DispatchMode::EventSink => {
                    let transport =
                        HttpRecordTransport::new(http.clone(), &cfg.sink_url, &cfg.sink_topic);
                    tracing::info!(url = transport.url(), "event sink transport");
                    let (sink, handle) = BufferedEventSink::spawn(
                        Arc::new(transport),
                        cfg.sink_buffer,
                        cfg.sink_max_attempts,
                        SINK_BACKOFF,
                    );
                    (
                        Arc::new(EventSinkDispatcher::new(Arc::new(sink))),
                        Some(handle),
                    )
                }
            };

        let settings = Arc::new(RuntimeSettings::new(
            SecurityLabel::official(),
            cfg.data_uri.clone(),
        ));
        let subtypes = Arc::new(SubtypeResolver::new(
            Arc::clone(&endpoint),
            Arc::clone(&prefixes),
        ));
        let service = Arc::new(WriteBackService::new(
            identity,
            subtypes,
            dispatcher,
            settings,
            Arc::clone(&prefixes),
        ));
        let buildings = Arc::new(BuildingDirectory::new(endpoint, prefixes));

        Ok((Self::new(service, buildings), forwarder))
    }
}
