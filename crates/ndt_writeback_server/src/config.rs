//! Server configuration from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `JENA_PROTOCOL` / `JENA_URL` / `JENA_PORT` | `http` / `localhost` / `3030` |
//! | `ONTO_DATASET` | `ontology` |
//! | `KNOWLEDGE_DATASET` | `knowledge` |
//! | `DATA_URI` | `http://nationaldigitaltwin.gov.uk/data#` |
//! | `UPDATE_MODE` | `KAFKA` (`SCG`/`DIRECT` or `KAFKA`/`EVENT_SINK`) |
//! | `ACCESS_PROTOCOL` / `ACCESS_URL` / `ACCESS_PORT` | `http` / `localhost` / `8091` |
//! | `DEV` | `false` |
//! | `PORT` | `5021` |
//! | `SINK_URL` | `http://localhost:8082` |
//! | `IES_TOPIC` | `knowledge` |
//! | `SINK_BUFFER` | `1024` |
//! | `SINK_MAX_ATTEMPTS` | `2` (total deliveries per record) |
//! | `REQUEST_TIMEOUT_SECS` | `30` |

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use url::Url;

use ndt_writeback_core::{vocab, DispatchMode};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store_url: String,
    pub ontology_dataset: String,
    pub knowledge_dataset: String,
    pub data_uri: String,
    pub update_mode: DispatchMode,
    pub access_url: String,
    pub dev: bool,
    pub port: u16,
    pub sink_url: String,
    pub sink_topic: String,
    pub sink_buffer: usize,
    pub sink_max_attempts: u32,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Tests pass a map instead of the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_url = endpoint(
            "JENA",
            &var("JENA_PROTOCOL", "http"),
            &var("JENA_URL", "localhost"),
            &var("JENA_PORT", "3030"),
        )?;
        let access_url = endpoint(
            "ACCESS",
            &var("ACCESS_PROTOCOL", "http"),
            &var("ACCESS_URL", "localhost"),
            &var("ACCESS_PORT", "8091"),
        )?;
        let sink_url = var("SINK_URL", "http://localhost:8082");
        Url::parse(&sink_url).with_context(|| format!("SINK_URL {sink_url:?} is not a URL"))?;

        Ok(Self {
            store_url,
            ontology_dataset: var("ONTO_DATASET", "ontology"),
            knowledge_dataset: var("KNOWLEDGE_DATASET", "knowledge"),
            data_uri: var("DATA_URI", vocab::DEFAULT_DATA_STUB),
            update_mode: parse_update_mode(&var("UPDATE_MODE", "KAFKA"))?,
            access_url,
            dev: var("DEV", "false").eq_ignore_ascii_case("true"),
            port: parse_or("PORT", lookup("PORT"), 5021),
            sink_url,
            sink_topic: var("IES_TOPIC", "knowledge"),
            sink_buffer: parse_or("SINK_BUFFER", lookup("SINK_BUFFER"), 1024),
            sink_max_attempts: parse_or("SINK_MAX_ATTEMPTS", lookup("SINK_MAX_ATTEMPTS"), 2),
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                lookup("REQUEST_TIMEOUT_SECS"),
                30,
            )),
        })
    }
}

/// `SCG` and `DIRECT` select direct updates; `KAFKA` and `EVENT_SINK` the sink.
pub fn parse_update_mode(value: &str) -> anyhow::Result<DispatchMode> {
    match value.trim().to_ascii_uppercase().as_str() {
        "SCG" | "DIRECT" => Ok(DispatchMode::Direct),
        "KAFKA" | "EVENT_SINK" => Ok(DispatchMode::EventSink),
        other => bail!("unknown UPDATE_MODE {other:?}, expected SCG, DIRECT, KAFKA or EVENT_SINK"),
    }
}

fn endpoint(name: &str, protocol: &str, host: &str, port: &str) -> anyhow::Result<String> {
    let url = format!("{protocol}://{host}:{port}");
    Url::parse(&url).with_context(|| format!("{name} endpoint {url:?} is not a URL"))?;
    Ok(url)
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable value, using default");
            default
        }),
    }
}
