//! NDT write-back core: prefix registry, security labels, subtype resolution,
//! statement building and write orchestration.
//!
//! No HTTP here. The store, the identity service and the event sink are reached
//! through the traits in [`ports`]; `ndt_writeback_http` implements them.

pub mod builders;
pub mod buildings;
pub mod error;
pub mod event_sink;
pub mod identity;
pub mod ontology;
pub mod ports;
pub mod prefixes;
pub mod requests;
pub mod security_label;
pub mod service;
pub mod settings;
pub mod sparql;
pub mod statement;
pub mod subtypes;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod vocab;

pub use buildings::BuildingDirectory;
pub use error::{Result, WriteBackError};
pub use event_sink::EventSinkDispatcher;
pub use identity::FixedIdentity;
pub use ontology::{Hierarchy, OntologyClass};
pub use ports::{
    Actor, Dataset, DispatchMode, EventSink, ForwardedHeaders, IdentityProvider, SinkRecord,
    SparqlEndpoint, UpdateDispatcher,
};
pub use prefixes::PrefixRegistry;
pub use requests::WriteRequest;
pub use security_label::{Classification, SecurityLabel};
pub use service::WriteBackService;
pub use settings::{RuntimeSettings, WriteContext};
pub use statement::{Iri, Statement};
pub use subtypes::SubtypeResolver;
