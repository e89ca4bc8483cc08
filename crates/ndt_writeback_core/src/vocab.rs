//! Namespaces and terms used by the write-back statements.

pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const TELICENT: &str = "http://telicent.io/ontology/";
pub const IES: &str = "http://ies.data.gov.uk/ontology/ies4#";
pub const NDT_ONT: &str = "http://nationaldigitaltwin.gov.uk/ontology#";
pub const NDT: &str = "http://nationaldigitaltwin.gov.uk/data#";
pub const GP: &str = "https://www.geoplace.co.uk/addresses-streets/location-data/the-uprn#";
pub const EPC: &str =
    "http://gov.uk/government/organisations/department-for-levelling-up-housing-and-communities/ontology/epc#";

/// Default stub for minted data URIs.
pub const DEFAULT_DATA_STUB: &str = NDT;

/// Stub that turns a timestamp into an ISO 8601 period IRI.
pub const ISO8601: &str = "http://iso.org/iso8601#";

pub const GEOHASH: &str = "http://geohash.org/";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Builds an IES term IRI, e.g. `ies("Person")`.
pub fn ies(local: &str) -> String {
    format!("{IES}{local}")
}

pub fn ndt_ont(local: &str) -> String {
    format!("{NDT_ONT}{local}")
}

pub fn ndt(local: &str) -> String {
    format!("{NDT}{local}")
}
