//! Prefix registry: short namespace prefixes and the URI stubs they stand for.
//!
//! Three rules keep queries and responses consistent:
//! 1. every query/update sent to the store starts with [`PrefixRegistry::render_preamble`],
//! 2. every store URI returned to a caller goes through [`PrefixRegistry::shorten`],
//! 3. every caller URI goes through [`PrefixRegistry::lengthen`] before it is embedded.
//!
//! Forgetting (3) does not fail loudly; the query simply matches nothing.

use crate::vocab;

#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    entries: Vec<(String, String)>,
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registrations every deployment uses. `data_stub` is the configured
    /// base for minted data URIs and is registered as `data:`.
    pub fn with_defaults(data_stub: &str) -> Self {
        let mut registry = Self::new();
        registry.register("xsd", vocab::XSD);
        registry.register("dc", vocab::DC);
        registry.register("rdf", vocab::RDF);
        registry.register("rdfs", vocab::RDFS);
        registry.register("owl", vocab::OWL);
        registry.register("telicent", vocab::TELICENT);
        registry.register("ies", vocab::IES);
        registry.register("data", data_stub);
        registry.register("ndt_ont", vocab::NDT_ONT);
        registry.register("ndt", vocab::NDT);
        registry.register("gp", vocab::GP);
        registry.register("epc", vocab::EPC);
        registry
    }

    /// Register a prefix. Re-registering keeps the original position.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = uri,
            None => self.entries.push((prefix, uri)),
        }
    }

    pub fn stub(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// `PREFIX p: <uri>` lines in registration order.
    pub fn render_preamble(&self) -> String {
        self.entries
            .iter()
            .map(|(prefix, uri)| format!("PREFIX {prefix}: <{uri}>\n"))
            .collect()
    }

    /// Prepend the preamble to a query or update body.
    pub fn prefixed(&self, body: &str) -> String {
        let mut out = self.render_preamble();
        out.push_str(body);
        out
    }

    /// Rewrite a full URI to `prefix:local`. The longest matching stub wins;
    /// ties go to the earliest registration. Unregistered URIs pass through.
    pub fn shorten(&self, uri: &str) -> String {
        let mut best: Option<&(String, String)> = None;
        for entry in &self.entries {
            if entry.1.is_empty() || !uri.starts_with(entry.1.as_str()) {
                continue;
            }
            if best.map_or(true, |b| entry.1.len() > b.1.len()) {
                best = Some(entry);
            }
        }
        match best {
            // `prefix://…` would read back as an absolute URI, not a short form.
            Some((prefix, stub)) if !uri[stub.len()..].starts_with("//") => {
                format!("{prefix}:{}", &uri[stub.len()..])
            }
            _ => uri.to_string(),
        }
    }

    /// Expand a leading registered `prefix:` back to its stub. Anything else
    /// (already-absolute URIs, unknown prefixes) passes through.
    pub fn lengthen(&self, short: &str) -> String {
        if let Some((prefix, local)) = short.split_once(':') {
            if let Some(stub) = self.stub(prefix) {
                // `http://…` would otherwise be read as prefix `http`.
                if !local.starts_with("//") {
                    return format!("{stub}{local}");
                }
            }
        }
        short.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PrefixRegistry {
        PrefixRegistry::with_defaults(vocab::DEFAULT_DATA_STUB)
    }

    #[test]
    fn preamble_keeps_insertion_order() {
        let mut r = PrefixRegistry::new();
        r.register("b", "http://b/");
        r.register("a", "http://a/");
        assert_eq!(
            r.render_preamble(),
            "PREFIX b: <http://b/>\nPREFIX a: <http://a/>\n"
        );
    }

    #[test]
    fn reregister_replaces_in_place() {
        let mut r = PrefixRegistry::new();
        r.register("a", "http://a/");
        r.register("b", "http://b/");
        r.register("a", "http://a2/");
        assert_eq!(
            r.render_preamble(),
            "PREFIX a: <http://a2/>\nPREFIX b: <http://b/>\n"
        );
    }

    #[test]
    fn shorten_and_lengthen_ies_terms() {
        let r = registry();
        assert_eq!(r.shorten(&vocab::ies("Person")), "ies:Person");
        assert_eq!(r.lengthen("ies:Person"), vocab::ies("Person"));
    }

    #[test]
    fn shared_stub_shortens_to_first_registration() {
        // `data` and `ndt` share the default stub.
        let r = registry();
        let uri = vocab::ndt("flag1");
        assert_eq!(r.shorten(&uri), "data:flag1");
        assert_eq!(r.lengthen("ndt:flag1"), uri);
        assert_eq!(r.lengthen("data:flag1"), uri);
    }

    #[test]
    fn longest_stub_wins() {
        let mut r = PrefixRegistry::new();
        r.register("ex", "http://example.org/");
        r.register("exv", "http://example.org/vocab#");
        assert_eq!(r.shorten("http://example.org/vocab#Thing"), "exv:Thing");
        assert_eq!(r.shorten("http://example.org/p1"), "ex:p1");
    }

    #[test]
    fn unregistered_forms_pass_through() {
        let r = registry();
        assert_eq!(r.shorten("http://example.org/p1"), "http://example.org/p1");
        assert_eq!(r.lengthen("http://example.org/p1"), "http://example.org/p1");
        assert_eq!(r.lengthen("unknown:thing"), "unknown:thing");
    }

    #[test]
    fn lengthen_inverts_shorten_for_registered_stubs() {
        let r = registry();
        for uri in [
            vocab::ies("AssessToBeFalse"),
            vocab::ndt_ont("BuildingState"),
            format!("{}BuildingWithEnergyRatingOfC", vocab::EPC),
            format!("{}UniquePropertyReferenceNumber", vocab::GP),
            vocab::ndt("1234-5678"),
            format!("{}subClassOf", vocab::RDFS),
            vocab::ies("//weird"),
        ] {
            assert_eq!(r.lengthen(&r.shorten(&uri)), uri);
        }
    }

    #[test]
    fn local_part_starting_with_slashes_is_not_shortened() {
        let r = registry();
        let uri = vocab::ies("//weird");
        assert_eq!(r.shorten(&uri), uri);
    }

    #[test]
    fn prefixed_prepends_preamble() {
        let mut r = PrefixRegistry::new();
        r.register("ies", vocab::IES);
        let q = r.prefixed("SELECT * WHERE { ?s ?p ?o }");
        assert!(q.starts_with("PREFIX ies: <http://ies.data.gov.uk/ontology/ies4#>\n"));
        assert!(q.ends_with("SELECT * WHERE { ?s ?p ?o }"));
    }
}
