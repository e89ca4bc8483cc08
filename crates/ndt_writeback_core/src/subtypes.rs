//! Subtype resolution against the ontology dataset, with a process-wide cache.
//!
//! The cache holds one [`SubtypeTable`] per hierarchy. A refresh builds a new
//! table off to the side and swaps the `Arc` in under the write lock, so
//! concurrent readers see either the old table or the new one, never a
//! half-populated map.
//!
//! Validation policy: a declared type missing from the cache triggers exactly one
//! refresh. If it is still missing the write is rejected. A store failure during
//! that refresh propagates as `StoreUnavailable`; it is never read as "type
//! unknown".

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{Result, WriteBackError};
use crate::ontology::{Hierarchy, OntologyClass, SubtypeTable};
use crate::ports::{Dataset, ForwardedHeaders, SparqlEndpoint};
use crate::prefixes::PrefixRegistry;
use crate::statement::Iri;

pub struct SubtypeResolver {
    endpoint: Arc<dyn SparqlEndpoint>,
    prefixes: Arc<PrefixRegistry>,
    cache: RwLock<HashMap<Hierarchy, Arc<SubtypeTable>>>,
}

impl SubtypeResolver {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, prefixes: Arc<PrefixRegistry>) -> Self {
        Self {
            endpoint,
            prefixes,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Query the store for the hierarchy and replace the cached table.
    pub async fn resolve(
        &self,
        hierarchy: &Hierarchy,
        headers: &ForwardedHeaders,
    ) -> Result<Arc<SubtypeTable>> {
        let results = self
            .endpoint
            .select(Dataset::Ontology, &hierarchy.subclass_query(), headers)
            .await?;
        let table = Arc::new(SubtypeTable::from_results(&results, &self.prefixes));
        tracing::debug!(
            hierarchy = hierarchy.name,
            classes = table.len(),
            "subtype table refreshed"
        );
        self.cache
            .write()
            .await
            .insert(hierarchy.clone(), Arc::clone(&table));
        Ok(table)
    }

    /// Cached table, if this hierarchy has been resolved before.
    pub async fn cached(&self, hierarchy: &Hierarchy) -> Option<Arc<SubtypeTable>> {
        self.cache.read().await.get(hierarchy).cloned()
    }

    /// `declared` may be a short or full URI. Absent after one refresh →
    /// `UnknownType`.
    pub async fn validate_type(
        &self,
        hierarchy: &Hierarchy,
        declared: &str,
        headers: &ForwardedHeaders,
    ) -> Result<OntologyClass> {
        let uri = self.prefixes.lengthen(declared);
        match self.lookup(hierarchy, &uri, headers).await? {
            Some(class) => Ok(class),
            None => Err(WriteBackError::UnknownType(declared.to_string())),
        }
    }

    /// Like [`validate_type`](Self::validate_type) for a caller-supplied
    /// override of a default type. The hierarchy base is always allowed; any
    /// other type must be one of its subclasses, else `InvalidOverride`.
    pub async fn validate_override(
        &self,
        hierarchy: &Hierarchy,
        override_type: &str,
        headers: &ForwardedHeaders,
    ) -> Result<Iri> {
        let uri = self.prefixes.lengthen(override_type);
        if uri == hierarchy.base.as_str() {
            return Ok(hierarchy.base.clone());
        }
        match self.lookup(hierarchy, &uri, headers).await? {
            Some(_) => Iri::parse(uri),
            None => Err(WriteBackError::InvalidOverride {
                override_type: override_type.to_string(),
                base: self.prefixes.shorten(hierarchy.base.as_str()),
            }),
        }
    }

    async fn lookup(
        &self,
        hierarchy: &Hierarchy,
        uri: &str,
        headers: &ForwardedHeaders,
    ) -> Result<Option<OntologyClass>> {
        if let Some(table) = self.cached(hierarchy).await {
            if let Some(class) = table.get(uri) {
                return Ok(Some(class.clone()));
            }
        }
        tracing::debug!(hierarchy = hierarchy.name, uri, "subtype cache miss, refreshing");
        let table = self.resolve(hierarchy, headers).await?;
        Ok(table.get(uri).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::SparqlResults;
    use crate::testing::ScriptedEndpoint;
    use crate::vocab;

    const OPT_OUT: &str = "http://nationaldigitaltwin.gov.uk/ontology#AssessOccupantOptOutOrRefusal";

    fn negative_rows() -> SparqlResults {
        SparqlResults::from_rows([
            vec![
                ("sub", "http://nationaldigitaltwin.gov.uk/ontology#AssessToBeFalse"),
                ("parent", "http://ies.data.gov.uk/ontology/ies4#Assess"),
            ],
            vec![
                ("sub", OPT_OUT),
                ("parent", "http://nationaldigitaltwin.gov.uk/ontology#AssessToBeFalse"),
            ],
        ])
    }

    fn resolver(endpoint: Arc<ScriptedEndpoint>) -> SubtypeResolver {
        SubtypeResolver::new(
            endpoint,
            Arc::new(PrefixRegistry::with_defaults(vocab::DEFAULT_DATA_STUB)),
        )
    }

    #[tokio::test]
    async fn known_type_validates_with_one_query() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(negative_rows()));
        let r = resolver(endpoint.clone());
        let h = Hierarchy::negative_assessment();

        let class = r
            .validate_type(&h, "ndt_ont:AssessOccupantOptOutOrRefusal", &ForwardedHeaders::none())
            .await
            .unwrap();
        assert_eq!(class.uri, OPT_OUT);
        assert_eq!(endpoint.calls(), 1);

        // Second validation is served from the cache.
        r.validate_type(&h, OPT_OUT, &ForwardedHeaders::none())
            .await
            .unwrap();
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_type_refreshes_exactly_once() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(negative_rows()));
        let r = resolver(endpoint.clone());
        let h = Hierarchy::negative_assessment();
        r.resolve(&h, &ForwardedHeaders::none()).await.unwrap();
        assert_eq!(endpoint.calls(), 1);

        let err = r
            .validate_type(&h, "ndt_ont:NotAThing", &ForwardedHeaders::none())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteBackError::UnknownType(ref t) if t == "ndt_ont:NotAThing"));
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_picks_up_new_classes() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(SparqlResults::default()));
        let r = resolver(endpoint.clone());
        let h = Hierarchy::negative_assessment();
        r.resolve(&h, &ForwardedHeaders::none()).await.unwrap();

        endpoint.set_results(negative_rows());
        r.validate_type(&h, OPT_OUT, &ForwardedHeaders::none())
            .await
            .unwrap();
        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn store_failure_is_not_unknown_type() {
        let endpoint = Arc::new(ScriptedEndpoint::failing());
        let r = resolver(endpoint.clone());
        let err = r
            .validate_type(&Hierarchy::assessment(), OPT_OUT, &ForwardedHeaders::none())
            .await
            .unwrap_err();
        assert!(matches!(err, WriteBackError::StoreUnavailable { .. }));
        assert!(r.cached(&Hierarchy::assessment()).await.is_none());
    }

    #[tokio::test]
    async fn override_outside_hierarchy_is_invalid() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(negative_rows()));
        let r = resolver(endpoint.clone());
        let err = r
            .validate_override(
                &Hierarchy::negative_assessment(),
                "ies:AssessToBeTrue",
                &ForwardedHeaders::none(),
            )
            .await
            .unwrap_err();
        match err {
            WriteBackError::InvalidOverride { override_type, base } => {
                assert_eq!(override_type, "ies:AssessToBeTrue");
                assert_eq!(base, "ndt_ont:AssessToBeFalse");
            }
            other => panic!("expected InvalidOverride, got {other:?}"),
        }
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn override_equal_to_base_needs_no_query() {
        let endpoint = Arc::new(ScriptedEndpoint::failing());
        let r = resolver(endpoint.clone());
        let iri = r
            .validate_override(
                &Hierarchy::negative_assessment(),
                "ndt_ont:AssessToBeFalse",
                &ForwardedHeaders::none(),
            )
            .await
            .unwrap();
        assert_eq!(iri.as_str(), vocab::ndt_ont("AssessToBeFalse"));
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn query_targets_ontology_dataset() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(negative_rows()));
        let r = resolver(endpoint.clone());
        r.resolve(&Hierarchy::building_state(), &ForwardedHeaders::none())
            .await
            .unwrap();
        let (dataset, query) = endpoint.last_query().unwrap();
        assert_eq!(dataset, Dataset::Ontology);
        assert!(query.contains("FILTER NOT EXISTS"));
    }
}
