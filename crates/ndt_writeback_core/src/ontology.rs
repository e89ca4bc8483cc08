//! Ontology classes and the subtype tables built from `subClassOf*` queries.

use std::collections::HashMap;

use serde::Serialize;

use crate::prefixes::PrefixRegistry;
use crate::sparql::{value, SparqlResults};
use crate::statement::Iri;
use crate::vocab;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyClass {
    pub uri: String,
    pub short_name: String,
    pub super_classes: Vec<String>,
    pub description: Vec<String>,
}

/// A class hierarchy rooted at `base`, optionally minus everything under `exclude`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hierarchy {
    pub name: &'static str,
    pub base: Iri,
    pub exclude: Option<Iri>,
}

impl Hierarchy {
    /// Subclasses of `ies:Assessment`.
    pub fn assessment() -> Self {
        Self {
            name: "assessment",
            base: Iri::vocab(vocab::ies("Assessment")),
            exclude: None,
        }
    }

    /// Subclasses of `ndt_ont:BuildingState` that are not also locations.
    pub fn building_state() -> Self {
        Self {
            name: "building_state",
            base: Iri::vocab(vocab::ndt_ont("BuildingState")),
            exclude: Some(Iri::vocab(vocab::ies("Location"))),
        }
    }

    /// Subclasses of `ndt_ont:AssessToBeFalse`: the types allowed to invalidate a flag.
    pub fn negative_assessment() -> Self {
        Self {
            name: "negative_assessment",
            base: Iri::vocab(vocab::ndt_ont("AssessToBeFalse")),
            exclude: None,
        }
    }

    /// The transitive-closure query. Both IRIs were validated on construction.
    pub fn subclass_query(&self) -> String {
        let filter = match &self.exclude {
            Some(exclude) => format!(
                "\n        FILTER NOT EXISTS {{ ?sub rdfs:subClassOf* {exclude} }}"
            ),
            None => String::new(),
        };
        format!(
            "SELECT ?sub ?parent ?comment WHERE {{\n        \
             ?sub rdfs:subClassOf* {base} .\n        \
             ?sub rdfs:subClassOf ?parent .\n        \
             OPTIONAL {{ ?sub rdfs:comment ?comment }}{filter}\n    }}",
            base = self.base
        )
    }
}

/// Resolved subclasses of one hierarchy: a map for membership checks and the
/// first-seen order for API responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtypeTable {
    classes: HashMap<String, OntologyClass>,
    order: Vec<String>,
}

impl SubtypeTable {
    /// Merge `?sub ?parent ?comment` rows. A class with several parents or
    /// comments appears once, with all of them accumulated.
    pub fn from_results(results: &SparqlResults, prefixes: &PrefixRegistry) -> Self {
        let mut table = Self::default();
        for row in results.rows() {
            let Some(sub) = value(row, "sub") else {
                continue;
            };
            let class = table.entry(sub, prefixes);
            if let Some(parent) = value(row, "parent") {
                push_unique(&mut class.super_classes, parent);
            }
            if let Some(comment) = value(row, "comment") {
                push_unique(&mut class.description, comment);
            }
        }
        table
    }

    fn entry(&mut self, uri: &str, prefixes: &PrefixRegistry) -> &mut OntologyClass {
        if !self.classes.contains_key(uri) {
            self.order.push(uri.to_string());
        }
        self.classes
            .entry(uri.to_string())
            .or_insert_with(|| OntologyClass {
                uri: uri.to_string(),
                short_name: prefixes.shorten(uri),
                super_classes: Vec::new(),
                description: Vec::new(),
            })
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.classes.contains_key(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&OntologyClass> {
        self.classes.get(uri)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Classes in first-seen order.
    pub fn list(&self) -> Vec<OntologyClass> {
        self.order
            .iter()
            .filter_map(|uri| self.classes.get(uri).cloned())
            .collect()
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
