//! SPARQL 1.1 JSON results (`application/sparql-results+json`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: Bindings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    #[serde(default)]
    pub bindings: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

pub type Row = HashMap<String, BoundValue>;

impl SparqlResults {
    pub fn rows(&self) -> &[Row] {
        &self.results.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    /// Build a result set from `(var, value)` rows. Values that look like
    /// absolute IRIs are typed `uri`, anything else `literal`.
    pub fn from_rows<'a, R>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut vars: Vec<String> = Vec::new();
        let mut bindings = Vec::new();
        for row in rows {
            let mut bound = Row::new();
            for (var, value) in row {
                if !vars.iter().any(|v| v == var) {
                    vars.push(var.to_string());
                }
                let kind = if value.contains("://") { "uri" } else { "literal" };
                bound.insert(
                    var.to_string(),
                    BoundValue {
                        kind: kind.to_string(),
                        value: value.to_string(),
                        datatype: None,
                        lang: None,
                    },
                );
            }
            bindings.push(bound);
        }
        Self {
            head: Head { vars },
            results: Bindings { bindings },
        }
    }
}

/// Value of `var` in `row`, if bound.
pub fn value<'a>(row: &'a Row, var: &str) -> Option<&'a str> {
    row.get(var).map(|b| b.value.as_str())
}
