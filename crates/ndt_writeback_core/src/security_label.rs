//! Security labels attached to every write.
//!
//! The label is opaque to this service beyond its wire form. Downstream policy
//! enforcement interprets it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECURITY_LABEL_HEADER: &str = "Security-Label";

const PERMITTED_ORGANISATIONS: &str = "permitted_organisations";
const PERMITTED_NATIONALITIES: &str = "permitted_nationalities";
const CLASSIFICATION: &str = "classification";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    #[serde(rename = "O", alias = "OFFICIAL")]
    Official,
    #[serde(rename = "OS", alias = "OFFICIAL_SENSITIVE")]
    OfficialSensitive,
    #[serde(rename = "S", alias = "SECRET")]
    Secret,
    #[serde(rename = "TS", alias = "TOP_SECRET")]
    TopSecret,
}

impl Classification {
    pub fn code(self) -> &'static str {
        match self {
            Self::Official => "O",
            Self::OfficialSensitive => "OS",
            Self::Secret => "S",
            Self::TopSecret => "TS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityLabel {
    #[serde(default)]
    pub permitted_organisations: BTreeSet<String>,
    #[serde(default)]
    pub permitted_nationalities: BTreeSet<String>,
    #[serde(default)]
    pub classification: Classification,
}

impl SecurityLabel {
    pub fn official() -> Self {
        Self::default()
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn permit_organisation(mut self, org: impl Into<String>) -> Self {
        self.permitted_organisations.insert(org.into());
        self
    }

    pub fn permit_nationality(mut self, nationality: impl Into<String>) -> Self {
        self.permitted_nationalities.insert(nationality.into());
        self
    }

    /// Wire form understood by the store, e.g.
    /// `(permitted_organisations=A||permitted_organisations=B)&&classification=O`.
    /// Empty sets contribute no clause.
    pub fn serialize(&self) -> String {
        let mut clauses = Vec::with_capacity(3);
        if let Some(clause) = any_of(PERMITTED_ORGANISATIONS, &self.permitted_organisations) {
            clauses.push(clause);
        }
        if let Some(clause) = any_of(PERMITTED_NATIONALITIES, &self.permitted_nationalities) {
            clauses.push(clause);
        }
        clauses.push(format!("{CLASSIFICATION}={}", self.classification.code()));
        clauses.join("&&")
    }
}

impl fmt::Display for SecurityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn any_of(key: &str, values: &BTreeSet<String>) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = values.iter().map(|v| format!("{key}={v}")).collect();
    Some(format!("({})", alternatives.join("||")))
}
