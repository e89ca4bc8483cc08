//! Building read models over the knowledge dataset.
//!
//! Two lookups: every building inside a geohash cell (with its current energy
//! rating, identifiers and flags) and a single building by UPRN with its states.
//! URIs in the returned models are shortened with the prefix registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, WriteBackError};
use crate::ports::{Dataset, ForwardedHeaders, SparqlEndpoint};
use crate::prefixes::PrefixRegistry;
use crate::sparql::{value, Row};
use crate::statement::Term;
use crate::vocab;

/// Shorter prefixes cover too much ground to query in one go.
pub const MIN_GEOHASH_LEN: usize = 5;

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagView {
    pub flag_type: String,
    pub flagged_by: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub uri: String,
    pub uprn: String,
    pub current_energy_rating: String,
    pub types: Vec<String>,
    #[serde(rename = "buildingTOID", skip_serializing_if = "Option::is_none")]
    pub building_toid: Option<String>,
    #[serde(rename = "parentBuildingTOID", skip_serializing_if = "Option::is_none")]
    pub parent_building_toid: Option<String>,
    pub flags: BTreeMap<String, FlagView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityView {
    pub uri: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub uri: String,
    pub types: Vec<String>,
    pub state_of: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityAndStates {
    pub entity: EntityView,
    pub states: Vec<StateView>,
}

/// Reject anything that is not at least [`MIN_GEOHASH_LEN`] base-32 geohash
/// characters. Returns the lower-cased cell.
pub fn validate_geohash(geohash: &str) -> Result<String> {
    let cell = geohash.trim().to_ascii_lowercase();
    if cell.chars().count() < MIN_GEOHASH_LEN {
        return Err(WriteBackError::invalid(format!(
            "geohash {geohash:?} covers too wide an area, provide at least {MIN_GEOHASH_LEN} characters"
        )));
    }
    if let Some(bad) = cell.chars().find(|c| !GEOHASH_ALPHABET.contains(*c)) {
        return Err(WriteBackError::invalid(format!(
            "geohash {geohash:?} contains {bad:?}, which is not a geohash character"
        )));
    }
    Ok(cell)
}

pub struct BuildingDirectory {
    endpoint: Arc<dyn SparqlEndpoint>,
    prefixes: Arc<PrefixRegistry>,
}

impl BuildingDirectory {
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, prefixes: Arc<PrefixRegistry>) -> Self {
        Self { endpoint, prefixes }
    }

    /// Buildings whose location lies in `geohash`, in first-seen order.
    pub async fn buildings_in_geohash(
        &self,
        geohash: &str,
        headers: &ForwardedHeaders,
    ) -> Result<Vec<Building>> {
        let cell = validate_geohash(geohash)?;
        let results = self
            .endpoint
            .select(Dataset::Knowledge, &geohash_query(&cell), headers)
            .await?;

        let mut buildings: Vec<Building> = Vec::new();
        for row in results.rows() {
            let (Some(uri), Some(uprn)) = (value(row, "building"), value(row, "uprn_id")) else {
                continue;
            };
            let uri = self.prefixes.shorten(uri);
            let idx = match buildings.iter().position(|b| b.uri == uri) {
                Some(idx) => idx,
                None => {
                    buildings.push(Building {
                        uri,
                        uprn: uprn.to_string(),
                        current_energy_rating: value(row, "current_energy_rating")
                            .unwrap_or_default()
                            .to_string(),
                        types: Vec::new(),
                        building_toid: None,
                        parent_building_toid: None,
                        flags: BTreeMap::new(),
                    });
                    buildings.len() - 1
                }
            };
            self.merge_row(&mut buildings[idx], row);
        }
        tracing::debug!(geohash = %cell, buildings = buildings.len(), "buildings in geohash");
        Ok(buildings)
    }

    fn merge_row(&self, building: &mut Building, row: &Row) {
        if let Some(t) = value(row, "type") {
            push_unique(&mut building.types, self.prefixes.shorten(t));
        }

        if let Some(flag) = value(row, "flag") {
            let view = building
                .flags
                .entry(self.prefixes.shorten(flag))
                .or_insert_with(|| FlagView {
                    flag_type: value(row, "flag_type")
                        .map(|t| self.prefixes.shorten(t))
                        .unwrap_or_default(),
                    flagged_by: value(row, "flag_person").unwrap_or_default().to_string(),
                    date: value(row, "flag_date").unwrap_or_default().to_string(),
                    invalidated: None,
                    invalidated_by: None,
                });
            if value(row, "flag_assessment").is_some() {
                view.invalidated = value(row, "flag_ass_date").map(str::to_string);
                view.invalidated_by = value(row, "flag_assessor").map(str::to_string);
            }
        }

        if let Some(toid) = value(row, "building_toid_id") {
            building.building_toid = Some(toid.to_string());
        } else if let Some(toid) = value(row, "parent_building_toid_id") {
            building.parent_building_toid = Some(toid.to_string());
        }
    }

    /// The building identified by `uprn`, with every state recorded against it.
    /// `None` when no building carries that UPRN.
    pub async fn building_by_uprn(
        &self,
        uprn: &str,
        headers: &ForwardedHeaders,
    ) -> Result<Option<EntityAndStates>> {
        let uprn = uprn.trim();
        if uprn.is_empty() {
            return Err(WriteBackError::missing("uprn"));
        }
        let results = self
            .endpoint
            .select(Dataset::Knowledge, &uprn_query(uprn), headers)
            .await?;

        let mut entity: Option<EntityView> = None;
        let mut states: Vec<StateView> = Vec::new();
        for row in results.rows() {
            let Some(building) = value(row, "building") else {
                continue;
            };
            let building = self.prefixes.shorten(building);
            let entity = entity.get_or_insert_with(|| EntityView {
                uri: building.clone(),
                types: Vec::new(),
            });
            if let Some(t) = value(row, "buildingType") {
                push_unique(&mut entity.types, self.prefixes.shorten(t));
            }

            let Some(state) = value(row, "state") else {
                continue;
            };
            let state = self.prefixes.shorten(state);
            let idx = match states.iter().position(|s| s.uri == state) {
                Some(idx) => idx,
                None => {
                    states.push(StateView {
                        uri: state,
                        types: Vec::new(),
                        state_of: building.clone(),
                    });
                    states.len() - 1
                }
            };
            if let Some(t) = value(row, "stateType") {
                push_unique(&mut states[idx].types, self.prefixes.shorten(t));
            }
        }
        Ok(entity.map(|entity| EntityAndStates { entity, states }))
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// `cell` has been through [`validate_geohash`].
fn geohash_query(cell: &str) -> String {
    format!(
        r#"SELECT ?building ?uprn_id ?building_toid_id ?parent_building_toid_id
       ?current_energy_rating ?parent_building ?type
       ?flag ?flag_type ?flag_person ?flag_date
       ?flag_assessment ?flag_ass_date ?flag_assessor
WHERE {{
    ?building ies:inLocation ?geopoint .
    BIND(str(?geopoint) AS ?gh)
    FILTER(STRSTARTS(?gh, "{geo}{cell}"))
    ?building a ?type .

    ?state ies:isStateOf ?building .
    ?state a ?energy_rating .
    BIND(REPLACE(str(?energy_rating), "{epc}BuildingWithEnergyRatingOf", "", "i") AS ?current_energy_rating)

    ?building ies:isIdentifiedBy ?uprn .
    ?uprn ies:representationValue ?uprn_id .
    ?uprn rdf:type gp:UniquePropertyReferenceNumber .

    OPTIONAL {{
        ?flag ies:interestedIn ?building .
        ?flag ies:isStateOf ?flag_person .
        ?flag a ?flag_type .
        ?flag ies:inPeriod ?flag_date .
        OPTIONAL {{
            ?flag_assessment ies:assessed ?flag .
            ?flag_assessment ies:inPeriod ?flag_ass_date .
            ?flag_assessment ies:assessor ?flag_assessor .
        }}
    }}
    OPTIONAL {{
        ?building ies:isIdentifiedBy ?building_toid .
        ?building_toid rdf:type ies:TOID .
        ?building_toid ies:representationValue ?building_toid_id .
    }}
    OPTIONAL {{
        ?building ies:isPartOf ?parent_building .
        ?parent_building ies:isIdentifiedBy ?parent_building_toid .
        ?parent_building_toid ies:representationValue ?parent_building_toid_id .
        ?parent_building_toid rdf:type ies:TOID .
    }}
}}"#,
        geo = vocab::GEOHASH,
        epc = vocab::EPC,
    )
}

fn uprn_query(uprn: &str) -> String {
    let literal = Term::Literal(uprn.to_string());
    format!(
        "SELECT ?building ?buildingType ?state ?stateType WHERE {{\n    \
         ?building ies:isIdentifiedBy ?uprnID .\n    \
         ?building rdf:type ?buildingType .\n    \
         ?uprnID ies:representationValue {literal} .\n    \
         OPTIONAL {{\n        \
         ?state ies:isStateOf ?building .\n        \
         ?state rdf:type ?stateType .\n    \
         }}\n}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::SparqlResults;
    use crate::testing::ScriptedEndpoint;

    const B1: &str = "http://nationaldigitaltwin.gov.uk/data#building1";
    const FLAG: &str = "http://nationaldigitaltwin.gov.uk/data#flag1";

    fn directory(endpoint: Arc<ScriptedEndpoint>) -> BuildingDirectory {
        BuildingDirectory::new(
            endpoint,
            Arc::new(PrefixRegistry::with_defaults(vocab::DEFAULT_DATA_STUB)),
        )
    }

    #[test]
    fn geohash_rules() {
        assert_eq!(validate_geohash("GCPVJ").unwrap(), "gcpvj");
        assert!(validate_geohash("gcpv").is_err());
        assert!(validate_geohash("gcpva").is_err()); // 'a' is not in the alphabet
        assert!(validate_geohash("gcp\"j0").is_err());
    }

    #[tokio::test]
    async fn short_geohash_never_reaches_the_store() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(SparqlResults::default()));
        let err = directory(endpoint.clone())
            .buildings_in_geohash("gcpv", &ForwardedHeaders::none())
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 422);
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn rows_aggregate_per_building() {
        let ies_building = vocab::ies("Building");
        let epc_house = format!("{}House", vocab::EPC);
        let visiting = vocab::ndt("InterestedInVisiting");
        let endpoint = Arc::new(ScriptedEndpoint::returning(SparqlResults::from_rows([
            vec![
                ("building", B1),
                ("uprn_id", "100023336956"),
                ("current_energy_rating", "C"),
                ("type", ies_building.as_str()),
                ("building_toid_id", "osgb1000005085405"),
            ],
            vec![
                ("building", B1),
                ("uprn_id", "100023336956"),
                ("current_energy_rating", "C"),
                ("type", epc_house.as_str()),
                ("flag", FLAG),
                ("flag_type", visiting.as_str()),
                ("flag_person", "http://nationaldigitaltwin.gov.uk/data#1234"),
                ("flag_date", "http://iso.org/iso8601#2024-03-01T12:30:00Z"),
            ],
            vec![
                ("building", B1),
                ("uprn_id", "100023336956"),
                ("current_energy_rating", "C"),
                ("type", epc_house.as_str()),
                ("flag", FLAG),
                ("flag_type", visiting.as_str()),
                ("flag_person", "http://nationaldigitaltwin.gov.uk/data#1234"),
                ("flag_date", "http://iso.org/iso8601#2024-03-01T12:30:00Z"),
                ("flag_assessment", "http://nationaldigitaltwin.gov.uk/data#a1"),
                ("flag_ass_date", "http://iso.org/iso8601#2024-03-02T09:00:00Z"),
                ("flag_assessor", "http://nationaldigitaltwin.gov.uk/data#5678"),
            ],
        ])));

        let buildings = directory(endpoint.clone())
            .buildings_in_geohash("gcpvj", &ForwardedHeaders::none())
            .await
            .unwrap();

        assert_eq!(buildings.len(), 1);
        let b = &buildings[0];
        assert_eq!(b.uri, "data:building1");
        assert_eq!(b.types, vec!["ies:Building", "epc:House"]);
        assert_eq!(b.building_toid.as_deref(), Some("osgb1000005085405"));
        let flag = &b.flags["data:flag1"];
        // `data:` and `ndt:` share a stub; the earlier registration wins.
        assert_eq!(flag.flag_type, "data:InterestedInVisiting");
        assert_eq!(
            flag.invalidated_by.as_deref(),
            Some("http://nationaldigitaltwin.gov.uk/data#5678")
        );

        let (dataset, query) = endpoint.last_query().unwrap();
        assert_eq!(dataset, Dataset::Knowledge);
        assert!(query.contains(r#"STRSTARTS(?gh, "http://geohash.org/gcpvj")"#));
    }

    #[tokio::test]
    async fn building_by_uprn_collects_states() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(SparqlResults::from_rows([
            vec![
                ("building", B1),
                ("buildingType", "http://ies.data.gov.uk/ontology/ies4#Building"),
                ("state", "http://nationaldigitaltwin.gov.uk/data#s1"),
                ("stateType", "http://nationaldigitaltwin.gov.uk/ontology#BuildingState"),
            ],
            vec![
                ("building", B1),
                ("buildingType", "http://ies.data.gov.uk/ontology/ies4#Building"),
                ("state", "http://nationaldigitaltwin.gov.uk/data#s1"),
                ("stateType", "http://nationaldigitaltwin.gov.uk/ontology#Retrofitted"),
            ],
        ])));
        let found = directory(endpoint.clone())
            .building_by_uprn("100023336956", &ForwardedHeaders::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.entity.uri, "data:building1");
        assert_eq!(found.entity.types, vec!["ies:Building"]);
        assert_eq!(found.states.len(), 1);
        assert_eq!(
            found.states[0].types,
            vec!["ndt_ont:BuildingState", "ndt_ont:Retrofitted"]
        );
        assert_eq!(found.states[0].state_of, "data:building1");

        let (_, query) = endpoint.last_query().unwrap();
        assert!(query.contains(r#"ies:representationValue "100023336956" ."#));
    }

    #[tokio::test]
    async fn unknown_uprn_is_none_and_quotes_are_escaped() {
        let endpoint = Arc::new(ScriptedEndpoint::returning(SparqlResults::default()));
        let found = directory(endpoint.clone())
            .building_by_uprn(r#"1" } DROP ALL {"#, &ForwardedHeaders::none())
            .await
            .unwrap();
        assert!(found.is_none());
        let (_, query) = endpoint.last_query().unwrap();
        assert!(query.contains(r#""1\" } DROP ALL {""#));
    }
}
