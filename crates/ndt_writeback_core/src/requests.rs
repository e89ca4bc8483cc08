//! Request payloads, one variant per write endpoint.
//!
//! Every field the caller may omit is an `Option` here. Presence checks and
//! defaults (minted URIs, the default label, the default invalidation type) are
//! applied by [`WriteBackService`](crate::service::WriteBackService), not by
//! these types.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::builders::FlagKind;
use crate::security_label::SecurityLabel;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub uri: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub security_label: Option<SecurityLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBuildingState {
    pub uri: Option<String>,
    pub state_of: Option<String>,
    pub state_type: Option<String>,
    #[serde(default, deserialize_with = "timestamp")]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp")]
    pub end_date_time: Option<DateTime<Utc>>,
    pub security_label: Option<SecurityLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssessment {
    pub uri: Option<String>,
    pub assessed_item: Option<String>,
    pub assessment_type: Option<String>,
    pub security_label: Option<SecurityLabel>,
}

/// Body of `/flag-to-visit` and `/flag-to-investigate`: the entity being flagged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagTarget {
    pub uri: Option<String>,
    pub security_label: Option<SecurityLabel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateFlag {
    pub flag_uri: Option<String>,
    /// Defaults to `ndt_ont:AssessToBeFalse`.
    pub assessment_type_override: Option<String>,
    pub security_label: Option<SecurityLabel>,
}

#[derive(Debug, Clone)]
pub enum WriteRequest {
    Person(NewPerson),
    BuildingState(NewBuildingState),
    Assessment(NewAssessment),
    Flag(FlagKind, FlagTarget),
    InvalidateFlag(InvalidateFlag),
}

impl WriteRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            WriteRequest::Person(_) => "person",
            WriteRequest::BuildingState(_) => "building_state",
            WriteRequest::Assessment(_) => "assessment",
            WriteRequest::Flag(FlagKind::Visit, _) => "flag_to_visit",
            WriteRequest::Flag(FlagKind::Investigate, _) => "flag_to_investigate",
            WriteRequest::InvalidateFlag(_) => "invalidate_flag",
        }
    }
}

/// RFC 3339 timestamps, or naive `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))?;
    Ok(Some(naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn invalidate_flag_reads_camel_case() {
        let req: InvalidateFlag = serde_json::from_str(
            r#"{"flagUri":"ndt:flag1","assessmentTypeOverride":"ndt_ont:AssessToBeFalse"}"#,
        )
        .unwrap();
        assert_eq!(req.flag_uri.as_deref(), Some("ndt:flag1"));
        assert_eq!(
            req.assessment_type_override.as_deref(),
            Some("ndt_ont:AssessToBeFalse")
        );
        assert!(req.security_label.is_none());
    }

    #[test]
    fn state_timestamps_accept_offset_and_naive() {
        let req: NewBuildingState = serde_json::from_str(
            r#"{"stateOf":"ndt:b1","stateType":"ndt_ont:X",
                "startDateTime":"2024-03-01T12:30:00+01:00",
                "endDateTime":"2024-04-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(
            req.start_date_time,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap())
        );
        assert_eq!(
            req.end_date_time,
            Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn missing_timestamps_are_none() {
        let req: NewBuildingState = serde_json::from_str(r#"{"stateOf":"ndt:b1"}"#).unwrap();
        assert!(req.start_date_time.is_none());
        assert!(req.end_date_time.is_none());
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let err = serde_json::from_str::<NewBuildingState>(r#"{"startDateTime":"yesterday"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn flag_target_ignores_extra_fields() {
        let req: FlagTarget =
            serde_json::from_str(r#"{"uri":"http://example.org/p1","types":[]}"#).unwrap();
        assert_eq!(req.uri.as_deref(), Some("http://example.org/p1"));
    }
}
