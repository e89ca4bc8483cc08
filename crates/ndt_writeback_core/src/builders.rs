//! Statement builders, one pure function per entity kind.
//!
//! Every builder takes an already-validated value (IRIs parsed, types checked,
//! URIs minted) and returns the [`Statement`] to insert. No I/O, no clocks, no
//! randomness: the same input always yields the same triples.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Result, WriteBackError};
use crate::statement::{Iri, Statement};
use crate::vocab;

fn ies(local: &str) -> Iri {
    Iri::vocab(vocab::ies(local))
}

/// `http://iso.org/iso8601#<timestamp>`, the IES way of naming an instant.
pub fn period_iri(at: &DateTime<Utc>) -> Iri {
    Iri::vocab(format!(
        "{}{}",
        vocab::ISO8601,
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    ))
}

// ── Person ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub uri: Iri,
    pub given_name: String,
    /// `None` when the display name had a single part.
    pub surname: Option<String>,
}

impl Person {
    pub fn new(uri: Iri, given_name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            uri,
            given_name: given_name.into(),
            surname: Some(surname.into()),
        }
    }

    /// Split a display name on the first run of whitespace: everything before is
    /// the given name, everything after is the surname. `"Test User1"` gives
    /// `("Test", "User1")`; `"Anna Maria Smith"` gives `("Anna", "Maria Smith")`.
    /// A single-part name becomes the given name with no surname.
    pub fn from_display_name(uri: Iri, display_name: &str) -> Result<Self> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(WriteBackError::missing("username"));
        }
        let (given, surname) = match trimmed.split_once(char::is_whitespace) {
            Some((given, rest)) => (given, Some(rest.trim_start().to_string())),
            None => (trimmed, None),
        };
        Ok(Self {
            uri,
            given_name: given.to_string(),
            surname,
        })
    }
}

/// Person identity triples: the person, its name, and the name parts as
/// representations of that name.
pub fn person_statement(person: &Person) -> Statement {
    let mut st = Statement::new();
    let uri = &person.uri;
    let name = uri.with_suffix("_NAME");

    st.push_type(uri, &ies("Person"));
    st.push(uri, ies("hasName"), &name);
    st.push_type(&name, &ies("PersonName"));

    if let Some(surname) = &person.surname {
        let part = uri.with_suffix("_SURNAME");
        st.push_type(&part, &ies("Surname"));
        st.push(&part, ies("inRepresentation"), &name);
        st.push_literal(&part, ies("representationValue"), surname);
    }

    let part = uri.with_suffix("_GIVENNAME");
    st.push_type(&part, &ies("GivenName"));
    st.push(&part, ies("inRepresentation"), &name);
    st.push_literal(&part, ies("representationValue"), &person.given_name);

    st
}

// ── Entity state ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityState {
    pub uri: Iri,
    pub state_of: Iri,
    pub state_type: Iri,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Core state triples plus optional start/end bounding states. Bounding state
/// URIs are `<state>_start` / `<state>_end`, never minted.
pub fn state_statement(state: &EntityState) -> Statement {
    let mut st = Statement::new();
    st.push_type(&state.uri, &state.state_type);
    st.push(&state.uri, ies("isStateOf"), &state.state_of);

    if let Some(start) = &state.start {
        let bound = state.uri.with_suffix("_start");
        st.push_type(&bound, &ies("BoundingState"));
        st.push(&bound, ies("isStartOf"), &state.uri);
        st.push(&bound, ies("inPeriod"), period_iri(start));
    }
    if let Some(end) = &state.end {
        let bound = state.uri.with_suffix("_end");
        st.push_type(&bound, &ies("BoundingState"));
        st.push(&bound, ies("isEndOf"), &state.uri);
        st.push(&bound, ies("inPeriod"), period_iri(end));
    }
    st
}

// ── Assessment ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub uri: Iri,
    pub assessed_item: Iri,
    /// Every declared type gets its own `a` triple.
    pub types: Vec<Iri>,
    pub at: DateTime<Utc>,
}

/// Assessment triples with the assessor's identity inlined, so one round trip
/// creates both.
pub fn assessment_statement(assessment: &Assessment, assessor: &Person) -> Statement {
    let mut st = Statement::new();
    for t in &assessment.types {
        st.push_type(&assessment.uri, t);
    }
    st.push(&assessment.uri, ies("assessor"), &assessor.uri);
    st.extend(person_statement(assessor));
    st.push(&assessment.uri, ies("assessed"), &assessment.assessed_item);
    st.push(&assessment.uri, ies("inPeriod"), period_iri(&assessment.at));
    st
}

/// Counter-assessment of an existing flag.
pub fn flag_invalidation_statement(
    assessment_uri: &Iri,
    flag: &Iri,
    invalidation_type: &Iri,
    assessor: &Person,
    at: DateTime<Utc>,
) -> Statement {
    assessment_statement(
        &Assessment {
            uri: assessment_uri.clone(),
            assessed_item: flag.clone(),
            types: vec![invalidation_type.clone()],
            at,
        },
        assessor,
    )
}

// ── Flags ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Visit,
    Investigate,
}

impl FlagKind {
    pub fn class(self) -> Iri {
        match self {
            FlagKind::Visit => Iri::vocab(vocab::ndt("InterestedInVisiting")),
            FlagKind::Investigate => Iri::vocab(vocab::ndt("InterestedInInvestigating")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub uri: Iri,
    pub interested_in: Iri,
    pub kind: FlagKind,
    pub at: DateTime<Utc>,
}

/// A flag is a state of the flagging person: "interested in" the target.
pub fn flag_statement(flag: &Flag, flagger: &Person) -> Statement {
    let mut st = Statement::new();
    st.push(&flag.uri, ies("interestedIn"), &flag.interested_in);
    st.push(&flag.uri, ies("isStateOf"), &flagger.uri);
    st.extend(person_statement(flagger));
    st.push(&flag.uri, ies("inPeriod"), period_iri(&flag.at));
    st.push_type(&flag.uri, &flag.kind.class());
    st
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Term;
    use chrono::TimeZone;

    fn iri(s: &str) -> Iri {
        Iri::parse(s).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    fn count_typed(st: &Statement, class: &str) -> usize {
        st.subjects(vocab::RDF_TYPE, class).count()
    }

    fn literal_of(st: &Statement, subject: &str) -> Vec<String> {
        st.objects(subject, &vocab::ies("representationValue"))
            .filter_map(|t| t.as_literal().map(str::to_string))
            .collect()
    }

    // ── Person ───────────────────────────────────────────────

    #[test]
    fn display_name_splits_on_first_whitespace() {
        let p = Person::from_display_name(iri("http://x/u"), "Test User1").unwrap();
        assert_eq!(p.given_name, "Test");
        assert_eq!(p.surname.as_deref(), Some("User1"));

        let p = Person::from_display_name(iri("http://x/u"), "Anna  Maria Smith").unwrap();
        assert_eq!(p.given_name, "Anna");
        assert_eq!(p.surname.as_deref(), Some("Maria Smith"));
    }

    #[test]
    fn single_part_name_is_given_name_only() {
        let p = Person::from_display_name(iri("http://x/u"), "Prince").unwrap();
        assert_eq!(p.given_name, "Prince");
        assert!(p.surname.is_none());

        let st = person_statement(&p);
        assert_eq!(count_typed(&st, &vocab::ies("Surname")), 0);
        assert_eq!(count_typed(&st, &vocab::ies("GivenName")), 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Person::from_display_name(iri("http://x/u"), "   ").unwrap_err();
        assert!(matches!(err, WriteBackError::MissingRequiredField(_)));
    }

    #[test]
    fn person_statement_shape() {
        let p = Person::new(iri("http://x/u1"), "Jane", "Doe");
        let st = person_statement(&p);

        assert_eq!(count_typed(&st, &vocab::ies("Person")), 1);
        assert_eq!(st.objects("http://x/u1", &vocab::ies("hasName")).count(), 1);
        assert_eq!(count_typed(&st, &vocab::ies("PersonName")), 1);
        assert_eq!(literal_of(&st, "http://x/u1_SURNAME"), vec!["Doe"]);
        assert_eq!(literal_of(&st, "http://x/u1_GIVENNAME"), vec!["Jane"]);
        for part in ["http://x/u1_SURNAME", "http://x/u1_GIVENNAME"] {
            assert!(st.contains(
                part,
                &vocab::ies("inRepresentation"),
                &Term::Iri(iri("http://x/u1_NAME"))
            ));
        }
    }

    #[test]
    fn hostile_names_stay_inside_literals() {
        let p = Person::new(iri("http://x/u1"), "Bob\" . <x> <y> <z", "O'Neil\\");
        let text = person_statement(&p).to_insert_data();
        assert!(text.contains(r#""Bob\" . <x> <y> <z""#));
        assert!(text.contains(r#""O'Neil\\""#));
    }

    // ── State ────────────────────────────────────────────────

    fn state(start: bool, end: bool) -> EntityState {
        EntityState {
            uri: iri("http://x/s1"),
            state_of: iri("http://x/b1"),
            state_type: iri("http://x/BuildingWithEnergyRatingOfC"),
            start: start.then(at),
            end: end.then(|| at() + chrono::Duration::days(30)),
        }
    }

    #[test]
    fn state_without_bounds_has_two_triples() {
        let st = state_statement(&state(false, false));
        assert_eq!(st.len(), 2);
        assert!(st.contains(
            "http://x/s1",
            &vocab::ies("isStateOf"),
            &Term::Iri(iri("http://x/b1"))
        ));
    }

    #[test]
    fn bounding_states_are_derived_from_state_uri() {
        let st = state_statement(&state(true, true));
        assert!(st.contains(
            "http://x/s1_start",
            &vocab::ies("isStartOf"),
            &Term::Iri(iri("http://x/s1"))
        ));
        assert!(st.contains(
            "http://x/s1_end",
            &vocab::ies("isEndOf"),
            &Term::Iri(iri("http://x/s1"))
        ));
        assert_eq!(count_typed(&st, &vocab::ies("BoundingState")), 2);
        // Deterministic: building twice gives identical triples.
        assert_eq!(st, state_statement(&state(true, true)));
    }

    #[test]
    fn end_bound_uses_end_timestamp() {
        let s = state(true, true);
        let st = state_statement(&s);
        let end_period: Vec<_> = st
            .objects("http://x/s1_end", &vocab::ies("inPeriod"))
            .collect();
        assert_eq!(end_period, vec![&Term::Iri(period_iri(&s.end.unwrap()))]);
    }

    #[test]
    fn only_start_bound() {
        let st = state_statement(&state(true, false));
        assert_eq!(count_typed(&st, &vocab::ies("BoundingState")), 1);
        assert_eq!(st.objects("http://x/s1_end", &vocab::ies("isEndOf")).count(), 0);
    }

    // ── Assessment / flags ───────────────────────────────────

    #[test]
    fn assessment_emits_one_type_triple_per_type() {
        let a = Assessment {
            uri: iri("http://x/a1"),
            assessed_item: iri("http://x/s1"),
            types: vec![iri("http://x/T1"), iri("http://x/T2")],
            at: at(),
        };
        let assessor = Person::new(iri("http://x/u1"), "Jane", "Doe");
        let st = assessment_statement(&a, &assessor);
        assert_eq!(st.objects("http://x/a1", vocab::RDF_TYPE).count(), 2);
        assert!(st.contains(
            "http://x/a1",
            &vocab::ies("assessor"),
            &Term::Iri(iri("http://x/u1"))
        ));
        assert_eq!(count_typed(&st, &vocab::ies("Person")), 1);
    }

    #[test]
    fn flag_statement_shape() {
        let flag = Flag {
            uri: iri("http://x/f1"),
            interested_in: iri("http://example.org/p1"),
            kind: FlagKind::Visit,
            at: at(),
        };
        let flagger = Person::new(iri("http://x/u1"), "Test", "User1");
        let st = flag_statement(&flag, &flagger);
        assert!(st.contains(
            "http://x/f1",
            &vocab::ies("interestedIn"),
            &Term::Iri(iri("http://example.org/p1"))
        ));
        assert!(st.contains(
            "http://x/f1",
            &vocab::ies("isStateOf"),
            &Term::Iri(iri("http://x/u1"))
        ));
        assert_eq!(count_typed(&st, &vocab::ndt("InterestedInVisiting")), 1);
        assert_eq!(literal_of(&st, "http://x/u1_GIVENNAME"), vec!["Test"]);
    }

    #[test]
    fn period_iri_is_iso8601() {
        assert_eq!(
            period_iri(&at()).as_str(),
            "http://iso.org/iso8601#2024-03-01T12:30:00.000000Z"
        );
    }
}
