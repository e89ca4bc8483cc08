//! Typed triple model and its two serializations.
//!
//! Builders push [`Triple`]s into a [`Statement`]; nothing in this crate
//! concatenates caller text into SPARQL directly. IRIs are checked when they are
//! constructed and literals are escaped when they are rendered, so a statement
//! is syntactically well-formed by construction.
//!
//! Serializations:
//! - [`Statement::to_insert_data`]: `INSERT DATA { … }` body for the update endpoint
//! - [`Statement::to_ntriples`]: canonical N-Triples for the event sink

use std::fmt;

use serde::Serialize;

use crate::error::{Result, WriteBackError};
use crate::vocab;

/// Characters that may not appear inside an IRI reference.
const FORBIDDEN_IRI_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '^', '`', '\\'];

/// An absolute IRI that is safe to embed between angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(WriteBackError::invalid("empty IRI"));
        }
        if let Some(bad) = value
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_IRI_CHARS.contains(c))
        {
            return Err(WriteBackError::invalid(format!(
                "IRI {value:?} contains forbidden character {bad:?}"
            )));
        }
        if !value.contains(':') {
            return Err(WriteBackError::invalid(format!(
                "IRI {value:?} is not absolute"
            )));
        }
        Ok(Self(value))
    }

    /// For compile-time vocabulary constants that are known to be valid.
    pub(crate) fn vocab(value: String) -> Self {
        debug_assert!(Self::parse(value.clone()).is_ok(), "bad vocab IRI {value}");
        Self(value)
    }

    /// Derive a sibling IRI by appending a fixed suffix (`_NAME`, `_start`, …).
    /// The suffixes used here contain no forbidden characters.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{suffix}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(Iri),
    /// Plain string literal; escaped on output.
    Literal(String),
}

impl Term {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal(value) => Some(value),
            Term::Iri(_) => None,
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<&Iri> for Term {
    fn from(iri: &Iri) -> Self {
        Term::Iri(iri.clone())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{iri}"),
            Term::Literal(value) => write!(f, "\"{}\"", escape_literal(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Iri,
    pub predicate: Iri,
    pub object: Term,
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A flat, self-contained batch of triples destined for one insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    triples: Vec<Triple>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subject: &Iri, predicate: Iri, object: impl Into<Term>) {
        self.triples.push(Triple {
            subject: subject.clone(),
            predicate,
            object: object.into(),
        });
    }

    /// `subject a <class>`.
    pub fn push_type(&mut self, subject: &Iri, class: &Iri) {
        self.push(subject, Iri::vocab(vocab::RDF_TYPE.to_string()), class);
    }

    pub fn push_literal(&mut self, subject: &Iri, predicate: Iri, value: &str) {
        self.push(subject, predicate, Term::Literal(value.to_string()));
    }

    pub fn extend(&mut self, other: Statement) {
        self.triples.extend(other.triples);
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Objects of every triple matching `subject`/`predicate`.
    pub fn objects<'a>(
        &'a self,
        subject: &str,
        predicate: &str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        let (subject, predicate) = (subject.to_string(), predicate.to_string());
        self.triples
            .iter()
            .filter(move |t| t.subject.as_str() == subject && t.predicate.as_str() == predicate)
            .map(|t| &t.object)
    }

    /// Subjects of every triple matching `predicate`/`object` IRI.
    pub fn subjects<'a>(
        &'a self,
        predicate: &str,
        object: &str,
    ) -> impl Iterator<Item = &'a Iri> + 'a {
        let (predicate, object) = (predicate.to_string(), object.to_string());
        self.triples
            .iter()
            .filter(move |t| {
                t.predicate.as_str() == predicate
                    && t.object.as_iri().is_some_and(|o| o.as_str() == object)
            })
            .map(|t| &t.subject)
    }

    pub fn contains(&self, subject: &str, predicate: &str, object: &Term) -> bool {
        self.objects(subject, predicate).any(|o| o == object)
    }

    /// SPARQL update body. The caller prepends the prefix preamble.
    pub fn to_insert_data(&self) -> String {
        let mut out = String::from("INSERT DATA {\n");
        for triple in &self.triples {
            out.push_str("    ");
            out.push_str(&triple.to_string());
            out.push('\n');
        }
        out.push('}');
        out
    }

    /// One triple per line, absolute IRIs only.
    pub fn to_ntriples(&self) -> String {
        let mut out = String::with_capacity(self.triples.len() * 128);
        for triple in &self.triples {
            out.push_str(&triple.to_string());
            out.push('\n');
        }
        out
    }
}

/// Escape a string for a double-quoted SPARQL / N-Triples literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
