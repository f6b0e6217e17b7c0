//! Metadata predicates in the vector store's filter language.
//!
//! A predicate maps a metadata field to one constraint, serialized as
//! `{"field": {"$gte": n}}` or `{"field": {"$in": [..]}}`. The same predicate
//! can be evaluated locally against a metadata map, which is what the
//! in-memory store does.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::{meta_keys, Genre};

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Gte(f64),
    In(Vec<String>),
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Constraint::Gte(v) => map.serialize_entry("$gte", &number(*v))?,
            Constraint::In(values) => map.serialize_entry("$in", values)?,
        }
        map.end()
    }
}

impl Constraint {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Constraint::Gte(floor) => numeric(value).is_some_and(|v| v >= *floor),
            Constraint::In(allowed) => match value {
                Value::String(s) => allowed.iter().any(|a| a == s),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| allowed.iter().any(|a| a == s)),
                _ => false,
            },
        }
    }
}

/// Conjunction of per-field constraints.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct FilterPredicate {
    clauses: BTreeMap<String, Constraint>,
}

impl FilterPredicate {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.clauses.insert(field.into(), constraint);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Constraint> { self.clauses.get(field) }
    pub fn len(&self) -> usize { self.clauses.len() }
    pub fn is_empty(&self) -> bool { self.clauses.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// True when every clause holds; a missing field fails its clause.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.clauses
            .iter()
            .all(|(field, c)| metadata.get(field).is_some_and(|v| c.accepts(v)))
    }
}

/// Translate UI filter inputs into a predicate.
///
/// Unset, zero and NaN floors collapse to 0 so the three numeric clauses are
/// always present; the genre clause appears only when a genre is chosen.
pub fn build_filter(
    genre: Option<Genre>,
    min_rating: Option<f64>,
    min_year: Option<u32>,
    min_votes: Option<u32>,
) -> FilterPredicate {
    let rating = min_rating.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(0.0);
    let year = min_year.unwrap_or(0);
    let votes = min_votes.unwrap_or(0);

    let mut predicate = FilterPredicate::new()
        .with(meta_keys::RATING, Constraint::Gte(rating))
        .with(meta_keys::YEAR, Constraint::Gte(f64::from(year)))
        .with(meta_keys::VOTES, Constraint::Gte(f64::from(votes)));
    if let Some(g) = genre {
        predicate = predicate.with(meta_keys::GENRES, Constraint::In(vec![g.as_str().to_string()]));
    }
    predicate
}

// Integral floors go out as JSON integers, matching how the store echoes them.
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v).map_or(Value::from(0), Value::Number)
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
