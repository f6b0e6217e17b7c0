//! Projection of raw vector-store matches into [`ResultRecord`]s.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{meta_keys, RawMatch, ResultRecord};

/// A match whose metadata could not be projected.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedMatch {
    pub id: String,
    pub key: &'static str,
    pub reason: String,
}

impl From<MalformedMatch> for Error {
    fn from(m: MalformedMatch) -> Self {
        Error::MalformedMatch { id: m.id, reason: format!("'{}' {}", m.key, m.reason) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMatch {
    Complete(ResultRecord),
    Malformed(MalformedMatch),
}

impl ParsedMatch {
    pub fn from_raw(raw: &RawMatch) -> Self {
        match project(raw) {
            Ok(record) => ParsedMatch::Complete(record),
            Err(m) => ParsedMatch::Malformed(m),
        }
    }
}

/// Format matches in store order, skipping (and logging) malformed ones.
pub fn format(matches: &[RawMatch]) -> Vec<ResultRecord> {
    matches
        .iter()
        .filter_map(|raw| match ParsedMatch::from_raw(raw) {
            ParsedMatch::Complete(record) => Some(record),
            ParsedMatch::Malformed(m) => {
                warn!(id = %m.id, key = m.key, reason = %m.reason, "skipping malformed match");
                None
            }
        })
        .collect()
}

/// Like [`format`] but fails on the first malformed match.
pub fn format_strict(matches: &[RawMatch]) -> Result<Vec<ResultRecord>> {
    matches
        .iter()
        .map(|raw| project(raw).map_err(Error::from))
        .collect()
}

/// Integer year from an integer, an integral float, or a numeric string.
pub fn coerce_year(value: &Value) -> Option<i32> {
    let as_f64 = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i32::try_from(i).ok();
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i32>() {
                return Some(i);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if as_f64.fract() != 0.0 || as_f64 < f64::from(i32::MIN) || as_f64 > f64::from(i32::MAX) {
        return None;
    }
    Some(as_f64 as i32)
}

fn project(raw: &RawMatch) -> std::result::Result<ResultRecord, MalformedMatch> {
    let malformed = |key: &'static str, reason: &str| MalformedMatch {
        id: raw.id.clone(),
        key,
        reason: reason.to_string(),
    };
    let Some(meta) = raw.metadata.as_ref() else {
        return Err(malformed("metadata", "is missing"));
    };

    let year_value = field(meta, meta_keys::YEAR).map_err(|r| malformed(meta_keys::YEAR, r))?;
    let year = coerce_year(year_value).ok_or_else(|| malformed(meta_keys::YEAR, "is not an integer year"))?;

    let rating_value = field(meta, meta_keys::RATING).map_err(|r| malformed(meta_keys::RATING, r))?;
    let rating = rating_value
        .as_f64()
        .ok_or_else(|| malformed(meta_keys::RATING, "is not a number"))?;

    let genres = match field(meta, meta_keys::GENRES).map_err(|r| malformed(meta_keys::GENRES, r))? {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed(meta_keys::GENRES, "contains a non-string entry"))?,
        _ => return Err(malformed(meta_keys::GENRES, "is not a list")),
    };

    Ok(ResultRecord {
        id: raw.id.clone(),
        score: raw.score,
        title: text(meta, meta_keys::TITLE).map_err(|r| malformed(meta_keys::TITLE, r))?,
        overview: text(meta, meta_keys::OVERVIEW).map_err(|r| malformed(meta_keys::OVERVIEW, r))?,
        director: text(meta, meta_keys::DIRECTOR).map_err(|r| malformed(meta_keys::DIRECTOR, r))?,
        genres,
        year,
        rating,
        path: text(meta, meta_keys::PATH).map_err(|r| malformed(meta_keys::PATH, r))?,
    })
}

fn field<'a>(meta: &'a Map<String, Value>, key: &str) -> std::result::Result<&'a Value, &'static str> {
    meta.get(key).ok_or("is missing")
}

fn text(meta: &Map<String, Value>, key: &str) -> std::result::Result<String, &'static str> {
    field(meta, key)?.as_str().map(str::to_string).ok_or("is not a string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, meta: Value) -> RawMatch {
        RawMatch {
            id: id.into(),
            score: 0.5,
            metadata: match meta {
                Value::Object(m) => Some(m),
                _ => None,
            },
        }
    }

    fn movie(year: Value) -> Value {
        json!({
            "movie title": "Back to the Future",
            "Overview": "A teenager is sent thirty years into the past.",
            "Director": "Robert Zemeckis",
            "Generes": ["Adventure", "Comedy", "Sci-Fi"],
            "year": year,
            "Rating": 8.5,
            "User Rating": 1200000,
            "path": "title/tt0088763/"
        })
    }

    #[test]
    fn year_coercion_variants() {
        assert_eq!(coerce_year(&json!("1994")), Some(1994));
        assert_eq!(coerce_year(&json!(" 1994 ")), Some(1994));
        assert_eq!(coerce_year(&json!(1994)), Some(1994));
        assert_eq!(coerce_year(&json!(1994.0)), Some(1994));
        assert_eq!(coerce_year(&json!("1994.0")), Some(1994));
        assert_eq!(coerce_year(&json!(1994.5)), None);
        assert_eq!(coerce_year(&json!("nineteen")), None);
        assert_eq!(coerce_year(&json!(null)), None);
    }

    #[test]
    fn projects_every_field() {
        let records = format(&[raw("m1", movie(json!("1985")))]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "m1");
        assert_eq!(r.title, "Back to the Future");
        assert_eq!(r.director, "Robert Zemeckis");
        assert_eq!(r.genres, vec!["Adventure", "Comedy", "Sci-Fi"]);
        assert_eq!(r.year, 1985);
        assert!((r.rating - 8.5).abs() < f64::EPSILON);
        assert_eq!(r.path, "title/tt0088763/");
    }

    #[test]
    fn malformed_matches_are_tagged_and_skipped() {
        let mut missing_director = movie(json!(1985));
        if let Value::Object(m) = &mut missing_director {
            m.remove("Director");
        }
        let matches = vec![
            raw("a", movie(json!(1985))),
            raw("b", missing_director),
            raw("c", json!(null)),
            raw("d", movie(json!(1990))),
        ];

        match ParsedMatch::from_raw(&matches[1]) {
            ParsedMatch::Malformed(m) => {
                assert_eq!(m.id, "b");
                assert_eq!(m.key, "Director");
            }
            ParsedMatch::Complete(_) => panic!("expected malformed"),
        }

        let ids: Vec<_> = format(&matches).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "d"]);

        let err = format_strict(&matches).expect_err("strict fails");
        assert!(matches!(err, Error::MalformedMatch { ref id, .. } if id == "b"));
    }

    #[test]
    fn genres_must_be_a_string_list() {
        let mut m = movie(json!(1985));
        m["Generes"] = json!("Comedy");
        assert!(matches!(ParsedMatch::from_raw(&raw("x", m)), ParsedMatch::Malformed(ref e) if e.key == "Generes"));
    }
}
