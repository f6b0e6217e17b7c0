//! Domain types shared by the embedding, vector and search crates.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::filter::{build_filter, FilterPredicate};

/// Longest query text accepted, counted in characters.
pub const MAX_QUERY_CHARS: usize = 500;
/// Earliest year a minimum-year filter may name.
pub const MIN_YEAR: u32 = 1930;
pub const MAX_VOTES: u32 = 10_000;
pub const MAX_RATING: f64 = 10.0;
pub const MAX_TOP_K: usize = 50;
pub const DEFAULT_TOP_K: usize = 10;

/// Metadata keys as stored in the movie index.
pub mod meta_keys {
    pub const TITLE: &str = "movie title";
    pub const OVERVIEW: &str = "Overview";
    pub const DIRECTOR: &str = "Director";
    pub const GENRES: &str = "Generes";
    pub const YEAR: &str = "year";
    pub const RATING: &str = "Rating";
    pub const VOTES: &str = "User Rating";
    pub const PATH: &str = "path";
}

/// The fixed genre vocabulary of the movie index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Drama,
    Adventure,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Animation,
    Crime,
    Comedy,
    Thriller,
    Fantasy,
    Horror,
    History,
    Mystery,
    Biography,
    War,
    Western,
    Sport,
    Family,
    Romance,
    Music,
    Musical,
    #[serde(rename = "Film-Noir")]
    FilmNoir,
    #[serde(rename = "Game-Show")]
    GameShow,
    Adult,
    #[serde(rename = "Reality-TV")]
    RealityTv,
}

impl Genre {
    pub const ALL: [Genre; 24] = [
        Genre::Action,
        Genre::Drama,
        Genre::Adventure,
        Genre::SciFi,
        Genre::Animation,
        Genre::Crime,
        Genre::Comedy,
        Genre::Thriller,
        Genre::Fantasy,
        Genre::Horror,
        Genre::History,
        Genre::Mystery,
        Genre::Biography,
        Genre::War,
        Genre::Western,
        Genre::Sport,
        Genre::Family,
        Genre::Romance,
        Genre::Music,
        Genre::Musical,
        Genre::FilmNoir,
        Genre::GameShow,
        Genre::Adult,
        Genre::RealityTv,
    ];

    /// Label exactly as it appears in the index metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Drama => "Drama",
            Genre::Adventure => "Adventure",
            Genre::SciFi => "Sci-Fi",
            Genre::Animation => "Animation",
            Genre::Crime => "Crime",
            Genre::Comedy => "Comedy",
            Genre::Thriller => "Thriller",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::History => "History",
            Genre::Mystery => "Mystery",
            Genre::Biography => "Biography",
            Genre::War => "War",
            Genre::Western => "Western",
            Genre::Sport => "Sport",
            Genre::Family => "Family",
            Genre::Romance => "Romance",
            Genre::Music => "Music",
            Genre::Musical => "Musical",
            Genre::FilmNoir => "Film-Noir",
            Genre::GameShow => "Game-Show",
            Genre::Adult => "Adult",
            Genre::RealityTv => "Reality-TV",
        }
    }

    /// Parse a UI selection where the blank entry means "any genre".
    pub fn parse_optional(input: &str) -> Result<Option<Genre>> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidQuery(format!("unknown genre '{s}'")))
    }
}

/// A validated search submission.
///
/// Filter fields hold `None` when the user left them at their most
/// permissive value (zero or unset).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    genre: Option<Genre>,
    min_rating: Option<f64>,
    min_year: Option<u32>,
    min_votes: Option<u32>,
    top_k: usize,
}

impl Query {
    pub fn builder(text: impl Into<String>) -> QueryBuilder {
        QueryBuilder {
            text: text.into(),
            genre: None,
            min_rating: 0.0,
            min_year: 0,
            min_votes: 0,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn text(&self) -> &str { &self.text }
    pub fn genre(&self) -> Option<Genre> { self.genre }
    pub fn min_rating(&self) -> Option<f64> { self.min_rating }
    pub fn min_year(&self) -> Option<u32> { self.min_year }
    pub fn min_votes(&self) -> Option<u32> { self.min_votes }
    pub fn top_k(&self) -> usize { self.top_k }

    /// Metadata predicate for this query.
    pub fn filter(&self) -> FilterPredicate {
        build_filter(self.genre, self.min_rating, self.min_year, self.min_votes)
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    text: String,
    genre: Option<Genre>,
    min_rating: f64,
    min_year: u32,
    min_votes: u32,
    top_k: usize,
}

impl QueryBuilder {
    pub fn genre(mut self, genre: Option<Genre>) -> Self { self.genre = genre; self }
    pub fn min_rating(mut self, rating: f64) -> Self { self.min_rating = rating; self }
    pub fn min_year(mut self, year: u32) -> Self { self.min_year = year; self }
    pub fn min_votes(mut self, votes: u32) -> Self { self.min_votes = votes; self }
    pub fn top_k(mut self, top_k: usize) -> Self { self.top_k = top_k; self }

    pub fn build(self) -> Result<Query> {
        validate_text(&self.text)?;

        if !self.min_rating.is_finite() || self.min_rating < 0.0 || self.min_rating > MAX_RATING {
            return Err(Error::InvalidQuery(format!(
                "min_rating must be within 1..={MAX_RATING} (0 disables it), got {}",
                self.min_rating
            )));
        }
        if self.min_rating > 0.0 && self.min_rating < 1.0 {
            return Err(Error::InvalidQuery(format!(
                "min_rating must be at least 1 when set, got {}",
                self.min_rating
            )));
        }
        let max_year = current_year();
        if self.min_year != 0 && !(MIN_YEAR..=max_year).contains(&self.min_year) {
            return Err(Error::InvalidQuery(format!(
                "min_year must be within {MIN_YEAR}..={max_year} (0 disables it), got {}",
                self.min_year
            )));
        }
        if self.min_votes > MAX_VOTES {
            return Err(Error::InvalidQuery(format!(
                "min_votes must be within 0..={MAX_VOTES}, got {}",
                self.min_votes
            )));
        }
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(Error::InvalidQuery(format!(
                "top_k must be within 1..={MAX_TOP_K}, got {}",
                self.top_k
            )));
        }

        Ok(Query {
            text: self.text,
            genre: self.genre,
            min_rating: (self.min_rating > 0.0).then_some(self.min_rating),
            min_year: (self.min_year > 0).then_some(self.min_year),
            min_votes: (self.min_votes > 0).then_some(self.min_votes),
            top_k: self.top_k,
        })
    }
}

/// Latest year a minimum-year filter may name.
pub fn current_year() -> u32 {
    u32::try_from(Utc::now().year()).unwrap_or(MIN_YEAR)
}

/// Checks the constraints every text sent for embedding must meet.
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidQuery("query text is empty".into()));
    }
    let chars = text.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(Error::InvalidQuery(format!(
            "query text is {chars} characters, limit is {MAX_QUERY_CHARS}"
        )));
    }
    Ok(())
}

/// Dense query embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self { Self(values) }
    pub fn as_slice(&self) -> &[f32] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn into_inner(self) -> Vec<f32> { self.0 }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self { Self(values) }
}

/// One nearest-neighbor request against the vector store.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: EmbeddingVector,
    pub top_k: usize,
    pub filter: FilterPredicate,
    pub include_metadata: bool,
}

/// A raw match as returned by the vector store, metadata left untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Normalized, display-ready view of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub score: f32,
    pub title: String,
    pub overview: String,
    pub director: String,
    pub genres: Vec<String>,
    pub year: i32,
    pub rating: f64,
    pub path: String,
}

impl ResultRecord {
    /// Outbound link: the configured prefix joined with the stored path.
    pub fn link(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_round_trips_through_labels() {
        for g in Genre::ALL {
            assert_eq!(g.as_str().parse::<Genre>().expect("parse"), g);
            assert_eq!(serde_json::to_value(g).expect("ser"), serde_json::json!(g.as_str()));
        }
        assert_eq!("sci-fi".parse::<Genre>().expect("parse"), Genre::SciFi);
        assert!("Documentary".parse::<Genre>().is_err());
    }

    #[test]
    fn blank_genre_means_any() {
        assert_eq!(Genre::parse_optional("").expect("blank"), None);
        assert_eq!(Genre::parse_optional("  ").expect("blank"), None);
        assert_eq!(Genre::parse_optional("Western").expect("western"), Some(Genre::Western));
    }

    #[test]
    fn zero_filters_become_unset() {
        let q = Query::builder("time travel").top_k(5).build().expect("valid");
        assert_eq!(q.min_rating(), None);
        assert_eq!(q.min_year(), None);
        assert_eq!(q.min_votes(), None);
        assert_eq!(q.top_k(), 5);
    }

    #[test]
    fn query_bounds_are_enforced() {
        assert!(Query::builder("").build().is_err());
        assert!(Query::builder("   ").build().is_err());
        assert!(Query::builder("x".repeat(MAX_QUERY_CHARS + 1)).build().is_err());
        assert!(Query::builder("x".repeat(MAX_QUERY_CHARS)).build().is_ok());
        assert!(Query::builder("a").min_rating(11.0).build().is_err());
        assert!(Query::builder("a").min_rating(0.5).build().is_err());
        assert!(Query::builder("a").min_rating(f64::NAN).build().is_err());
        assert!(Query::builder("a").min_year(1929).build().is_err());
        assert!(Query::builder("a").min_year(1930).build().is_ok());
        assert!(Query::builder("a").min_year(current_year()).build().is_ok());
        let future = Query::builder("a").min_year(3000).build().expect_err("year 3000");
        assert!(future.to_string().contains("min_year"));
        assert!(Query::builder("a").min_year(current_year() + 1).build().is_err());
        assert!(Query::builder("a").min_votes(MAX_VOTES).build().is_ok());
        let votes = Query::builder("a").min_votes(50_000).build().expect_err("too many votes");
        assert!(votes.to_string().contains("min_votes"));
        assert!(Query::builder("a").top_k(0).build().is_err());
        assert!(Query::builder("a").top_k(51).build().is_err());
        assert!(Query::builder("a").top_k(50).build().is_ok());
    }

    #[test]
    fn length_limit_counts_characters() {
        let accented = "é".repeat(MAX_QUERY_CHARS);
        assert!(accented.len() > MAX_QUERY_CHARS);
        assert!(validate_text(&accented).is_ok());
    }

    #[test]
    fn link_concatenates_prefix_and_path() {
        let r = ResultRecord {
            id: "1".into(),
            score: 0.9,
            title: "Alien".into(),
            overview: String::new(),
            director: "Ridley Scott".into(),
            genres: vec!["Horror".into()],
            year: 1979,
            rating: 8.5,
            path: "title/tt0078748/".into(),
        };
        assert_eq!(r.link("https://www.imdb.com/"), "https://www.imdb.com/title/tt0078748/");
    }
}
