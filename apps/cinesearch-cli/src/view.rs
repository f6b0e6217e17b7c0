use std::fmt::Write as _;
use std::str::FromStr;

use cinesearch_core::types::ResultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "es" | "spanish" | "español" | "espanol" => Ok(Language::Spanish),
            other => Err(format!("unknown language '{other}', expected en or es")),
        }
    }
}

/// User-facing strings for one language.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub query: &'static str,
    pub rating: &'static str,
    pub votes: &'static str,
    pub genre: &'static str,
    pub year: &'static str,
    pub results_count: &'static str,
    pub results: &'static str,
    pub no_results: &'static str,
    pub overview: &'static str,
    pub director: &'static str,
    pub genres: &'static str,
    pub card_year: &'static str,
    pub card_rating: &'static str,
    pub more_info: &'static str,
}

const ENGLISH: Labels = Labels {
    title: "Movie Search Engine",
    subtitle: "Enter your query to get the best matches in film history!",
    query: "Search terms here! Example: Time traveling adventure.",
    rating: "Minimum Rating IMDB",
    votes: "Minimum vote count",
    genre: "Movie Genre (optional)",
    year: "Minimum Movie Year",
    results_count: "Number of Results",
    results: "Results",
    no_results: "No results found.",
    overview: "Overview",
    director: "Director",
    genres: "Genre",
    card_year: "Year",
    card_rating: "Rating",
    more_info: "More info",
};

const SPANISH: Labels = Labels {
    title: "Buscador de películas",
    subtitle: "Introduce tu consulta para conseguir las mejores coincidencias en la historia del cine!",
    query: "Consulta aquí. Ejemplo: Aventura de viaje en el tiempo",
    rating: "Puntuación mínima IMDB",
    votes: "Mínima cantidad de votos",
    genre: "Género de la película (opcional)",
    year: "Mínimo año de la película",
    results_count: "Cantidad de resultados",
    results: "Resultados",
    no_results: "No se encontraron resultados.",
    overview: "Resumen",
    director: "Director",
    genres: "Género",
    card_year: "Año",
    card_rating: "Puntuación",
    more_info: "Más información",
};

impl Language {
    pub fn labels(self) -> &'static Labels {
        match self {
            Language::English => &ENGLISH,
            Language::Spanish => &SPANISH,
        }
    }
}

/// Card heading, e.g. `Heat (1995) - 8.3 ⭐`.
pub fn heading(record: &ResultRecord) -> String {
    format!("{} ({}) - {} ⭐", record.title, record.year, record.rating)
}

pub fn render_text(records: &[ResultRecord], lang: Language, link_prefix: &str) -> String {
    let labels = lang.labels();
    let mut out = String::new();
    let _ = writeln!(out, "{}", labels.results);
    if records.is_empty() {
        let _ = writeln!(out, "{}", labels.no_results);
        return out;
    }
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, heading(record));
        let _ = writeln!(out, "   {}: {}", labels.overview, record.overview);
        let _ = writeln!(out, "   {}: {}", labels.director, record.director);
        let _ = writeln!(out, "   {}: {}", labels.genres, record.genres.join(", "));
        let _ = writeln!(out, "   {}: {}", labels.card_year, record.year);
        let _ = writeln!(out, "   {}: {}", labels.card_rating, record.rating);
        let _ = writeln!(out, "   {}: {}", labels.more_info, record.link(link_prefix));
    }
    out
}

pub fn render_json(records: &[ResultRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResultRecord {
        ResultRecord {
            id: "tt0113277".into(),
            score: 0.87,
            title: "Heat".into(),
            overview: "A group of professional bank robbers...".into(),
            director: "Michael Mann".into(),
            genres: vec!["Action".into(), "Crime".into(), "Drama".into()],
            year: 1995,
            rating: 8.3,
            path: "title/tt0113277/".into(),
        }
    }

    #[test]
    fn parses_language_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("Español".parse::<Language>().unwrap(), Language::Spanish);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn card_layout() {
        let text = render_text(&[record()], Language::English, "https://www.imdb.com/");
        assert!(text.starts_with("Results\n"));
        assert!(text.contains("1. Heat (1995) - 8.3 ⭐"));
        assert!(text.contains("Genre: Action, Crime, Drama"));
        assert!(text.contains("More info: https://www.imdb.com/title/tt0113277/"));
    }

    #[test]
    fn empty_results_in_spanish() {
        let text = render_text(&[], Language::Spanish, "https://www.imdb.com/");
        assert_eq!(text, "Resultados\nNo se encontraron resultados.\n");
    }

    #[test]
    fn json_keeps_order() {
        let mut second = record();
        second.id = "tt2".into();
        let json: serde_json::Value = serde_json::from_str(&render_json(&[record(), second]).unwrap()).unwrap();
        assert_eq!(json[0]["id"], "tt0113277");
        assert_eq!(json[1]["id"], "tt2");
    }
}
