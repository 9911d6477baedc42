use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use super::null_as_default;

/// Genre id → display name, as published by the catalog
pub type GenreLookup = HashMap<i64, String>;

const UNKNOWN_GENRE: &str = "Unknown";

/// A `{id, name}` genre pair as returned by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A movie the user has marked as liked
///
/// Accepts both the catalog's snake_case field names and camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteMovie {
    pub id: i64,
    pub title: String,
    #[serde(default, alias = "releaseDate", deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
}

/// Catalog listing entry (search results, discover pages)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
}

/// An upcoming release eligible to be recommended
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMovie {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    pub overview: String,
    pub genre_ids: Vec<i64>,
    pub genre_names: Option<Arc<GenreLookup>>,
}

impl CandidateMovie {
    pub fn from_summary(summary: MovieSummary, genre_names: Option<Arc<GenreLookup>>) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            release_date: summary.release_date,
            overview: summary.overview,
            genre_ids: summary.genre_ids,
            genre_names,
        }
    }

    /// Parsed release date; `None` when the catalog has no usable date
    pub fn release_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.release_date.trim(), "%Y-%m-%d").ok()
    }

    /// Genre names for prompt display, "Unknown" for unmapped ids
    pub fn genre_labels(&self) -> Vec<&str> {
        self.genre_ids
            .iter()
            .map(|id| {
                self.genre_names
                    .as_deref()
                    .and_then(|lookup| lookup.get(id))
                    .map(String::as_str)
                    .unwrap_or(UNKNOWN_GENRE)
            })
            .collect()
    }
}

/// Full detail record from GET /movie/{id}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
}

/// A recommendation ready for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecommendation {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub genre_ids: Vec<i64>,
    pub genres: Vec<String>,
    pub explanation: String,
}

impl EnrichedRecommendation {
    /// Merges a detail record with the model's rationale.
    ///
    /// Genres always come from the detail record.
    pub fn from_details(details: MovieDetails, explanation: String) -> Self {
        let (genre_ids, genres) = details
            .genres
            .into_iter()
            .map(|genre| (genre.id, genre.name))
            .unzip();

        Self {
            id: details.id,
            title: details.title,
            overview: details.overview,
            poster_path: details.poster_path,
            release_date: details.release_date,
            vote_average: details.vote_average,
            genre_ids,
            genres,
            explanation,
        }
    }
}
