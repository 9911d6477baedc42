use serde::{Deserialize, Deserializer, Serialize};

pub mod movie;
pub mod recommendation;

pub use movie::{
    CandidateMovie, EnrichedRecommendation, FavoriteMovie, Genre, GenreLookup, MovieDetails,
    MovieSummary,
};
pub use recommendation::{RecommendationCandidate, RecommendationsResponse};

/// Treats an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// One page of a paginated TMDB listing (discover, search, upcoming)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Response from GET /genre/movie/list
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}
