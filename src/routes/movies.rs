use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Genre, MovieDetails, MovieSummary, TmdbPage},
    services::ProviderError,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

/// Detail record with genres flattened to names
#[derive(Debug, Serialize)]
pub struct MovieDetailsResponse {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub genre_ids: Vec<i64>,
    pub genres: Vec<String>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
}

impl From<MovieDetails> for MovieDetailsResponse {
    fn from(details: MovieDetails) -> Self {
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
            runtime: details.runtime,
            tagline: details.tagline.filter(|t| !t.is_empty()),
        }
    }
}

/// Handler for GET /api/movies/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<TmdbPage<MovieSummary>>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query must not be empty".to_string(),
        ));
    }
    let page = params.page.unwrap_or(1).max(1);

    let results = state
        .catalog
        .search_movies(query, page)
        .await
        .map_err(AppError::CatalogUnavailable)?;

    tracing::debug!(query, page, hits = results.results.len(), "Title search");
    Ok(Json(results))
}

/// Handler for GET /api/movies/:id
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MovieDetailsResponse>> {
    let details = state
        .catalog
        .movie_details(movie_id)
        .await
        .map_err(|e| not_found_or_unavailable(e, movie_id))?;

    Ok(Json(details.into()))
}

/// Handler for GET /api/genres
pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state
        .catalog
        .genres()
        .await
        .map_err(AppError::CatalogUnavailable)?;
    Ok(Json(genres))
}

fn not_found_or_unavailable(error: ProviderError, movie_id: i64) -> AppError {
    if error.is_not_found() {
        AppError::NotFound(format!("Movie {} not found", movie_id))
    } else {
        AppError::CatalogUnavailable(error)
    }
}
