/// TMDB (The Movie Database) catalog provider
///
/// Endpoints used:
/// - `/search/movie` for title search
/// - `/movie/{id}` for detail records
/// - `/discover/movie` with a primary release date window for upcoming releases
/// - `/genre/movie/list` for the genre id → name mapping
use chrono::NaiveDate;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use crate::{
    models::{Genre, MovieDetails, MovieSummary, TmdbGenreList, TmdbPage},
    services::providers::{check_status, CatalogProvider, ProviderError},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
}

impl TmdbCatalog {
    pub fn new(access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    /// Query parameters for one page of the upcoming-release listing
    fn discover_query(from: NaiveDate, to: NaiveDate, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("primary_release_date.gte", from.format(DATE_FORMAT).to_string()),
            ("primary_release_date.lte", to.format(DATE_FORMAT).to_string()),
            ("sort_by", "primary_release_date.asc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", page.to_string()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "TMDB request failed");
            e
        })?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(path = %path, response = %body, "Raw TMDB response");
            ProviderError::Decode(format!("Failed to parse TMDB response for {}: {}", path, e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<TmdbPage<MovieSummary>, ProviderError> {
        let results: TmdbPage<MovieSummary> = self
            .get_json(
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            page,
            results = results.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(results)
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, ProviderError> {
        let details: MovieDetails = self
            .get_json(&format!("/movie/{}", movie_id), &[])
            .await?;

        tracing::debug!(movie_id, genres = details.genres.len(), "Movie details fetched");

        Ok(details)
    }

    async fn upcoming_page(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<TmdbPage<MovieSummary>, ProviderError> {
        self.get_json("/discover/movie", &Self::discover_query(from, to, page))
            .await
    }

    async fn genres(&self) -> Result<Vec<Genre>, ProviderError> {
        let list: TmdbGenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
