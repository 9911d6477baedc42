/// External provider abstractions
///
/// The recommendation pipeline talks to two opaque HTTP services: a movie catalog
/// (TMDB) and a text-completion API (OpenAI chat completions). Both sit behind
/// traits so handlers and tests can swap implementations.
use chrono::NaiveDate;
use std::time::Duration;

use crate::models::{Genre, MovieDetails, MovieSummary, TmdbPage};

pub mod openai;
pub mod tmdb;

pub use openai::OpenAiCompletion;
pub use tmdb::TmdbCatalog;

/// Errors raised while talking to an upstream provider
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    Decode(String),

    #[error("Completion response contained no text")]
    EmptyCompletion,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// True when the upstream answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Status { status: 404, .. })
    }

    /// Failures worth a single immediate retry (timeouts, dropped connections)
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Read access to the movie catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search movies by title
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<TmdbPage<MovieSummary>, ProviderError>;

    /// Fetch the full detail record for one movie
    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, ProviderError>;

    /// Fetch one page of releases dated within `[from, to]`, oldest first
    async fn upcoming_page(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<TmdbPage<MovieSummary>, ProviderError>;

    /// The catalog's genre id → name list
    async fn genres(&self) -> Result<Vec<Genre>, ProviderError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// A single chat-style completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

/// Text-generation service returning one free-form completion
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the raw completion text. Empty output is an error.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Turns a non-success response into `ProviderError::Status`, keeping the body
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = ProviderError::Status {
            status: 404,
            body: "{\"status_message\":\"not found\"}".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(ProviderError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(!ProviderError::EmptyCompletion.is_transient());
    }
}
