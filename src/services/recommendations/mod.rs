//! Upcoming-release recommendation pipeline.
//!
//! Stages run strictly in order: fetch the upcoming catalog, filter it to the
//! release window, prompt the completion provider, recover structured picks
//! from the free-form answer, cross-check them against the candidates, and
//! enrich the survivors with full catalog details.

use chrono::NaiveDate;
use std::{sync::Arc, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{EnrichedRecommendation, FavoriteMovie},
    services::providers::{CatalogProvider, CompletionProvider, CompletionRequest, ProviderError},
};

pub mod candidates;
pub mod enricher;
pub mod extractor;
pub mod prompt;
pub mod validator;

pub use extractor::ExtractError;

/// Tunables for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_catalog_pages: u32,
    pub recommendation_count: usize,
    pub min_recommendations: usize,
    pub max_quality_retries: u32,
    pub completion_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub shuffle_candidates: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_catalog_pages: 8,
            recommendation_count: 8,
            min_recommendations: 4,
            max_quality_retries: 2,
            completion_timeout: Duration::from_secs(60),
            temperature: 0.7,
            max_tokens: 1000,
            top_p: None,
            frequency_penalty: None,
            shuffle_candidates: true,
        }
    }
}

/// Generates recommendations of upcoming releases from a favorites list
pub struct RecommendationService {
    catalog: Arc<dyn CatalogProvider>,
    completion: Arc<dyn CompletionProvider>,
    settings: PipelineSettings,
}

impl RecommendationService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        completion: Arc<dyn CompletionProvider>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog,
            completion,
            settings,
        }
    }

    /// Runs the pipeline, re-running it when too few recommendations survive.
    ///
    /// An error on the first run is returned as-is. Later runs only ever
    /// improve on the best result so far; their errors are logged and ignored.
    pub async fn recommend(
        &self,
        favorites: &[FavoriteMovie],
        today: NaiveDate,
    ) -> AppResult<Vec<EnrichedRecommendation>> {
        let mut best = self.run_pipeline(favorites, today).await?;

        let mut attempt = 0;
        while best.len() < self.settings.min_recommendations
            && attempt < self.settings.max_quality_retries
        {
            attempt += 1;
            tracing::info!(
                attempt,
                received = best.len(),
                wanted = self.settings.min_recommendations,
                "Too few recommendations, re-running pipeline"
            );

            match self.run_pipeline(favorites, today).await {
                Ok(result) if result.len() > best.len() => best = result,
                Ok(_) => {}
                Err(e) => tracing::warn!(attempt, error = %e, "Re-run failed, keeping best result"),
            }
        }

        Ok(best)
    }

    /// One full pass through every stage
    pub async fn run_pipeline(
        &self,
        favorites: &[FavoriteMovie],
        today: NaiveDate,
    ) -> AppResult<Vec<EnrichedRecommendation>> {
        let fetched =
            candidates::fetch_upcoming(self.catalog.clone(), today, self.settings.max_catalog_pages)
                .await
                .map_err(AppError::CatalogUnavailable)?;

        let candidates =
            candidates::prepare_candidates(fetched, today, self.settings.shuffle_candidates);
        if candidates.is_empty() {
            tracing::error!("No upcoming movies found");
            return Err(AppError::NotFound("No upcoming movies found".to_string()));
        }

        let user_prompt = prompt::build_user_prompt(
            favorites,
            &candidates,
            self.settings.recommendation_count,
            &prompt::PromptVariation::new(),
        );
        let raw_response = self
            .request_completion(self.completion_request(user_prompt))
            .await
            .map_err(AppError::CompletionFailed)?;
        tracing::debug!(raw_response = %raw_response, "Raw AI response");

        let picks = extractor::extract_recommendations(&raw_response).map_err(|source| {
            tracing::error!(error = %source, "Error parsing AI response");
            AppError::Parse {
                source,
                raw_response: raw_response.clone(),
            }
        })?;

        let validated = validator::validate_against_candidates(picks, &candidates);
        let enriched = enricher::enrich_recommendations(self.catalog.clone(), validated).await;

        tracing::info!(count = enriched.len(), "Final recommendations count");

        if enriched.is_empty() {
            return Err(AppError::NotFound(
                "No valid recommendations could be generated".to_string(),
            ));
        }

        Ok(enriched)
    }

    fn completion_request(&self, user_prompt: String) -> CompletionRequest {
        CompletionRequest {
            system: prompt::SYSTEM_PROMPT.to_string(),
            prompt: user_prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
        }
    }

    /// Bounded completion call, retried once on timeout or connection failure
    async fn request_completion(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        match self.complete_with_timeout(request.clone()).await {
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    error = %e,
                    provider = self.completion.name(),
                    "Completion call failed, retrying once"
                );
                self.complete_with_timeout(request).await
            }
            result => result,
        }
    }

    async fn complete_with_timeout(
        &self,
        request: CompletionRequest,
    ) -> Result<String, ProviderError> {
        let timeout = self.settings.completion_timeout;
        tokio::time::timeout(timeout, self.completion.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(timeout))?
    }
}
