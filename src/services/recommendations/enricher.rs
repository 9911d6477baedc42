use std::sync::Arc;

use crate::{
    models::{EnrichedRecommendation, RecommendationCandidate},
    services::providers::{CatalogProvider, ProviderError},
};

/// Why one pick could not be enriched
#[derive(thiserror::Error, Debug)]
pub enum EnrichError {
    #[error("details fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("catalog returned movie {returned} for requested id {requested}")]
    IdMismatch { requested: i64, returned: i64 },

    #[error("details task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Fetches full details for every pick concurrently.
///
/// Output order follows input order. Picks whose fetch fails are logged and
/// dropped; the caller decides what an empty result means.
pub async fn enrich_recommendations(
    catalog: Arc<dyn CatalogProvider>,
    picks: Vec<RecommendationCandidate>,
) -> Vec<EnrichedRecommendation> {
    let mut tasks = Vec::with_capacity(picks.len());

    for pick in picks {
        let catalog = catalog.clone();
        let movie_id = pick.movie_id;
        let task = tokio::spawn(async move { enrich_one(catalog.as_ref(), pick).await });
        tasks.push((movie_id, task));
    }

    let mut results: Vec<Result<EnrichedRecommendation, EnrichError>> =
        Vec::with_capacity(tasks.len());
    for (movie_id, task) in tasks {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(EnrichError::from(e)),
        };
        if let Err(e) = &result {
            tracing::error!(movie_id, error = %e, "Error fetching details for movie");
        }
        results.push(result);
    }

    let attempted = results.len();
    let enriched: Vec<EnrichedRecommendation> = results.into_iter().filter_map(Result::ok).collect();

    if enriched.len() < attempted {
        tracing::warn!(
            success_count = enriched.len(),
            error_count = attempted - enriched.len(),
            "Partial enrichment failure"
        );
    }

    enriched
}

async fn enrich_one(
    catalog: &dyn CatalogProvider,
    pick: RecommendationCandidate,
) -> Result<EnrichedRecommendation, EnrichError> {
    let details = catalog.movie_details(pick.movie_id).await?;

    if details.id != pick.movie_id {
        return Err(EnrichError::IdMismatch {
            requested: pick.movie_id,
            returned: details.id,
        });
    }

    Ok(EnrichedRecommendation::from_details(details, pick.explanation))
}
