use std::collections::HashSet;

use crate::models::{CandidateMovie, RecommendationCandidate};

/// Keeps only picks whose id was offered to the model, first pick per id wins
pub fn validate_against_candidates(
    picks: Vec<RecommendationCandidate>,
    candidates: &[CandidateMovie],
) -> Vec<RecommendationCandidate> {
    let offered: HashSet<i64> = candidates.iter().map(|movie| movie.id).collect();
    let mut seen = HashSet::new();
    let parsed_count = picks.len();

    let validated: Vec<RecommendationCandidate> = picks
        .into_iter()
        .filter(|pick| {
            if !offered.contains(&pick.movie_id) {
                tracing::warn!(
                    movie_id = pick.movie_id,
                    title = %pick.title,
                    "Movie ID not found in upcoming movies list"
                );
                return false;
            }
            if !seen.insert(pick.movie_id) {
                tracing::debug!(movie_id = pick.movie_id, "Dropping duplicate recommendation");
                return false;
            }
            true
        })
        .collect();

    tracing::info!(
        parsed = parsed_count,
        validated = validated.len(),
        "Validated recommendations against candidates"
    );

    validated
}
