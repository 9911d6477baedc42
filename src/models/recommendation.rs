use serde::{Deserialize, Serialize};

use super::EnrichedRecommendation;

/// A single pick recovered from the model's response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCandidate {
    pub movie_id: i64,
    pub title: String,
    pub explanation: String,
}

/// Body of a successful POST /api/recommendations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<EnrichedRecommendation>,
}
