use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{FavoriteMovie, RecommendationsResponse},
};

use super::AppState;

const INVALID_FAVORITES: &str = "Invalid favorites data";

/// Handler for POST /api/recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<RecommendationsResponse>> {
    let request_id = request_id
        .map(|Extension(id)| id.to_string())
        .unwrap_or_default();

    let favorites = match body {
        Ok(Json(body)) => parse_favorites(body)?,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "Rejected recommendations body");
            return Err(AppError::InvalidInput(INVALID_FAVORITES.to_string()));
        }
    };

    tracing::info!(
        request_id = %request_id,
        favorites = favorites.len(),
        "Generating recommendations"
    );

    let today = Utc::now().date_naive();
    let recommendations = state.recommender.recommend(&favorites, today).await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations generated"
    );

    Ok(Json(RecommendationsResponse { recommendations }))
}

/// `favorites` must be present, an array, and every entry a well-formed movie
fn parse_favorites(mut body: Value) -> AppResult<Vec<FavoriteMovie>> {
    let favorites = match body.get_mut("favorites") {
        Some(value @ Value::Array(_)) => value.take(),
        _ => return Err(AppError::InvalidInput(INVALID_FAVORITES.to_string())),
    };

    serde_json::from_value(favorites).map_err(|e| {
        tracing::warn!(error = %e, "Malformed favorite entry");
        AppError::InvalidInput(INVALID_FAVORITES.to_string())
    })
}
