//! Category and pattern administration.
//!
//! Reference data writes for the categorizer. Every mutation invalidates
//! the pattern snapshot so the next categorization observes it.

use crate::dtos::{CreateCategoryRequest, CreatePatternRequest};
use crate::error::AppError;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.db.list_categories().await?;
    Ok(Json(categories))
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = state.db.create_category(payload.name.trim()).await?;
    state.enrichment.invalidate().await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// `POST /api/categories/{category_id}/patterns`
pub async fn add_pattern(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CreatePatternRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let pattern = state
        .db
        .add_pattern(category_id, payload.pattern.trim())
        .await?;
    state.enrichment.invalidate().await?;

    Ok((StatusCode::CREATED, Json(pattern)))
}

/// `DELETE /api/patterns/{pattern_id}`
pub async fn delete_pattern(
    State(state): State<AppState>,
    Path(pattern_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.db.delete_pattern(pattern_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Pattern not found")));
    }
    state.enrichment.invalidate().await?;

    Ok(StatusCode::NO_CONTENT)
}
