//! Axum route handlers for the Catalogue API.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalogue::loader::LoadReport;
use crate::catalogue::store::CatalogueHit;
use crate::errors::AppError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct CatalogueSummary {
    pub collection: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub k: Option<usize>,
}

/// POST /api/v1/catalogue/upload
///
/// Accepts a multipart CSV upload in the `file` field and populates the collection if empty.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<LoadReport>, AppError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            data = Some(bytes);
            break;
        }
    }

    let data = data.ok_or_else(|| {
        AppError::Validation(format!("Upload a CSV file in the '{UPLOAD_FIELD}' field"))
    })?;
    info!("Received catalogue upload ({} bytes)", data.len());

    let report = state.loader.load(&data).await?;
    state.session.write().await.catalogue_uploaded = true;

    Ok(Json(report))
}

/// GET /api/v1/catalogue
pub async fn handle_summary(
    State(state): State<AppState>,
) -> Result<Json<CatalogueSummary>, AppError> {
    let store = state.loader.store();
    Ok(Json(CatalogueSummary {
        collection: store.collection().to_string(),
        count: store.count().await?,
    }))
}

/// GET /api/v1/catalogue/search?q=...&k=...
///
/// Runs the same similarity query the matcher uses and returns the ranked hits.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<CatalogueHit>>, AppError> {
    if params.q.trim().is_empty() {
        return Err(AppError::Validation("q cannot be empty".to_string()));
    }
    let k = params.k.unwrap_or(state.config.match_count);
    let hits = state
        .loader
        .store()
        .query(&[params.q.as_str()], k)
        .await?
        .into_iter()
        .flatten()
        .collect();
    Ok(Json(hits))
}
