//! Axum route handlers for the Cover Letter API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::generation::fetcher::validate_job_url;
use crate::generation::pipeline::{CoverLetterReport, Pipeline};
use crate::llm_client::LlmClient;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub job_url: String,
}

/// POST /api/v1/cover-letter
///
/// Full pipeline: URL check → session check → fetch → extract → match → generate.
/// Stage failures after extraction come back inside the report, not as an error status.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterReport>, AppError> {
    // Surrounding whitespace is not stripped; " https://..." fails the format check.
    let job_url = request.job_url.as_str();
    if job_url.trim().is_empty() {
        return Err(AppError::Validation("job_url cannot be empty".to_string()));
    }
    validate_job_url(job_url)?;

    let (api_key, model_name) = state.session.read().await.require_ready()?;
    let llm = LlmClient::new(
        state.llm_http.clone(),
        &state.config.llm.base_url,
        api_key,
        model_name,
    );

    let pipeline = Pipeline {
        fetcher: &state.fetcher,
        store: state.loader.store(),
        llm: &llm,
        persona: &state.config.persona,
        match_count: state.config.match_count,
    };

    Ok(Json(pipeline.run(job_url).await?))
}
