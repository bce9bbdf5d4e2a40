//! Operator session — the credential, model name and upload flag that gate the pipeline.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// Per-process session. The API key is never serialized back to the client.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub api_key: Option<String>,
    pub model_name: String,
    pub catalogue_uploaded: bool,
}

impl SessionState {
    pub fn new(api_key: Option<String>, model_name: String) -> Self {
        Self {
            api_key,
            model_name,
            catalogue_uploaded: false,
        }
    }

    /// Returns `(api_key, model_name)` if the pipeline may run.
    pub fn require_ready(&self) -> Result<(String, String), AppError> {
        let api_key = self.api_key.as_deref().filter(|k| !k.trim().is_empty());
        match (api_key, self.catalogue_uploaded) {
            (Some(key), true) => Ok((key.to_string(), self.model_name.clone())),
            (None, false) => Err(AppError::Configuration(
                "Please enter your API key and upload a CSV file before proceeding.".to_string(),
            )),
            (None, true) => Err(AppError::Configuration(
                "Please enter your API key before proceeding.".to_string(),
            )),
            (Some(_), false) => Err(AppError::Configuration(
                "Please upload a CSV file before proceeding.".to_string(),
            )),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            model_name: self.model_name.clone(),
            has_api_key: self.api_key.is_some(),
            catalogue_uploaded: self.catalogue_uploaded,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub model_name: String,
    pub has_api_key: bool,
    pub catalogue_uploaded: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.read().await.view())
}

/// PUT /api/v1/session
///
/// Sets the model credential and/or model name. An empty `api_key` clears it.
pub async fn handle_update_session(
    State(state): State<AppState>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.write().await;

    if let Some(model_name) = request.model_name {
        let model_name = model_name.trim();
        if model_name.is_empty() {
            return Err(AppError::Validation("model_name cannot be empty".to_string()));
        }
        session.model_name = model_name.to_string();
    }

    if let Some(api_key) = request.api_key {
        let api_key = api_key.trim();
        session.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
    }

    info!(
        "Session updated: model={}, has_api_key={}",
        session.model_name,
        session.api_key.is_some()
    );
    Ok(Json(session.view()))
}
