use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;

use crate::catalogue::loader::CatalogueLoader;
use crate::config::Config;
use crate::generation::fetcher::JobPageFetcher;
use crate::session::SessionState;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the catalogue store handle; the only writer to it.
    pub loader: Arc<CatalogueLoader>,
    pub fetcher: JobPageFetcher,
    /// Transport shared by every per-request `LlmClient`.
    pub llm_http: Client,
    pub session: Arc<RwLock<SessionState>>,
}

#[cfg(test)]
pub mod testing {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::catalogue::store::testing::memory_store;
    use crate::config::{EmbeddingBackend, LlmSettings, SenderPersona};

    pub fn test_config(llm_base_url: &str) -> Config {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            vectorstore_path: PathBuf::from("unused"),
            collection: "portfolio".to_string(),
            match_count: 2,
            llm: LlmSettings {
                base_url: llm_base_url.to_string(),
                api_key: None,
                model: "test-model".to_string(),
                timeout_secs: 5,
            },
            fetch_timeout_secs: 5,
            embedding: EmbeddingBackend::Local { dimensions: 384 },
            persona: SenderPersona::default(),
        }
    }

    /// State over an in-memory store, with the model provider at `llm_base_url`.
    pub async fn test_state(llm_base_url: &str) -> AppState {
        let config = test_config(llm_base_url);
        AppState {
            session: Arc::new(RwLock::new(SessionState::new(
                config.llm.api_key.clone(),
                config.llm.model.clone(),
            ))),
            config,
            loader: Arc::new(CatalogueLoader::new(memory_store().await)),
            fetcher: JobPageFetcher::new(Duration::from_secs(5)).unwrap(),
            llm_http: Client::new(),
        }
    }
}
