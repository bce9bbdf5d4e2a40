use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_COLLECTION: &str = "portfolio";
pub const DEFAULT_MATCH_COUNT: usize = 2;
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Application configuration loaded from environment variables.
/// Fails at startup if a backend is selected without its required variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub vectorstore_path: PathBuf,
    pub collection: String,
    pub match_count: usize,
    pub llm: LlmSettings,
    pub fetch_timeout_secs: u64,
    pub embedding: EmbeddingBackend,
    pub persona: SenderPersona,
}

/// Connection settings for the chat-completion provider.
/// `api_key` is only a default; the session may supply its own.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub enum EmbeddingBackend {
    /// Deterministic hashed-feature vectors computed in-process.
    Local { dimensions: usize },
    /// Any OpenAI-compatible `/embeddings` endpoint.
    OpenAi {
        api_key: String,
        base_url: String,
        model: String,
        dimensions: usize,
    },
}

/// Who signs the generated cover letter.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderPersona {
    pub name: String,
    pub title: String,
    pub company: String,
}

impl Default for SenderPersona {
    fn default() -> Self {
        Self {
            name: "Hamid Hussain".to_string(),
            title: "BDE".to_string(),
            company: "Technity Solutions".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let persona_default = SenderPersona::default();

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            vectorstore_path: PathBuf::from(env_or("VECTORSTORE_PATH", "vectorstore")),
            collection: env_or("CATALOGUE_COLLECTION", DEFAULT_COLLECTION),
            match_count: parse_env("MATCH_COUNT", DEFAULT_MATCH_COUNT)?,
            llm: LlmSettings {
                base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
                api_key: optional_env("GROQ_API_KEY"),
                model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            },
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 30)?,
            embedding: embedding_from_env()?,
            persona: SenderPersona {
                name: env_or("SENDER_NAME", &persona_default.name),
                title: env_or("SENDER_TITLE", &persona_default.title),
                company: env_or("SENDER_COMPANY", &persona_default.company),
            },
        })
    }
}

fn embedding_from_env() -> Result<EmbeddingBackend> {
    let dimensions = parse_env("EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIM)?;
    match env_or("EMBEDDING_BACKEND", "local").as_str() {
        "local" => Ok(EmbeddingBackend::Local { dimensions }),
        "openai" => Ok(EmbeddingBackend::OpenAi {
            api_key: require_env("OPENAI_API_KEY")?,
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            dimensions,
        }),
        other => anyhow::bail!("EMBEDDING_BACKEND must be 'local' or 'openai', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona_matches_letter_signature() {
        let persona = SenderPersona::default();
        assert_eq!(persona.name, "Hamid Hussain");
        assert_eq!(persona.company, "Technity Solutions");
    }

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u16 = parse_env("COVERLETTER_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(value, 8080);
    }
}
