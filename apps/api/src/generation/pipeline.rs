//! Cover letter pipeline — sequences the stages for one job URL.
//!
//! Flow: fetch page → extract job data → match portfolio links → generate letter.
//!
//! Fetch and extraction failures abort the request. Once job data exists, a matching or
//! generation failure is recorded in the report so the extracted data is still returned.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalogue::store::CatalogueStore;
use crate::config::SenderPersona;
use crate::errors::AppError;
use crate::generation::fetcher::JobPageFetcher;
use crate::generation::job_extractor::{extract_job, JobPosting};
use crate::generation::letter::generate_letter;
use crate::generation::matcher::match_links;
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Matching,
    Generation,
}

/// A failure in a stage that ran after extraction succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub code: &'static str,
    pub message: String,
}

impl StageFailure {
    fn new(stage: Stage, err: AppError) -> Self {
        warn!("{stage:?} stage failed: {err}");
        Self {
            stage,
            code: err.code(),
            message: err.public_message(),
        }
    }
}

/// What the shell renders: the extracted job, matched links and the letter.
#[derive(Debug, Clone, Serialize)]
pub struct CoverLetterReport {
    pub job_url: String,
    pub job: JobPosting,
    pub links: Option<Vec<String>>,
    pub cover_letter: Option<String>,
    pub error: Option<StageFailure>,
}

/// Everything one pipeline run needs.
pub struct Pipeline<'a> {
    pub fetcher: &'a JobPageFetcher,
    pub store: &'a CatalogueStore,
    pub llm: &'a LlmClient,
    pub persona: &'a SenderPersona,
    pub match_count: usize,
}

impl Pipeline<'_> {
    pub async fn run(&self, job_url: &str) -> Result<CoverLetterReport, AppError> {
        // Step 1: Load the page
        let page_text = self.fetcher.fetch(job_url).await?;

        // Step 2: Extract job data
        info!("Extracting job data with model {}", self.llm.model());
        let job = extract_job(&page_text, self.llm).await?;
        info!("Extracted job: role={:?}", job.role);

        let mut report = CoverLetterReport {
            job_url: job_url.to_string(),
            job,
            links: None,
            cover_letter: None,
            error: None,
        };

        // Step 3: Match portfolio links
        let matched = match_links(self.store, &report.job.skills, self.match_count).await;
        let links = match matched {
            Ok(links) => links,
            Err(err) => {
                report.error = Some(StageFailure::new(Stage::Matching, err));
                return Ok(report);
            }
        };
        info!("Matched {} portfolio links", links.len());

        // Step 4: Generate the letter
        let letter = generate_letter(&report.job.description, &links, self.persona, self.llm).await;
        report.links = Some(links);
        match letter {
            Ok(text) => report.cover_letter = Some(text),
            Err(err) => report.error = Some(StageFailure::new(Stage::Generation, err)),
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{routing::get, Router};

    use super::*;
    use crate::catalogue::store::testing::memory_store;
    use crate::llm_client::testing;

    const JOB_PAGE: &str = "<html><body><h1>Django Developer</h1>\
        <p>Build web apps with Python and Django.</p></body></html>";

    const EXTRACTED: &str = r#"{"role": "Django Developer", "experience": "3 years",
        "skills": "Python, Django web development", "description": "Build web apps."}"#;

    const LETTER: &str = "Dear Hiring Manager,\nTechnity Solutions builds Django apps.";

    async fn spawn_job_site() -> String {
        let app = Router::new().route("/job", get(|| async { axum::response::Html(JOB_PAGE) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/job")
    }

    fn scripted_model(prompt: &str) -> Result<String, (u16, String)> {
        if prompt.contains("### VALID JSON (NO PREAMBLE):") {
            Ok(EXTRACTED.to_string())
        } else {
            Ok(LETTER.to_string())
        }
    }

    async fn seeded_store() -> CatalogueStore {
        let store = memory_store().await;
        store.insert("Python, Django", "http://a", "id-1").await.unwrap();
        store.insert("React, Node", "http://b", "id-2").await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_end_to_end_renders_every_stage() {
        let url = spawn_job_site().await;
        let provider = testing::spawn(scripted_model).await;
        let store = seeded_store().await;
        let fetcher = JobPageFetcher::new(Duration::from_secs(5)).unwrap();
        let llm = provider.client();
        let persona = SenderPersona::default();

        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            llm: &llm,
            persona: &persona,
            match_count: 1,
        };
        let report = pipeline.run(&url).await.unwrap();

        assert_eq!(report.job.role, "Django Developer");
        assert_eq!(report.links, Some(vec!["http://a".to_string()]));
        assert_eq!(report.cover_letter.as_deref(), Some(LETTER));
        assert!(report.error.is_none());

        let prompts = provider.recorded_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Django Developer"));
        assert!(prompts[1].contains("Build web apps."));
        assert!(prompts[1].contains("['http://a']"));
        assert!(!report.cover_letter.unwrap().contains("VALID JSON"));
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_extracted_job() {
        let url = spawn_job_site().await;
        let provider = testing::spawn(|prompt: &str| {
            if prompt.contains("### VALID JSON (NO PREAMBLE):") {
                Ok(EXTRACTED.to_string())
            } else {
                Err((429, "Rate limit reached".to_string()))
            }
        })
        .await;
        let store = seeded_store().await;
        let fetcher = JobPageFetcher::new(Duration::from_secs(5)).unwrap();
        let llm = provider.client();
        let persona = SenderPersona::default();

        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            llm: &llm,
            persona: &persona,
            match_count: 2,
        };
        let report = pipeline.run(&url).await.unwrap();

        assert_eq!(report.job.role, "Django Developer");
        assert_eq!(report.links.as_ref().map(Vec::len), Some(2));
        assert!(report.cover_letter.is_none());
        let failure = report.error.unwrap();
        assert_eq!(failure.stage, Stage::Generation);
        assert_eq!(failure.code, "MODEL_ERROR");
    }

    #[tokio::test]
    async fn test_extraction_parse_failure_aborts() {
        let url = spawn_job_site().await;
        let provider = testing::spawn(|_| Ok("I could not find a job here.".to_string())).await;
        let store = seeded_store().await;
        let fetcher = JobPageFetcher::new(Duration::from_secs(5)).unwrap();
        let llm = provider.client();
        let persona = SenderPersona::default();

        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            llm: &llm,
            persona: &persona,
            match_count: 2,
        };
        let err = pipeline.run(&url).await.unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
        assert_eq!(provider.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_url_never_reaches_the_model() {
        let provider = testing::spawn(scripted_model).await;
        let store = seeded_store().await;
        let fetcher = JobPageFetcher::new(Duration::from_secs(5)).unwrap();
        let llm = provider.client();
        let persona = SenderPersona::default();

        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            llm: &llm,
            persona: &persona,
            match_count: 2,
        };
        let err = pipeline.run("www.example.com/job").await.unwrap_err();
        assert_eq!(err.code(), "FORMAT_ERROR");
        assert!(provider.recorded_prompts().is_empty());
    }
}
