//! Job Page Fetcher — validates a job URL, downloads the page and extracts its visible text.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::errors::AppError;

const USER_AGENT: &str = concat!("coverletter/", env!("CARGO_PKG_VERSION"));

/// Anchored at the start only: trailing garbage after a valid prefix is accepted.
const JOB_URL_PATTERN: &str =
    r"^http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

fn job_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(JOB_URL_PATTERN).expect("job URL pattern is valid"))
}

fn body_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("body").expect("body selector is valid"))
}

/// Checks URL syntax without touching the network.
pub fn validate_job_url(url: &str) -> Result<(), AppError> {
    if job_url_regex().is_match(url) {
        Ok(())
    } else {
        Err(AppError::Format(
            "Please enter a valid Job URL (starting with http:// or https://).".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct JobPageFetcher {
    client: Client,
}

impl JobPageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build page fetch HTTP client")?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns the page's visible text.
    pub async fn fetch(&self, url: &str) -> Result<String, AppError> {
        validate_job_url(url)?;

        info!("Fetching job page {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{url} returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        let text = extract_page_text(&body);
        if text.is_empty() {
            return Err(AppError::Fetch(format!(
                "{url} yielded no loadable document"
            )));
        }

        debug!("Extracted {} chars of page text from {url}", text.len());
        Ok(text)
    }
}

/// Visible text of an HTML document, one whitespace-collapsed text run per line.
pub fn extract_page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document
        .select(body_selector())
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let collapsed = collapse_whitespace(text);
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
    }
    lines.join("\n")
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
