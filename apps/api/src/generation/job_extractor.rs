//! Job Data Extractor — turns scraped page text into a structured `JobPosting`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::generation::prompts::EXTRACT_PROMPT_TEMPLATE;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmClient;

/// Structured job data. Every field is free text; absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub role: String,
    pub experience: String,
    pub skills: String,
    pub description: String,
}

/// Asks the model to extract job fields from `page_text`.
pub async fn extract_job(page_text: &str, llm: &LlmClient) -> Result<JobPosting, AppError> {
    let prompt = fill_template(EXTRACT_PROMPT_TEMPLATE, &[("page_data", page_text)]);
    let value: Value = llm.call_json(&prompt).await?;
    job_from_value(value)
}

/// Maps untrusted model JSON onto a `JobPosting`.
///
/// Accepts an object, or an array whose first element is an object (the model sometimes
/// returns a list of postings). Missing or null keys become empty strings; string arrays
/// are joined with ", "; numbers and booleans are stringified.
pub fn job_from_value(value: Value) -> Result<JobPosting, AppError> {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(AppError::Parse(
                    "expected a list of job objects".to_string(),
                ))
            }
            None => return Err(AppError::Parse("model returned no job postings".to_string())),
        },
        _ => {
            return Err(AppError::Parse(
                "expected a JSON object with role, experience, skills, description".to_string(),
            ))
        }
    };

    Ok(JobPosting {
        role: field_text(&object, "role"),
        experience: field_text(&object, "experience"),
        skills: field_text(&object, "skills"),
        description: field_text(&object, "description"),
    })
}

fn field_text(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing;

    const RUST_JOB_JSON: &str = r#"{
        "role": "Senior Rust Engineer",
        "experience": "5+ years",
        "skills": ["Rust", "Tokio", "PostgreSQL"],
        "description": "Build and operate distributed storage services."
    }"#;

    #[test]
    fn test_full_object_maps_every_field() {
        let job = job_from_value(serde_json::from_str(RUST_JOB_JSON).unwrap()).unwrap();
        assert_eq!(job.role, "Senior Rust Engineer");
        assert_eq!(job.experience, "5+ years");
        assert_eq!(job.skills, "Rust, Tokio, PostgreSQL");
        assert_eq!(job.description, "Build and operate distributed storage services.");
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let job = job_from_value(json!({})).unwrap();
        assert_eq!(job, JobPosting::default());

        let job = job_from_value(json!({"role": "Analyst", "skills": null})).unwrap();
        assert_eq!(job.role, "Analyst");
        assert_eq!(job.skills, "");
    }

    #[test]
    fn test_scalars_are_stringified() {
        let job = job_from_value(json!({"experience": 3, "role": true})).unwrap();
        assert_eq!(job.experience, "3");
        assert_eq!(job.role, "true");
    }

    #[test]
    fn test_first_posting_of_a_list_is_used() {
        let job = job_from_value(json!([{"role": "First"}, {"role": "Second"}])).unwrap();
        assert_eq!(job.role, "First");
    }

    #[test]
    fn test_wrong_shapes_are_parse_errors() {
        for value in [json!([]), json!("just text"), json!([1, 2]), json!(42)] {
            let err = job_from_value(value).unwrap_err();
            assert_eq!(err.code(), "PARSE_ERROR");
        }
    }

    #[tokio::test]
    async fn test_extract_job_sends_page_text() {
        let provider = testing::spawn(|_| Ok(RUST_JOB_JSON.to_string())).await;
        let job = extract_job("Careers page: Rust wanted", &provider.client())
            .await
            .unwrap();
        assert_eq!(job.role, "Senior Rust Engineer");

        let prompts = provider.recorded_prompts();
        assert!(prompts[0].contains("Careers page: Rust wanted"));
        assert!(prompts[0].contains("VALID JSON (NO PREAMBLE)"));
    }

    #[tokio::test]
    async fn test_extract_job_with_no_fields_is_not_an_error() {
        let provider = testing::spawn(|_| Ok("{}".to_string())).await;
        let job = extract_job("Cookie banner only", &provider.client())
            .await
            .unwrap();
        assert_eq!(job, JobPosting::default());
    }

    #[tokio::test]
    async fn test_extract_job_non_json_reply_is_parse_error() {
        let provider =
            testing::spawn(|_| Ok("Sure! Here is the job: Senior Rust Engineer".to_string())).await;
        let err = extract_job("page", &provider.client()).await.unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_extract_job_model_failure_is_model_error() {
        let provider = testing::spawn(|_| Err((401, "Invalid API Key".to_string()))).await;
        let err = extract_job("page", &provider.client()).await.unwrap_err();
        assert_eq!(err.code(), "MODEL_ERROR");
    }
}
