//! Letter Generator — writes the cover letter from the job description and matched links.

use crate::config::SenderPersona;
use crate::errors::AppError;
use crate::generation::prompts::LETTER_PROMPT_TEMPLATE;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::LlmClient;

/// Builds the cover letter prompt. Links and description are embedded verbatim, braces included.
pub fn build_letter_prompt(
    description: &str,
    links: &[String],
    persona: &SenderPersona,
) -> String {
    let link_list = format_link_list(links);
    fill_template(
        LETTER_PROMPT_TEMPLATE,
        &[
            ("link_list", link_list.as_str()),
            ("sender_name", persona.name.as_str()),
            ("sender_title", persona.title.as_str()),
            ("company", persona.company.as_str()),
            ("job_description", description),
        ],
    )
}

/// Returns the model's letter text verbatim.
pub async fn generate_letter(
    description: &str,
    links: &[String],
    persona: &SenderPersona,
    llm: &LlmClient,
) -> Result<String, AppError> {
    let prompt = build_letter_prompt(description, links, persona);
    Ok(llm.complete(&prompt).await?)
}

fn format_link_list(links: &[String]) -> String {
    let quoted: Vec<String> = links.iter().map(|l| format!("'{l}'")).collect();
    format!("[{}]", quoted.join(", "))
}
