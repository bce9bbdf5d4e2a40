// All LLM prompt templates for the generation pipeline.
// Placeholders are filled with `llm_client::prompts::fill_template`.

/// Job extraction prompt. Replace `{page_data}` before sending.
pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}
### INSTRUCTION:
The scraped text is from the careers page of a website.
Extract the job posting in JSON format with keys: `role`, `experience`, `skills`, `description`.
Only return the valid JSON.
### VALID JSON (NO PREAMBLE):"#;

/// Cover letter prompt.
/// Replace: {link_list}, {sender_name}, {sender_title}, {company}, {job_description}
pub const LETTER_PROMPT_TEMPLATE: &str = r#"### JOB DESCRIPTION:
{job_description}

### INSTRUCTION:
Write a cover letter from {sender_name}, {sender_title} at {company}, detailing how {company} can meet the company's needs.
Use portfolio examples: {link_list}.
Do not provide a preamble.
### COVER LETTER (NO PREAMBLE):"#;
