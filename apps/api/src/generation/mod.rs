// Cover letter generation: page fetch, job extraction, portfolio matching, letter writing.
// All LLM calls go through llm_client.

pub mod fetcher;
pub mod handlers;
pub mod job_extractor;
pub mod letter;
pub mod matcher;
pub mod pipeline;
pub mod prompts;
