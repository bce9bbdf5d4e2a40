// Portfolio catalogue: embedding, durable vector store, CSV ingestion.

pub mod embedding;
pub mod handlers;
pub mod loader;
pub mod store;
