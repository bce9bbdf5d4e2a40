//! Catalogue Store — a durable vector collection of (techstack → link) entries.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::catalogue::embedding::{
    cosine_similarity, decode_embedding_blob, encode_embedding_blob, Embedder,
};
use crate::errors::AppError;
use crate::models::catalogue::CatalogueEntryRow;

/// One nearest-neighbour result. `distance` is `1 - cosine similarity`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogueHit {
    pub id: String,
    pub techstack: String,
    pub link: String,
    pub distance: f64,
}

/// Handle to one named collection. Cheap to clone; constructed once at startup.
#[derive(Clone)]
pub struct CatalogueStore {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl CatalogueStore {
    pub fn new(
        pool: SqlitePool,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            pool,
            collection: collection.into(),
            embedder,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embeds `techstack` and stores the entry under the caller-supplied `id`.
    #[cfg(test)]
    pub async fn insert(&self, techstack: &str, link: &str, id: &str) -> Result<(), AppError> {
        let mut vectors = self.embedder.embed(&[techstack]).await?;
        let embedding = vectors
            .pop()
            .ok_or_else(|| AppError::Model("embedder returned no vector".to_string()))?;
        self.insert_embedded(techstack, link, id, &embedding).await
    }

    /// Stores an entry whose embedding was computed by the caller. Loads embed in one batch
    /// and write through here.
    pub async fn insert_embedded(
        &self,
        techstack: &str,
        link: &str,
        id: &str,
        embedding: &[f32],
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO catalogue_entries (id, collection, techstack, link, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&self.collection)
        .bind(techstack)
        .bind(link)
        .bind(encode_embedding_blob(embedding))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!("Inserted catalogue entry {id} into '{}'", self.collection);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM catalogue_entries WHERE collection = ?")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Nearest-neighbour query. Returns one group per query text, each ranked nearest first
    /// (ties keep insertion order) and holding at most `k` hits. An empty collection or
    /// `k == 0` yields empty groups.
    pub async fn query(
        &self,
        texts: &[&str],
        k: usize,
    ) -> Result<Vec<Vec<CatalogueHit>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if k == 0 {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        let rows = sqlx::query_as::<_, CatalogueEntryRow>(
            "SELECT id, techstack, link, embedding FROM catalogue_entries \
             WHERE collection = ? ORDER BY seq",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        let dimensions = self.embedder.dimensions();
        let stored: Vec<(&CatalogueEntryRow, Vec<f32>)> = rows
            .iter()
            .filter_map(|row| match decode_embedding_blob(&row.embedding, dimensions) {
                Some(vector) => Some((row, vector)),
                None => {
                    warn!(
                        "Skipping catalogue entry {}: stored embedding does not have {} dimensions",
                        row.id, dimensions
                    );
                    None
                }
            })
            .collect();

        let query_vectors = self.embedder.embed(texts).await?;

        Ok(query_vectors
            .iter()
            .map(|query| rank(query, &stored, k))
            .collect())
    }
}

fn rank(query: &[f32], stored: &[(&CatalogueEntryRow, Vec<f32>)], k: usize) -> Vec<CatalogueHit> {
    let mut scored: Vec<(f64, &CatalogueEntryRow)> = stored
        .iter()
        .map(|(row, vector)| (cosine_similarity(query, vector), *row))
        .collect();

    // Stable sort keeps insertion order among equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(k)
        .map(|(similarity, row)| CatalogueHit {
            id: row.id.clone(),
            techstack: row.techstack.clone(),
            link: row.link.clone(),
            distance: 1.0 - similarity,
        })
        .collect()
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use super::CatalogueStore;
    use crate::catalogue::embedding::HashEmbedder;
    use crate::db::memory_pool;

    pub async fn memory_store() -> CatalogueStore {
        let embedder = Arc::new(HashEmbedder::new(384));
        CatalogueStore::new(memory_pool().await, "portfolio", embedder)
    }
}
