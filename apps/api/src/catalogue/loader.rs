//! Catalogue Loader — validates an uploaded CSV and populates the store once.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalogue::store::CatalogueStore;
use crate::errors::AppError;

pub const TECHSTACK_COLUMN: &str = "Techstack";
pub const LINKS_COLUMN: &str = "Links";

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueRow {
    pub techstack: String,
    pub link: String,
}

/// A row left out of ingestion. `line` is the 1-based line in the uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCatalogue {
    pub rows: Vec<CatalogueRow>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Inserted,
    AlreadyPopulated,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub inserted: usize,
    pub skipped: Vec<SkippedRow>,
    /// Entries in the collection after the load.
    pub total: i64,
}

/// Parses CSV bytes into catalogue rows.
///
/// Fails if either required column is missing (naming every missing column) or the file is
/// not readable CSV. Rows with an empty techstack or link are skipped and reported.
pub fn parse_catalogue(data: &[u8]) -> Result<ParsedCatalogue, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Error reading the CSV file: {e}")))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let techstack_idx = position(TECHSTACK_COLUMN);
    let links_idx = position(LINKS_COLUMN);

    let (techstack_idx, links_idx) = match (techstack_idx, links_idx) {
        (Some(t), Some(l)) => (t, l),
        (t, l) => {
            let missing: Vec<&str> = [(t, TECHSTACK_COLUMN), (l, LINKS_COLUMN)]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name)
                .collect();
            return Err(AppError::Validation(format!(
                "The uploaded CSV should contain '{TECHSTACK_COLUMN}' and '{LINKS_COLUMN}' columns; missing: {}",
                missing.join(", ")
            )));
        }
    };

    let mut parsed = ParsedCatalogue::default();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::Validation(format!("Error reading the CSV file: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let techstack = record.get(techstack_idx).unwrap_or_default();
        let link = record.get(links_idx).unwrap_or_default();

        let reason = match (techstack.is_empty(), link.is_empty()) {
            (true, true) => Some("missing Techstack and Links values"),
            (true, false) => Some("missing Techstack value"),
            (false, true) => Some("missing Links value"),
            (false, false) => None,
        };

        match reason {
            Some(reason) => parsed.skipped.push(SkippedRow {
                line,
                reason: reason.to_string(),
            }),
            None => parsed.rows.push(CatalogueRow {
                techstack: techstack.to_string(),
                link: link.to_string(),
            }),
        }
    }

    Ok(parsed)
}

/// Populates a [`CatalogueStore`] from uploads, at most once while the store is non-empty.
pub struct CatalogueLoader {
    store: CatalogueStore,
    // Serializes the emptiness check with the inserts that follow it.
    lock: Mutex<()>,
}

impl CatalogueLoader {
    pub fn new(store: CatalogueStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &CatalogueStore {
        &self.store
    }

    /// Validates `data` and, if the collection is empty, inserts every valid row under a
    /// fresh id. A non-empty collection is left untouched.
    pub async fn load(&self, data: &[u8]) -> Result<LoadReport, AppError> {
        let parsed = parse_catalogue(data)?;
        for row in &parsed.skipped {
            warn!("Skipping catalogue line {}: {}", row.line, row.reason);
        }

        let _guard = self.lock.lock().await;

        let existing = self.store.count().await?;
        if existing > 0 {
            info!(
                "Collection '{}' already populated ({existing} entries), skipping insert",
                self.store.collection()
            );
            return Ok(LoadReport {
                status: LoadStatus::AlreadyPopulated,
                inserted: 0,
                skipped: parsed.skipped,
                total: existing,
            });
        }

        let texts: Vec<&str> = parsed.rows.iter().map(|r| r.techstack.as_str()).collect();
        let embeddings = self.store.embedder().embed(&texts).await?;

        let mut inserted = 0;
        for (row, embedding) in parsed.rows.iter().zip(embeddings.iter()) {
            let id = Uuid::new_v4().to_string();
            self.store
                .insert_embedded(&row.techstack, &row.link, &id, embedding)
                .await?;
            inserted += 1;
        }

        let total = self.store.count().await?;
        info!(
            "Inserted {inserted} entries into '{}' (total {total})",
            self.store.collection()
        );

        Ok(LoadReport {
            status: LoadStatus::Inserted,
            inserted,
            skipped: parsed.skipped,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::store::testing::memory_store;

    const VALID_CSV: &str = "Techstack,Links\n\
        \"Python, Django\",http://a\n\
        \"React, Node\",http://b\n\
        \"Rust, Tokio\",http://c\n";

    #[test]
    fn test_parse_reads_required_columns_and_ignores_extras() {
        let csv = "Notes,Links,Techstack\nfirst,http://a,\"Python, Django\"\n";
        let parsed = parse_catalogue(csv.as_bytes()).unwrap();
        assert_eq!(
            parsed.rows,
            vec![CatalogueRow {
                techstack: "Python, Django".to_string(),
                link: "http://a".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_names_every_missing_column() {
        let err = parse_catalogue(b"Stack,Url\nGo,http://x\n").unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("missing: Techstack, Links"), "{msg}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }

        let err = parse_catalogue(b"Techstack\nGo\n").unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.ends_with("missing: Links"), "{msg}"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_column_names_are_case_sensitive() {
        assert!(parse_catalogue(b"techstack,links\nGo,http://x\n").is_err());
    }

    #[test]
    fn test_parse_skips_rows_with_empty_cells() {
        let csv = "Techstack,Links\nGo,http://go\n,http://orphan\nRust,\n";
        let parsed = parse_catalogue(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(
            parsed.skipped,
            vec![
                SkippedRow {
                    line: 3,
                    reason: "missing Techstack value".to_string()
                },
                SkippedRow {
                    line: 4,
                    reason: "missing Links value".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_short_row_counts_as_missing_link() {
        let parsed = parse_catalogue(b"Techstack,Links\nGo\n").unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.skipped[0].reason, "missing Links value");
    }

    #[tokio::test]
    async fn test_load_missing_column_inserts_nothing() {
        let loader = CatalogueLoader::new(memory_store().await);
        let err = loader.load(b"Techstack,Url\nGo,http://x\n").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(loader.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_into_empty_store_inserts_every_row() {
        let loader = CatalogueLoader::new(memory_store().await);
        let report = loader.load(VALID_CSV.as_bytes()).await.unwrap();
        assert_eq!(report.status, LoadStatus::Inserted);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.total, 3);
        assert_eq!(loader.store().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_second_load_is_skipped() {
        let loader = CatalogueLoader::new(memory_store().await);
        loader.load(VALID_CSV.as_bytes()).await.unwrap();

        let other = "Techstack,Links\nGo,http://go\n";
        let report = loader.load(other.as_bytes()).await.unwrap();
        assert_eq!(report.status, LoadStatus::AlreadyPopulated);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.total, 3);
        assert_eq!(loader.store().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_loaded_rows_are_queryable() {
        let loader = CatalogueLoader::new(memory_store().await);
        loader.load(VALID_CSV.as_bytes()).await.unwrap();
        let hits = loader
            .store()
            .query(&["Django web development"], 1)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(hits[0].link, "http://a");
    }
}
