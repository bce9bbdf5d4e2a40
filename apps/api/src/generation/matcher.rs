//! Portfolio Matcher — picks the catalogue links closest to a job's skills.

use crate::catalogue::store::CatalogueStore;
use crate::errors::AppError;

/// Queries the store with `skills` and flattens the grouped hits into links, preserving
/// rank order. Repeated links are kept.
pub async fn match_links(
    store: &CatalogueStore,
    skills: &str,
    k: usize,
) -> Result<Vec<String>, AppError> {
    let groups = store.query(&[skills], k).await?;
    Ok(groups
        .into_iter()
        .flatten()
        .map(|hit| hit.link)
        .collect())
}
