use sqlx::FromRow;

/// A stored catalogue entry as read back for ranking. `embedding` is a little-endian f32 blob.
#[derive(Debug, Clone, FromRow)]
pub struct CatalogueEntryRow {
    pub id: String,
    pub techstack: String,
    pub link: String,
    pub embedding: Vec<u8>,
}
