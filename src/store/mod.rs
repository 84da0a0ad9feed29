//! External store contract for scrapbook pages and media.
//!
//! DESIGN
//! ======
//! A scrapbook is a list of page documents, each holding the full item list
//! as JSON plus store-assigned timestamps. Writes overwrite the whole list
//! (last writer wins per page). `PageStore` is the seam the persistence
//! service talks to; `MemoryStore` backs tests and offline hosts, `PgStore`
//! backs a real deployment.

pub mod memory;
pub mod postgres;


use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::doc::Item;
use crate::payload::MediaEntry;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error from a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("page not found: {0}")]
    PageNotFound(Uuid),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One stored page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub id: Uuid,
    pub items: Vec<Item>,
    /// Milliseconds, as assigned by the store.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Read/write contract of the external page store.
#[async_trait::async_trait]
pub trait PageStore: Send + Sync {
    /// Pages of a scrapbook, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    async fn list_pages(&self, scrapbook: &str) -> Result<Vec<PageDocument>, StoreError>;

    /// Create an empty page and return its id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the page cannot be created.
    async fn create_page(&self, scrapbook: &str) -> Result<Uuid, StoreError>;

    /// Overwrite a page's item list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PageNotFound`] for unknown pages, or another
    /// [`StoreError`] if the write fails.
    async fn save_items(&self, scrapbook: &str, page: Uuid, items: &[Item]) -> Result<(), StoreError>;

    /// Uploaded media entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    async fn list_media(&self, scrapbook: &str) -> Result<Vec<MediaEntry>, StoreError>;
}

/// Decode a stored item list, skipping entries that no longer parse.
#[must_use]
pub fn parse_items(page: Uuid, raw: serde_json::Value) -> Vec<Item> {
    let serde_json::Value::Array(entries) = raw else {
        warn!(%page, "stored items are not a list; treating page as empty");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Item>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(%page, error = %e, "skipping unreadable item");
                None
            }
        })
        .collect()
}
