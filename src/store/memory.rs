//! In-process page store with a write log and failure injection.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageDocument, PageStore, StoreError};
use crate::doc::Item;
use crate::payload::MediaEntry;

/// One completed `save_items` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRecord {
    pub scrapbook: String,
    pub page: Uuid,
    pub items: Vec<Item>,
}

#[derive(Default)]
struct MemoryState {
    pages: HashMap<String, Vec<PageDocument>>,
    /// Media in upload order.
    media: HashMap<String, Vec<MediaEntry>>,
    writes: Vec<SaveRecord>,
    /// Logical clock for `createdAt`/`updatedAt`.
    clock: i64,
    fail_creates: bool,
    fail_saves: bool,
}

impl MemoryState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// Page store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a page with existing items, bypassing the write log.
    pub async fn seed_page(&self, scrapbook: &str, items: Vec<Item>) -> Uuid {
        let mut state = self.state.write().await;
        let now = state.tick();
        let id = Uuid::new_v4();
        state
            .pages
            .entry(scrapbook.to_string())
            .or_default()
            .push(PageDocument { id, items, created_at: now, updated_at: now });
        id
    }

    /// Record an uploaded media entry.
    pub async fn insert_media(&self, scrapbook: &str, entry: MediaEntry) {
        self.state
            .write()
            .await
            .media
            .entry(scrapbook.to_string())
            .or_default()
            .push(entry);
    }

    /// Current document for a page.
    pub async fn page(&self, scrapbook: &str, id: Uuid) -> Option<PageDocument> {
        self.state
            .read()
            .await
            .pages
            .get(scrapbook)
            .and_then(|pages| pages.iter().find(|p| p.id == id))
            .cloned()
    }

    /// Every successful `save_items` call, in completion order.
    pub async fn writes(&self) -> Vec<SaveRecord> {
        self.state.read().await.writes.clone()
    }

    /// Make subsequent `create_page` calls fail.
    pub async fn fail_creates(&self, fail: bool) {
        self.state.write().await.fail_creates = fail;
    }

    /// Make subsequent `save_items` calls fail.
    pub async fn fail_saves(&self, fail: bool) {
        self.state.write().await.fail_saves = fail;
    }
}

#[async_trait::async_trait]
impl PageStore for MemoryStore {
    async fn list_pages(&self, scrapbook: &str) -> Result<Vec<PageDocument>, StoreError> {
        let state = self.state.read().await;
        let mut pages = state.pages.get(scrapbook).cloned().unwrap_or_default();
        pages.sort_by_key(|p| p.created_at);
        Ok(pages)
    }

    async fn create_page(&self, scrapbook: &str) -> Result<Uuid, StoreError> {
        let mut state = self.state.write().await;
        if state.fail_creates {
            return Err(StoreError::Unavailable("create_page disabled".into()));
        }
        let now = state.tick();
        let id = Uuid::new_v4();
        state
            .pages
            .entry(scrapbook.to_string())
            .or_default()
            .push(PageDocument { id, items: Vec::new(), created_at: now, updated_at: now });
        Ok(id)
    }

    async fn save_items(&self, scrapbook: &str, page: Uuid, items: &[Item]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.fail_saves {
            return Err(StoreError::Unavailable("save_items disabled".into()));
        }
        let now = state.tick();
        let doc = state
            .pages
            .get_mut(scrapbook)
            .and_then(|pages| pages.iter_mut().find(|p| p.id == page))
            .ok_or(StoreError::PageNotFound(page))?;
        doc.items = items.to_vec();
        doc.updated_at = now;
        state.writes.push(SaveRecord { scrapbook: scrapbook.to_string(), page, items: items.to_vec() });
        Ok(())
    }

    async fn list_media(&self, scrapbook: &str) -> Result<Vec<MediaEntry>, StoreError> {
        let state = self.state.read().await;
        let mut media = state.media.get(scrapbook).cloned().unwrap_or_default();
        media.reverse();
        Ok(media)
    }
}
