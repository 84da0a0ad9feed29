//! Persistence service: fire-and-forget page writes and page creation.
//!
//! DESIGN
//! ======
//! The engine returns `SavePage` and `CreatePage` actions; `dispatch` turns
//! each into a spawned task and returns immediately. Writes are not retried,
//! not ordered, and never surface errors to the editor; failures are logged
//! and local state stays the source of truth for the session.
//!
//! A page created locally carries a temporary id until the store answers.
//! Every creation registers a `watch` channel keyed by the page's stable
//! `PageKey`. A save captured while the id was still temporary waits on that
//! channel and writes to the confirmed id, or is dropped if creation failed.
//! The channel is dropped once creation settles; only the confirmed id stays.
//! Confirmations flow back to the engine as `SyncEvent`s.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::consts::INITIAL_PAGE_COUNT;
use crate::doc::{Book, Page, PageId, PageKey};
use crate::engine::{Action, PageSnapshot, SyncEvent};
use crate::payload::MediaPalette;
use crate::store::{PageStore, StoreError};

/// Creation state of a locally created page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Creation {
    Pending,
    Confirmed(Uuid),
    Failed,
}

/// Where a locally created page stands, as seen by a save.
enum Slot {
    /// Creation in flight; saves wait on the channel.
    Pending(watch::Sender<Creation>),
    /// Store id known. Kept so saves captured before the engine saw the id still land.
    Confirmed(Uuid),
}

/// Creation state keyed by page.
///
/// Channels live only while creation is in flight. A confirmed page keeps one
/// id entry for the session and a failed page is forgotten, so the map is
/// bounded by the number of pages created (pages are never deleted).
#[derive(Default)]
struct PendingPages {
    pages: Mutex<HashMap<PageKey, Slot>>,
}

/// Answer to a lookup: wait for the outcome, or use the one already known.
enum Lookup {
    Waiting(watch::Receiver<Creation>),
    Settled(Uuid),
}

impl PendingPages {
    fn register(&self, key: PageKey) {
        let (tx, _) = watch::channel(Creation::Pending);
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Slot::Pending(tx));
    }

    /// Publish the outcome to waiting saves and drop the channel.
    fn resolve(&self, key: PageKey, outcome: Creation) {
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(Slot::Pending(tx)) = pages.remove(&key) {
            tx.send_replace(outcome);
        }
        if let Creation::Confirmed(id) = outcome {
            pages.insert(key, Slot::Confirmed(id));
        }
    }

    fn lookup(&self, key: PageKey) -> Option<Lookup> {
        let pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        match pages.get(&key)? {
            Slot::Pending(tx) => Some(Lookup::Waiting(tx.subscribe())),
            Slot::Confirmed(id) => Some(Lookup::Settled(*id)),
        }
    }

    #[cfg(test)]
    fn channels(&self) -> usize {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Sends engine writes to a [`PageStore`] in the background.
#[derive(Clone)]
pub struct PersistenceSync {
    store: Arc<dyn PageStore>,
    scrapbook: Arc<str>,
    pending: Arc<PendingPages>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl PersistenceSync {
    /// Create the service for one scrapbook. The receiver yields events for
    /// [`crate::engine::EngineCore::apply_sync_event`].
    #[must_use]
    pub fn new(store: Arc<dyn PageStore>, scrapbook: &str) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let sync = Self { store, scrapbook: Arc::from(scrapbook), pending: Arc::default(), events };
        (sync, rx)
    }

    /// Start the store work an engine action asks for. Must be called inside a Tokio runtime.
    ///
    /// Returns the spawned task, or `None` when the action needs no store work.
    pub fn dispatch(&self, action: &Action) -> Option<JoinHandle<()>> {
        match action {
            Action::SavePage(page) => Some(self.save_page(page.clone())),
            Action::CreatePage { key } => Some(self.create_page(*key)),
            Action::None | Action::RenderNeeded | Action::ConfirmDelete { .. } => None,
        }
    }

    /// Overwrite a page's item list in the store.
    pub fn save_page(&self, page: PageSnapshot) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let scrapbook = Arc::clone(&self.scrapbook);
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            let Some(id) = resolve_page_id(&pending, &page).await else {
                return;
            };
            match store.save_items(&scrapbook, id, &page.items).await {
                Ok(()) => debug!(page = %id, items = page.items.len(), "page saved"),
                Err(e) => error!(error = %e, page = %id, "page save failed"),
            }
        })
    }

    /// Ask the store for a page id for a locally appended page.
    pub fn create_page(&self, key: PageKey) -> JoinHandle<()> {
        self.pending.register(key);
        let store = Arc::clone(&self.store);
        let scrapbook = Arc::clone(&self.scrapbook);
        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = match store.create_page(&scrapbook).await {
                Ok(id) => {
                    info!(page = %id, local = %key, "page created");
                    pending.resolve(key, Creation::Confirmed(id));
                    SyncEvent::PageConfirmed { key, id }
                }
                Err(e) => {
                    error!(error = %e, local = %key, "page creation failed");
                    pending.resolve(key, Creation::Failed);
                    SyncEvent::PageCreateFailed { key }
                }
            };
            if events.send(event).is_err() {
                debug!(local = %key, "engine gone; sync event dropped");
            }
        })
    }
}

/// The store id a save should write to, waiting for page creation if needed.
async fn resolve_page_id(pending: &PendingPages, page: &PageSnapshot) -> Option<Uuid> {
    if let PageId::Stored(id) = page.id {
        return Some(id);
    }
    let mut rx = match pending.lookup(page.key) {
        Some(Lookup::Settled(id)) => return Some(id),
        Some(Lookup::Waiting(rx)) => rx,
        None => {
            error!(page = %page.id, "save for a page that was never created; dropping");
            return None;
        }
    };
    let outcome = match rx.wait_for(|state| *state != Creation::Pending).await {
        Ok(state) => *state,
        Err(e) => {
            error!(error = %e, page = %page.id, "page creation abandoned; dropping save");
            return None;
        }
    };
    match outcome {
        Creation::Confirmed(id) => Some(id),
        Creation::Failed | Creation::Pending => {
            error!(page = %page.id, "page was never created; dropping save");
            None
        }
    }
}

/// Everything a host needs to open a scrapbook.
#[derive(Debug)]
pub struct LoadedScrapbook {
    pub book: Book,
    pub palette: MediaPalette,
}

/// Load a scrapbook's pages and media palette, creating the initial pages for a new scrapbook.
///
/// A media listing failure only drops the user uploads from the palette.
///
/// # Errors
///
/// Returns a [`StoreError`] if pages cannot be listed or created.
pub async fn load_scrapbook(store: &dyn PageStore, scrapbook: &str) -> Result<LoadedScrapbook, StoreError> {
    let mut docs = store.list_pages(scrapbook).await?;
    if docs.is_empty() {
        info!(scrapbook, pages = INITIAL_PAGE_COUNT, "new scrapbook; creating initial pages");
        for _ in 0..INITIAL_PAGE_COUNT {
            store.create_page(scrapbook).await?;
        }
        docs = store.list_pages(scrapbook).await?;
    }
    let book = Book::new(
        docs.into_iter()
            .map(|doc| Page::stored(doc.id, doc.items))
            .collect(),
    );

    let uploads = match store.list_media(scrapbook).await {
        Ok(media) => media,
        Err(e) => {
            warn!(error = %e, scrapbook, "media palette unavailable; showing built-ins only");
            Vec::new()
        }
    };

    Ok(LoadedScrapbook { book, palette: MediaPalette::merge(uploads) })
}
