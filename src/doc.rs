//! Document model: scrapbook items, pages, and the in-memory page list.
//!
//! This module defines what lives on a page (`Item` and its `ItemContent`
//! variants), how pages are identified across the local/remote boundary
//! (`PageKey` vs `PageId`), and the runtime store that owns all pages
//! (`Book`). Data flows into this layer from the persistence layer (JSON page
//! documents) and from the engine (gesture and field mutations). Every
//! mutation is synchronous; persisting the result is the caller's concern.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::MIN_SIZE;
use crate::geom::{CropRect, Point, Rect};

// =============================================================================
// IDENTIFIERS
// =============================================================================

static LAST_ID_MS: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> u64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}

/// Process-unique item identifier: monotonic milliseconds plus a random tiebreak.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a fresh id. Timestamps never run backwards within the process.
    #[must_use]
    pub fn generate() -> Self {
        let now = now_ms();
        let ms = LAST_ID_MS.fetch_max(now, Ordering::Relaxed).max(now);
        let tiebreak: u64 = rand::random();
        Self(format!("{ms:x}-{tiebreak:016x}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable local handle for a page. Never rewritten for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageKey(Uuid);

impl PageKey {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page identifier as known to the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageId {
    /// Locally assigned while the store has not yet confirmed the page.
    Temporary(String),
    /// Assigned by the store.
    Stored(Uuid),
}

impl PageId {
    /// A fresh `temp-...` id for a page created locally.
    #[must_use]
    pub fn temporary() -> Self {
        let tiebreak: u16 = rand::random();
        Self::Temporary(format!("temp-{}-{tiebreak:04x}", now_ms()))
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The store id, if confirmed.
    #[must_use]
    pub fn stored(&self) -> Option<Uuid> {
        match self {
            Self::Stored(id) => Some(*id),
            Self::Temporary(_) => None,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(id) => f.write_str(id),
            Self::Stored(id) => write!(f, "{id}"),
        }
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// Font families offered by the text editor.
///
/// Serialized as the CSS family name. Unknown names deserialize to Arial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Arial,
    CourierNew,
    Georgia,
    TimesNewRoman,
    Verdana,
    ComicSansMs,
    Impact,
}

impl Serialize for FontFamily {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FontFamily {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name).unwrap_or_default())
    }
}

impl FontFamily {
    pub const ALL: [FontFamily; 7] = [
        Self::Arial,
        Self::CourierNew,
        Self::Georgia,
        Self::TimesNewRoman,
        Self::Verdana,
        Self::ComicSansMs,
        Self::Impact,
    ];

    /// CSS family name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Arial => "Arial",
            Self::CourierNew => "Courier New",
            Self::Georgia => "Georgia",
            Self::TimesNewRoman => "Times New Roman",
            Self::Verdana => "Verdana",
            Self::ComicSansMs => "Comic Sans MS",
            Self::Impact => "Impact",
        }
    }

    /// Look up a family by CSS name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Variant-specific part of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemContent {
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// When absent the image covers the container.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crop: Option<CropRect>,
    },
    Text {
        content: String,
        #[serde(rename = "fontSize")]
        font_size: f64,
        #[serde(rename = "fontFamily", default)]
        font_family: FontFamily,
    },
    Audio {
        url: String,
    },
}

/// A freely positioned item on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Left edge in page-local coordinates. Unbounded.
    pub x: f64,
    /// Top edge in page-local coordinates. Unbounded.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise degrees around the center. Accumulates across gestures.
    #[serde(default)]
    pub rotation: f64,
    #[serde(flatten)]
    pub content: ItemContent,
}

impl Item {
    /// Build an item with a fresh id, clamping the size to [`MIN_SIZE`].
    #[must_use]
    pub fn new(at: Point, width: f64, height: f64, content: ItemContent) -> Self {
        Self {
            id: ItemId::generate(),
            x: at.x,
            y: at.y,
            width: clamp_size(width),
            height: clamp_size(height),
            rotation: 0.0,
            content,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self.content, ItemContent::Image { .. })
    }

    /// Crop layer of an image item, if one is set.
    #[must_use]
    pub fn crop(&self) -> Option<CropRect> {
        match &self.content {
            ItemContent::Image { crop, .. } => *crop,
            ItemContent::Text { .. } | ItemContent::Audio { .. } => None,
        }
    }

    /// Snapshot of everything a gesture may change.
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        Geometry { rect: self.rect(), rotation: self.rotation, crop: self.crop() }
    }
}

fn clamp_size(size: f64) -> f64 {
    if size.is_finite() { size.max(MIN_SIZE) } else { MIN_SIZE }
}

/// Composite geometry of an item: box, rotation, and optional crop layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub rect: Rect,
    pub rotation: f64,
    pub crop: Option<CropRect>,
}

/// A single field-level edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    Content(String),
    FontSize(f64),
    FontFamily(FontFamily),
    Crop(Option<CropRect>),
}

// =============================================================================
// PAGES
// =============================================================================

/// A page and the items placed on it, in stacking order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub key: PageKey,
    pub id: PageId,
    pub items: Vec<Item>,
}

impl Page {
    /// A page already known to the store.
    #[must_use]
    pub fn stored(id: Uuid, items: Vec<Item>) -> Self {
        Self { key: PageKey::new(), id: PageId::Stored(id), items }
    }

    /// An empty page created locally, awaiting a store id.
    #[must_use]
    pub fn temporary() -> Self {
        Self { key: PageKey::new(), id: PageId::temporary(), items: Vec::new() }
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.id == id)
    }
}

/// Why a mutation could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocError {
    #[error("page not found: {0}")]
    PageNotFound(PageKey),
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("field does not apply to item {0}")]
    FieldMismatch(ItemId),
}

/// Ordered list of pages making up a scrapbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pages: Vec<Page>,
}

impl Book {
    #[must_use]
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn page(&self, key: PageKey) -> Option<&Page> {
        self.pages.iter().find(|p| p.key == key)
    }

    /// Position of a page in the book.
    #[must_use]
    pub fn index_of(&self, key: PageKey) -> Option<usize> {
        self.pages.iter().position(|p| p.key == key)
    }

    /// The page holding `item` and the item itself.
    #[must_use]
    pub fn locate(&self, item: &ItemId) -> Option<(&Page, &Item)> {
        self.pages
            .iter()
            .find_map(|p| p.item(item).map(|i| (p, i)))
    }

    /// Append a page and return its key.
    pub fn append_page(&mut self, page: Page) -> PageKey {
        let key = page.key;
        self.pages.push(page);
        key
    }

    /// Replace a page's temporary id with the one the store assigned.
    pub fn confirm_page_id(&mut self, key: PageKey, id: Uuid) -> Result<(), DocError> {
        let page = self.page_mut(key)?;
        page.id = PageId::Stored(id);
        Ok(())
    }

    pub fn insert_item(&mut self, key: PageKey, item: Item) -> Result<(), DocError> {
        self.page_mut(key)?.items.push(item);
        Ok(())
    }

    /// Remove an item, returning it.
    pub fn remove_item(&mut self, key: PageKey, id: &ItemId) -> Result<Item, DocError> {
        let page = self.page_mut(key)?;
        let pos = page
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| DocError::ItemNotFound(id.clone()))?;
        Ok(page.items.remove(pos))
    }

    pub fn set_position(&mut self, key: PageKey, id: &ItemId, at: Point) -> Result<(), DocError> {
        let item = self.item_mut(key, id)?;
        item.x = at.x;
        item.y = at.y;
        Ok(())
    }

    /// Apply size, rotation, and position together. Sizes below [`MIN_SIZE`] are raised to it.
    pub fn set_geometry(&mut self, key: PageKey, id: &ItemId, rect: Rect, rotation: f64) -> Result<(), DocError> {
        let item = self.item_mut(key, id)?;
        item.x = rect.x;
        item.y = rect.y;
        item.width = clamp_size(rect.width);
        item.height = clamp_size(rect.height);
        item.rotation = rotation;
        Ok(())
    }

    /// Set or clear the crop layer of an image.
    pub fn set_crop(&mut self, key: PageKey, id: &ItemId, crop: Option<CropRect>) -> Result<(), DocError> {
        self.update_field(key, id, ItemField::Crop(crop))
    }

    /// Apply a field-level edit; fails when the field does not exist on the item's variant.
    pub fn update_field(&mut self, key: PageKey, id: &ItemId, field: ItemField) -> Result<(), DocError> {
        let item = self.item_mut(key, id)?;
        match (&mut item.content, field) {
            (ItemContent::Text { content, .. }, ItemField::Content(value)) => *content = value,
            (ItemContent::Text { font_size, .. }, ItemField::FontSize(value)) => *font_size = value,
            (ItemContent::Text { font_family, .. }, ItemField::FontFamily(value)) => *font_family = value,
            (ItemContent::Image { crop, .. }, ItemField::Crop(value)) => *crop = value,
            _ => return Err(DocError::FieldMismatch(id.clone())),
        }
        Ok(())
    }

    /// Deep copy of every page, for undo snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Page> {
        self.pages.clone()
    }

    fn page_mut(&mut self, key: PageKey) -> Result<&mut Page, DocError> {
        self.pages
            .iter_mut()
            .find(|p| p.key == key)
            .ok_or(DocError::PageNotFound(key))
    }

    fn item_mut(&mut self, key: PageKey, id: &ItemId) -> Result<&mut Item, DocError> {
        self.page_mut(key)?
            .item_mut(id)
            .ok_or_else(|| DocError::ItemNotFound(id.clone()))
    }
}
