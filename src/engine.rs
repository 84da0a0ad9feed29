//! Editing engine: the synchronous core a host drives with pointer and
//! keyboard intents.
//!
//! DESIGN
//! ======
//! `EngineCore` owns the page list, selection, undo stack, flip state, and the
//! single active gesture. Every input returns an [`Action`] telling the host
//! what to do next: re-render, persist a page, create a page in the store, or
//! ask the user to confirm a deletion. The engine never awaits; writes are
//! handed to `services::persistence`, whose results come back as
//! [`SyncEvent`]s through [`EngineCore::apply_sync_event`].
//!
//! Gesture frames (`update_control`) only touch the in-memory model. A page is
//! persisted once per completed gesture and once per discrete field edit.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::consts::{FONT_SIZE_MAX, FONT_SIZE_MIN};
use crate::doc::{Book, DocError, FontFamily, Item, ItemField, ItemId, Page, PageId, PageKey};
use crate::flip::{FlipBook, FlipDirection, corner_direction};
use crate::geom::{
    Corner, CropRect, Point, compute_crop_edge_resize, compute_crop_pan, compute_crop_scale, compute_resize,
    compute_rotation,
};
use crate::history::{Selection, UndoStack};
use crate::input::{ActiveGesture, ControlKind, GeometrySnapshot, NoopCapture, PointerCapture};
use crate::payload::DropPayload;

/// Items of one page, captured for a write.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    /// Local handle, used to resolve a temporary id at write time.
    pub key: PageKey,
    /// Id as known when the snapshot was taken.
    pub id: PageId,
    pub items: Vec<Item>,
}

impl PageSnapshot {
    fn of(page: &Page) -> Self {
        Self { key: page.key, id: page.id.clone(), items: page.items.clone() }
    }
}

/// Actions returned from engine inputs for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    RenderNeeded,
    /// Persist the full item list of a page.
    SavePage(PageSnapshot),
    /// A page was appended locally and needs a store id.
    CreatePage { key: PageKey },
    /// Ask the user before deleting; answer with `confirm_delete` or `cancel_delete`.
    ConfirmDelete { id: ItemId },
}

/// Outcome of background store work, fed back into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    PageConfirmed { key: PageKey, id: Uuid },
    PageCreateFailed { key: PageKey },
}

/// Why an edit was refused. Never fatal; the engine state is unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("another gesture is already in progress")]
    GestureInProgress,
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("item {0} is in crop mode")]
    CropModeActive(ItemId),
    #[error("item {0} is not in crop mode")]
    NotCropping(ItemId),
    #[error("item {0} is not an image")]
    NotAnImage(ItemId),
    #[error("nothing is selected")]
    NothingSelected,
    #[error("no delete pending for item {0}")]
    NoPendingDelete(ItemId),
    #[error("invalid font size: {0}")]
    InvalidFontSize(f64),
    #[error("pointer position is not finite")]
    NonFinitePointer,
    #[error(transparent)]
    Doc(#[from] DocError),
}

fn log_rejection(err: &EditError) {
    debug!(error = %err, "edit rejected");
}

/// Core engine state. Independent of any UI toolkit.
pub struct EngineCore {
    book: Book,
    selection: Selection,
    undo: UndoStack,
    flip: FlipBook,
    gesture: Option<ActiveGesture>,
    pending_delete: Option<ItemId>,
    capture: Rc<dyn PointerCapture>,
    config: EditorConfig,
}

impl EngineCore {
    #[must_use]
    pub fn new(book: Book, config: EditorConfig) -> Self {
        Self {
            book,
            selection: Selection::default(),
            undo: UndoStack::new(config.undo_limit),
            flip: FlipBook::new(config.flip_duration),
            gesture: None,
            pending_delete: None,
            capture: Rc::new(NoopCapture),
            config,
        }
    }

    /// Route gesture pointer capture through the host.
    #[must_use]
    pub fn with_capture(mut self, capture: Rc<dyn PointerCapture>) -> Self {
        self.capture = capture;
        self
    }

    // =========================================================================
    // GESTURES
    // =========================================================================

    /// Start a gesture on `id` from a handle of the given kind.
    ///
    /// Selects the item. Rejected while another gesture runs, for crop kinds
    /// outside crop mode, and for standard kinds on an item in crop mode.
    ///
    /// # Errors
    ///
    /// Returns the reason the gesture was refused; nothing changes in that case.
    pub fn begin_control(&mut self, id: &ItemId, kind: ControlKind, pointer: Point) -> Result<Action, EditError> {
        self.try_begin_control(id, kind, pointer)
            .inspect_err(log_rejection)
    }

    fn try_begin_control(&mut self, id: &ItemId, kind: ControlKind, pointer: Point) -> Result<Action, EditError> {
        if self.gesture.is_some() {
            return Err(EditError::GestureInProgress);
        }
        if !pointer.is_finite() {
            return Err(EditError::NonFinitePointer);
        }
        let (page, item) = self
            .book
            .locate(id)
            .ok_or_else(|| EditError::ItemNotFound(id.clone()))?;
        let cropping = self.selection.is_cropping(id);
        if cropping && !kind.is_crop() {
            return Err(EditError::CropModeActive(id.clone()));
        }
        if !cropping && kind.is_crop() {
            return Err(EditError::NotCropping(id.clone()));
        }

        let page = page.key;
        let initial = GeometrySnapshot::new(item.geometry());
        self.selection.select(Some(id.clone()));
        self.gesture = Some(ActiveGesture::begin(id.clone(), page, kind, pointer, initial, Rc::clone(&self.capture)));
        Ok(Action::RenderNeeded)
    }

    /// Apply one pointer-move frame to the active gesture.
    ///
    /// Writes the new geometry into the model immediately (a move only updates
    /// its transient offset). Nothing is persisted. Frames with a non-finite
    /// pointer are dropped.
    pub fn update_control(&mut self, pointer: Point) -> Action {
        let Some(gesture) = self.gesture.as_mut() else {
            return Action::None;
        };
        if !pointer.is_finite() {
            debug!(x = pointer.x, y = pointer.y, "non-finite gesture frame dropped");
            return Action::None;
        }
        match apply_frame(&mut self.book, gesture, pointer, self.config.crop_pan_sensitivity) {
            Ok(()) => Action::RenderNeeded,
            Err(e) => {
                debug!(error = %e, "gesture frame dropped");
                Action::None
            }
        }
    }

    /// Finish the active gesture and persist the owning page once.
    pub fn end_control(&mut self) -> Action {
        let Some(gesture) = self.gesture.take() else {
            return Action::None;
        };
        if gesture.kind == ControlKind::Move {
            self.undo.push(self.book.snapshot());
            if let Err(e) = self
                .book
                .set_position(gesture.page, &gesture.item, gesture.moved_position())
            {
                debug!(error = %e, "move commit dropped");
                return Action::RenderNeeded;
            }
        }
        self.save_action(gesture.page)
    }

    /// Abort the active gesture, restoring the geometry captured at its start. No write is issued.
    pub fn cancel_control(&mut self) -> Action {
        let Some(gesture) = self.gesture.take() else {
            return Action::None;
        };
        if gesture.kind != ControlKind::Move {
            let initial = gesture.initial.geometry;
            let restored = self
                .book
                .set_geometry(gesture.page, &gesture.item, initial.rect, initial.rotation)
                .and_then(|()| {
                    if gesture.kind.is_crop() || initial.crop.is_some() {
                        self.book.set_crop(gesture.page, &gesture.item, initial.crop)
                    } else {
                        Ok(())
                    }
                });
            if let Err(e) = restored {
                debug!(error = %e, "gesture restore failed");
            }
        }
        Action::RenderNeeded
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select an item, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// Rejected while a gesture runs on a different item, or when the item does not exist.
    pub fn select(&mut self, id: Option<ItemId>) -> Result<Action, EditError> {
        self.try_select(id).inspect_err(log_rejection)
    }

    fn try_select(&mut self, id: Option<ItemId>) -> Result<Action, EditError> {
        if let Some(gesture) = &self.gesture {
            if id.as_ref() != Some(&gesture.item) {
                return Err(EditError::GestureInProgress);
            }
        }
        if let Some(id) = &id {
            if self.book.locate(id).is_none() {
                return Err(EditError::ItemNotFound(id.clone()));
            }
        }
        self.selection.select(id);
        Ok(Action::RenderNeeded)
    }

    /// Enter or leave crop mode on the selected image.
    ///
    /// # Errors
    ///
    /// Rejected during a gesture, with nothing selected, or when the selection is not an image.
    pub fn toggle_crop_mode(&mut self) -> Result<Action, EditError> {
        self.try_toggle_crop_mode()
            .inspect_err(log_rejection)
    }

    fn try_toggle_crop_mode(&mut self) -> Result<Action, EditError> {
        if self.gesture.is_some() {
            return Err(EditError::GestureInProgress);
        }
        let id = self
            .selection
            .selected()
            .ok_or(EditError::NothingSelected)?;
        let (_, item) = self
            .book
            .locate(id)
            .ok_or_else(|| EditError::ItemNotFound(id.clone()))?;
        if !item.is_image() {
            return Err(EditError::NotAnImage(id.clone()));
        }
        self.selection.toggle_crop();
        Ok(Action::RenderNeeded)
    }

    // =========================================================================
    // ITEM LIFECYCLE
    // =========================================================================

    /// Create an item from a serialized drop payload at `at` on `page`.
    ///
    /// Malformed or unsupported payloads are ignored.
    pub fn drop_payload(&mut self, page: PageKey, raw: &str, at: Point) -> Action {
        let default_size = self.config.default_item_size;
        match DropPayload::parse(raw).and_then(|p| p.into_item(at, default_size)) {
            Ok(item) => self.place_item(page, item),
            Err(e) => {
                debug!(error = %e, page = %page, "drop ignored");
                Action::None
            }
        }
    }

    /// Add a text item with default content at `at` on `page`.
    pub fn add_text(&mut self, page: PageKey, at: Point) -> Action {
        match DropPayload::text().into_item(at, self.config.default_item_size) {
            Ok(item) => self.place_item(page, item),
            Err(e) => {
                debug!(error = %e, "text item not created");
                Action::None
            }
        }
    }

    fn place_item(&mut self, page: PageKey, item: Item) -> Action {
        if self.book.page(page).is_none() {
            debug!(page = %page, "drop target page not found");
            return Action::None;
        }
        self.undo.push(self.book.snapshot());
        if let Err(e) = self.book.insert_item(page, item) {
            debug!(error = %e, "item not inserted");
            return Action::None;
        }
        self.save_action(page)
    }

    /// Ask for confirmation before deleting `id`.
    ///
    /// # Errors
    ///
    /// Rejected while the item is under a gesture or when it does not exist.
    pub fn request_delete(&mut self, id: &ItemId) -> Result<Action, EditError> {
        self.try_request_delete(id)
            .inspect_err(log_rejection)
    }

    fn try_request_delete(&mut self, id: &ItemId) -> Result<Action, EditError> {
        if self.gesture.as_ref().is_some_and(|g| &g.item == id) {
            return Err(EditError::GestureInProgress);
        }
        if self.book.locate(id).is_none() {
            return Err(EditError::ItemNotFound(id.clone()));
        }
        self.pending_delete = Some(id.clone());
        Ok(Action::ConfirmDelete { id: id.clone() })
    }

    /// Delete `id` after the user confirmed, persisting its page.
    ///
    /// # Errors
    ///
    /// Rejected unless `id` is the pending deletion.
    pub fn confirm_delete(&mut self, id: &ItemId) -> Result<Action, EditError> {
        self.try_confirm_delete(id)
            .inspect_err(log_rejection)
    }

    fn try_confirm_delete(&mut self, id: &ItemId) -> Result<Action, EditError> {
        if self.pending_delete.as_ref() != Some(id) {
            return Err(EditError::NoPendingDelete(id.clone()));
        }
        self.pending_delete = None;
        let page = self
            .book
            .locate(id)
            .map(|(page, _)| page.key)
            .ok_or_else(|| EditError::ItemNotFound(id.clone()))?;
        self.undo.push(self.book.snapshot());
        self.book.remove_item(page, id)?;
        self.selection.forget(id);
        Ok(self.save_action(page))
    }

    /// Dismiss the pending deletion.
    pub fn cancel_delete(&mut self) -> Action {
        self.pending_delete = None;
        Action::None
    }

    // =========================================================================
    // TEXT FIELDS
    // =========================================================================

    /// Replace a text item's content.
    ///
    /// # Errors
    ///
    /// Rejected when the item is missing or not a text item.
    pub fn set_text_content(&mut self, id: &ItemId, content: String) -> Result<Action, EditError> {
        self.edit_field(id, ItemField::Content(content))
    }

    /// Set a text item's font size, clamped to the editor's range.
    ///
    /// # Errors
    ///
    /// Rejected for non-finite sizes, missing items, and non-text items.
    pub fn set_font_size(&mut self, id: &ItemId, size: f64) -> Result<Action, EditError> {
        if !size.is_finite() {
            let err = EditError::InvalidFontSize(size);
            log_rejection(&err);
            return Err(err);
        }
        self.edit_field(id, ItemField::FontSize(size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)))
    }

    /// Set a text item's font family.
    ///
    /// # Errors
    ///
    /// Rejected when the item is missing or not a text item.
    pub fn set_font_family(&mut self, id: &ItemId, family: FontFamily) -> Result<Action, EditError> {
        self.edit_field(id, ItemField::FontFamily(family))
    }

    fn edit_field(&mut self, id: &ItemId, field: ItemField) -> Result<Action, EditError> {
        let result = self
            .book
            .locate(id)
            .map(|(page, _)| page.key)
            .ok_or_else(|| EditError::ItemNotFound(id.clone()))
            .and_then(|page| {
                self.book.update_field(page, id, field)?;
                Ok(self.save_action(page))
            });
        result.inspect_err(log_rejection)
    }

    // =========================================================================
    // PAGES
    // =========================================================================

    /// Turn to the next spread, appending a page when there is none.
    pub fn flip_forward(&mut self, now: Instant) -> Action {
        match self.flip.begin_forward(self.book.len(), now) {
            Some(plan) if plan.append_page => self.append_page(),
            Some(_) => Action::RenderNeeded,
            None => Action::None,
        }
    }

    /// Turn to the previous spread. A no-op on the first spread.
    pub fn flip_backward(&mut self, now: Instant) -> Action {
        match self.flip.begin_backward(now) {
            Some(_) => Action::RenderNeeded,
            None => Action::None,
        }
    }

    /// Handle a click on a corner of a visible page.
    pub fn click_corner(&mut self, page: PageKey, corner: Corner, now: Instant) -> Action {
        let direction = self
            .book
            .index_of(page)
            .and_then(|index| self.flip.side_of(index))
            .and_then(|side| corner_direction(side, corner));
        match direction {
            Some(FlipDirection::Forward) => self.flip_forward(now),
            Some(FlipDirection::Backward) => self.flip_backward(now),
            None => Action::None,
        }
    }

    /// Advance the running page turn; completes it once the flip duration has elapsed.
    pub fn tick(&mut self, now: Instant) -> Action {
        if self.flip.tick(self.book.len(), now) {
            Action::RenderNeeded
        } else {
            Action::None
        }
    }

    /// Jump to the spread containing page `index`. Ignored during a turn.
    pub fn go_to_page(&mut self, index: usize) -> Action {
        if self.flip.is_turning() {
            return Action::None;
        }
        self.flip.go_to_page(index, self.book.len());
        Action::RenderNeeded
    }

    /// Append an empty page without turning to it.
    pub fn add_page(&mut self) -> Action {
        self.append_page()
    }

    fn append_page(&mut self) -> Action {
        let key = self.book.append_page(Page::temporary());
        Action::CreatePage { key }
    }

    /// Pages of the visible spread. Other pages are not rendered.
    #[must_use]
    pub fn visible_pages(&self) -> &[Page] {
        let range = self.flip.visible(self.book.len());
        &self.book.pages()[range]
    }

    // =========================================================================
    // SYNC
    // =========================================================================

    /// Apply the result of background store work.
    pub fn apply_sync_event(&mut self, event: SyncEvent) -> Action {
        match event {
            SyncEvent::PageConfirmed { key, id } => match self.book.confirm_page_id(key, id) {
                Ok(()) => Action::RenderNeeded,
                Err(e) => {
                    debug!(error = %e, "confirmed page no longer present");
                    Action::None
                }
            },
            SyncEvent::PageCreateFailed { key } => {
                warn!(page = %key, "page creation failed; page stays local");
                Action::None
            }
        }
    }

    fn save_action(&self, page: PageKey) -> Action {
        match self.book.page(page) {
            Some(page) => Action::SavePage(PageSnapshot::of(page)),
            None => Action::None,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn book(&self) -> &Book {
        &self.book
    }

    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.book.locate(id).map(|(_, item)| item)
    }

    /// Where an item is drawn, including an uncommitted move offset.
    #[must_use]
    pub fn display_position(&self, id: &ItemId) -> Option<Point> {
        if let Some(gesture) = &self.gesture {
            if gesture.kind == ControlKind::Move && &gesture.item == id {
                return Some(gesture.moved_position());
            }
        }
        self.item(id).map(|item| Point::new(item.x, item.y))
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn active_gesture(&self) -> Option<&ActiveGesture> {
        self.gesture.as_ref()
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<&ItemId> {
        self.pending_delete.as_ref()
    }

    #[must_use]
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// Index of the left page of the visible spread.
    #[must_use]
    pub fn current_page_index(&self) -> usize {
        self.flip.current_index()
    }

    #[must_use]
    pub fn is_turning(&self) -> bool {
        self.flip.is_turning()
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

/// Compute one gesture frame from the snapshot and write it to the book.
fn apply_frame(book: &mut Book, gesture: &mut ActiveGesture, pointer: Point, sensitivity: f64) -> Result<(), DocError> {
    let delta = pointer.delta_from(gesture.start);
    let initial = gesture.initial.geometry;
    let (page, id) = (gesture.page, &gesture.item);
    match gesture.kind {
        ControlKind::Move => {
            gesture.offset = delta;
            Ok(())
        }
        ControlKind::Rotate => {
            let rotation = compute_rotation(initial.rect.center(), gesture.start, pointer, initial.rotation);
            book.set_geometry(page, id, initial.rect, rotation)
        }
        ControlKind::Resize(corner) => {
            let rect = compute_resize(corner.anchor(), initial.rect, delta);
            book.set_geometry(page, id, rect, initial.rotation)?;
            match initial.crop {
                Some(crop) => book.set_crop(page, id, Some(compute_crop_scale(initial.rect, rect, crop))),
                None => Ok(()),
            }
        }
        ControlKind::CropResize(edge) => {
            let (rect, crop) = compute_crop_edge_resize(edge, initial.rect, gesture.initial.crop_base(), delta);
            book.set_geometry(page, id, rect, initial.rotation)?;
            book.set_crop(page, id, Some(crop))
        }
        ControlKind::CropPan => {
            let base = gesture.initial.crop_base();
            let offset = compute_crop_pan(Point::new(base.img_x, base.img_y), delta, sensitivity);
            book.set_crop(page, id, Some(CropRect { img_x: offset.x, img_y: offset.y, ..base }))
        }
    }
}
