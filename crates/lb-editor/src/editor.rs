//! The editor controller.
//!
//! One `Editor` owns one document, its selection, its history, the two
//! staging mailboxes and the renderer. Every public method is a single
//! synchronous transition: it either completes and leaves document,
//! selection and history consistent with each other, or fails and leaves
//! all three untouched.
//!
//! Data flow:
//!
//! - toolbar and property panel stage requests (`add_*`, `post_patch`,
//!   `edit_property`), and the host calls [`Editor::flush`] once per
//!   reaction to deliver them to the renderer;
//! - undo, redo and delete go through [`ControlHandle`];
//! - the renderer reports scene snapshots and user selection, which the
//!   host feeds back with [`Editor::sync_from_renderer`].
//!
//! Every document pushed to the renderer bumps a generation counter.
//! Snapshots tagged with an older generation were taken before the push
//! (e.g. before an undo) and are dropped.

use crate::config::{CanvasSettings, EditorConfig};
use crate::history::History;
use crate::mailbox::Mailbox;
use crate::panel::PropertySheet;
use crate::renderer::{Renderer, RendererEvent};
use crate::selection::Selection;
use lb_core::{
    Color, CreateRequest, CreationValue, Document, DocumentStore, EditError, Item, ItemId,
    ItemPatch, PatchRequest, TransientHandle,
};
use smallvec::SmallVec;
use std::collections::HashMap;

const GESTURE_LABEL: &str = "canvas edit";

/// The three imperative commands a toolbar needs.
pub trait ControlHandle {
    /// Withdraw the last change. Returns false when there was none.
    fn request_undo(&mut self) -> bool;
    /// Re-apply the last withdrawn change. Returns false when there was none.
    fn request_redo(&mut self) -> bool;
    /// Delete the selected item. Returns false when nothing is selected.
    fn request_delete(&mut self) -> bool;
}

/// Outcome of delivering the staged requests.
#[derive(Debug, Default, PartialEq)]
pub struct Flush {
    pub created: Option<ItemId>,
    pub patched: Option<ItemId>,
    pub errors: SmallVec<[EditError; 2]>,
}

impl Flush {
    /// Nothing was staged.
    pub fn is_idle(&self) -> bool {
        self.created.is_none() && self.patched.is_none() && self.errors.is_empty()
    }
}

/// Outcome of draining the renderer's reports.
#[derive(Debug, Default, PartialEq)]
pub struct SyncReport {
    /// Reports that changed the document or the selection.
    pub applied: usize,
    pub errors: SmallVec<[EditError; 2]>,
}

pub struct Editor<R: Renderer> {
    store: DocumentStore,
    selection: Selection,
    history: History,
    creations: Mailbox<CreateRequest>,
    patches: Mailbox<PatchRequest>,
    canvas: CanvasSettings,
    config: EditorConfig,
    renderer: R,
    /// Last generation pushed with `apply_document`.
    generation: u64,
    /// Transient handles of items whose asset the renderer has not
    /// captured yet.
    held_assets: HashMap<ItemId, TransientHandle>,
}

impl<R: Renderer> Editor<R> {
    pub fn new(renderer: R, config: EditorConfig) -> Self {
        let mut editor = Self {
            store: DocumentStore::new(),
            selection: Selection::default(),
            history: History::new(config.history),
            creations: Mailbox::new("creation"),
            patches: Mailbox::new("patch"),
            canvas: config.canvas,
            config,
            renderer,
            generation: 0,
            held_assets: HashMap::new(),
        };
        editor.renderer.apply_canvas(&editor.canvas);
        editor
    }

    /// Back to an empty document with no history. Ids keep counting, so
    /// nothing created before the reset is ever re-identified.
    pub fn reset(&mut self) {
        self.creations.discard();
        self.patches.discard();
        self.history.clear();
        self.selection.clear();
        self.store.clear();
        self.held_assets.clear();
        self.canvas = self.config.canvas;
        self.push_document();
        self.renderer.apply_selection_override(None);
        self.renderer.apply_canvas(&self.canvas);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn selected_id(&self) -> Option<ItemId> {
        self.selection.get()
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.selection.resolve(self.store.document())
    }

    /// What the property panel shows, or `None` with nothing selected.
    pub fn property_sheet(&self) -> Option<PropertySheet> {
        self.selected_item().map(PropertySheet::for_item)
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn can_delete(&self) -> bool {
        self.selected_item().is_some()
    }

    pub fn can_move_up(&self) -> bool {
        self.selected_index()
            .is_some_and(|i| i + 1 < self.store.document().len())
    }

    pub fn can_move_down(&self) -> bool {
        self.selected_index().is_some_and(|i| i > 0)
    }

    pub fn has_pending_creation(&self) -> bool {
        self.creations.is_pending()
    }

    pub fn has_pending_patch(&self) -> bool {
        self.patches.is_pending()
    }

    /// Whether the transient handle behind `id` is still held, waiting for
    /// the renderer to capture the asset.
    pub fn holds_asset(&self, id: ItemId) -> bool {
        self.held_assets.contains_key(&id)
    }

    fn selected_index(&self) -> Option<usize> {
        self.selection
            .get()
            .and_then(|id| self.store.document().index_of(id))
    }

    // ─── Toolbar ─────────────────────────────────────────────────────────

    /// Stage a text item with the configured placeholder content.
    pub fn add_text(&mut self) -> Option<CreateRequest> {
        let request = CreateRequest::text(self.config.text_placeholder.clone());
        self.post_creation(request)
    }

    /// Stage the configured default shape.
    pub fn add_shape(&mut self) -> Option<CreateRequest> {
        let request = CreateRequest::shape(self.config.default_shape.clone());
        self.post_creation(request)
    }

    /// Stage an image from a transient handle.
    pub fn add_image(&mut self, handle: TransientHandle) -> Option<CreateRequest> {
        self.post_creation(CreateRequest::image(handle))
    }

    /// Stage a creation request. Returns a request it overwrote; dropping
    /// that request releases its transient handle.
    pub fn post_creation(&mut self, request: CreateRequest) -> Option<CreateRequest> {
        self.creations.post(request)
    }

    // ─── Property panel ──────────────────────────────────────────────────

    /// Stage `patch` for the selected item. With nothing selected this is a
    /// no-op and returns false.
    pub fn post_patch(&mut self, patch: ItemPatch) -> bool {
        let Some(id) = self.selection.get() else {
            log::debug!("patch ignored: nothing selected");
            return false;
        };
        self.patches.post(PatchRequest::new(id, patch));
        true
    }

    /// Parse one panel edit and stage it for the selected item.
    pub fn edit_property(&mut self, key: &str, raw: &str) -> Result<bool, EditError> {
        let patch = ItemPatch::from_panel_field(key, raw)?;
        Ok(self.post_patch(patch))
    }

    /// Deliver the staged creation and patch, each exactly once. Both slots
    /// are empty when this returns, whether delivery succeeded or not.
    pub fn flush(&mut self) -> Flush {
        let creation = self.creations.take();
        let patch = self.patches.take();
        let mut flush = Flush::default();

        if let Some(request) = creation {
            match self.create(request) {
                Ok(item) => flush.created = Some(item.id),
                Err(e) => flush.errors.push(e),
            }
        }
        if let Some(PatchRequest { id, patch }) = patch {
            match self.update(id, &patch) {
                Ok(_) => flush.patched = Some(id),
                Err(e) => flush.errors.push(e),
            }
        }
        flush
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Create an item on top of the document.
    ///
    /// The renderer instantiates it first; if it captured a durable
    /// reference the item stores that instead of the transient one and the
    /// transient handle is released before this returns. Otherwise the
    /// handle is held until [`Editor::capture_asset`], or until neither the
    /// document nor the undo/redo history contains the item any more. On
    /// failure the handle is released.
    pub fn create(&mut self, request: CreateRequest) -> Result<Item, EditError> {
        let mut item = self
            .store
            .prepare(&request)
            .inspect_err(|e| log::warn!("creation rejected: {e}"))?;

        log::trace!("renderer: create {} {}", item.kind, item.id);
        let capture = self
            .renderer
            .apply_creation(&item)
            .inspect_err(|e| log::warn!("renderer failed to create {}: {e}", item.id))?;
        let transient = match request.value {
            CreationValue::Transient(handle) => Some(handle),
            CreationValue::Literal(_) => None,
        };
        let held = match capture.durable_value {
            Some(durable) => {
                item.value = durable;
                drop(transient);
                None
            }
            None => transient,
        };

        let before = self.store.document().clone();
        self.store.insert(item.clone())?;
        self.record(before, &format!("add {}", item.kind));
        if let Some(handle) = held {
            log::debug!("holding {} until {} is captured", handle.reference(), item.id);
            self.held_assets.insert(item.id, handle);
        }
        log::debug!("created {} {}", item.kind, item.id);
        Ok(item)
    }

    /// Merge `patch` into item `id`. Fields the item's kind does not carry
    /// are dropped. Returns false when nothing would change (no history
    /// step is recorded then).
    pub fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<bool, EditError> {
        patch
            .validate()
            .inspect_err(|e| log::warn!("patch for {id} rejected: {e}"))?;
        let item = self
            .store
            .document()
            .get(id)
            .ok_or(EditError::NotFound(id))
            .inspect_err(|e| log::warn!("{e}"))?;

        let patch = patch.clone().restricted_to(item.kind);
        let mut preview = item.clone();
        if !patch.apply_to(&mut preview) {
            log::debug!("patch for {id} changes nothing");
            return Ok(false);
        }

        log::trace!("renderer: patch {id} {:?}", patch.changed_fields());
        self.renderer
            .apply_patch(id, &patch)
            .inspect_err(|e| log::warn!("renderer failed to patch {id}: {e}"))?;

        let before = self.store.document().clone();
        self.store.update_item(id, &patch)?;
        self.record(before, "edit properties");
        Ok(true)
    }

    /// Remove item `id`. Clears the selection in the same step if it
    /// pointed at the removed item.
    pub fn delete(&mut self, id: ItemId) -> Result<Item, EditError> {
        let before = self.store.document().clone();
        let removed = self
            .store
            .delete_item(id)
            .inspect_err(|e| log::warn!("{e}"))?;
        self.record(before, &format!("delete {}", removed.kind));
        self.publish_document();
        Ok(removed)
    }

    /// Delete the selected item. `Ok(None)` with nothing selected.
    pub fn delete_selected(&mut self) -> Result<Option<Item>, EditError> {
        match self.selection.get() {
            Some(id) => self.delete(id).map(Some),
            None => Ok(None),
        }
    }

    /// Raise item `id` one layer. `Ok(false)` when it is already on top.
    pub fn move_up(&mut self, id: ItemId) -> Result<bool, EditError> {
        self.reorder(id, true)
    }

    /// Lower item `id` one layer. `Ok(false)` when it is already at the
    /// bottom.
    pub fn move_down(&mut self, id: ItemId) -> Result<bool, EditError> {
        self.reorder(id, false)
    }

    pub fn move_selected_up(&mut self) -> Result<bool, EditError> {
        match self.selection.get() {
            Some(id) => self.move_up(id),
            None => Ok(false),
        }
    }

    pub fn move_selected_down(&mut self) -> Result<bool, EditError> {
        match self.selection.get() {
            Some(id) => self.move_down(id),
            None => Ok(false),
        }
    }

    fn reorder(&mut self, id: ItemId, up: bool) -> Result<bool, EditError> {
        let before = self.store.document().clone();
        let result = if up {
            self.store.move_up(id)
        } else {
            self.store.move_down(id)
        };
        let moved = result.inspect_err(|e| log::warn!("{e}"))?;

        if !moved {
            log::debug!("{id} already at the {} layer", if up { "top" } else { "bottom" });
            return Ok(false);
        }
        let label = if up { "move layer up" } else { "move layer down" };
        self.record(before, label);
        self.push_document();
        Ok(true)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select `id` (or nothing) from the editor side and tell the renderer.
    /// An id that is not in the document is rejected.
    pub fn select(&mut self, id: Option<ItemId>) -> Result<bool, EditError> {
        let changed = self.selection.select(id, self.store.document())?;
        if changed {
            log::trace!("renderer: select {id:?}");
            self.renderer.apply_selection_override(id);
        }
        Ok(changed)
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Withdraw the last change. Returns its label, or `None` when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        self.close_open_gesture();
        let Some(label) = self.history.undo(&mut self.store) else {
            log::debug!("nothing to undo");
            return None;
        };
        log::debug!("undo: {label}");
        self.publish_document();
        Some(label)
    }

    /// Re-apply the last withdrawn change. Returns its label, or `None`
    /// when there is nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        self.close_open_gesture();
        let Some(label) = self.history.redo(&mut self.store) else {
            log::debug!("nothing to redo");
            return None;
        };
        log::debug!("redo: {label}");
        self.publish_document();
        Some(label)
    }

    /// Group everything the renderer reports until [`Editor::end_gesture`]
    /// into a single undo step.
    pub fn begin_gesture(&mut self) {
        self.history.begin_batch(self.store.document());
    }

    pub fn end_gesture(&mut self) {
        self.history.end_batch(self.store.document(), GESTURE_LABEL);
        self.release_orphaned_assets();
    }

    fn close_open_gesture(&mut self) {
        while self.history.in_batch() {
            self.end_gesture();
        }
    }

    /// Reconcile the selection with the current document and push both to
    /// the renderer.
    fn publish_document(&mut self) {
        let cleared = self.selection.reconcile(self.store.document());
        self.push_document();
        if cleared {
            self.renderer.apply_selection_override(None);
        }
    }

    fn push_document(&mut self) {
        self.generation += 1;
        log::trace!(
            "renderer: document ({} items, generation {})",
            self.store.document().len(),
            self.generation
        );
        self.renderer
            .apply_document(self.store.document(), self.generation);
    }

    fn record(&mut self, before: Document, label: &str) {
        self.history.record(before, label);
        self.release_orphaned_assets();
    }

    /// Release held handles no document, current or reachable through
    /// undo/redo, refers to any more.
    fn release_orphaned_assets(&mut self) {
        if self.held_assets.is_empty() {
            return;
        }
        let document = self.store.document();
        let history = &self.history;
        self.held_assets.retain(|id, handle| {
            let reachable = document.contains(*id) || history.references(*id);
            if !reachable {
                log::debug!("releasing {} of {id}: unreachable", handle.reference());
            }
            reachable
        });
    }

    // ─── Renderer reports ────────────────────────────────────────────────

    /// Adopt a scene snapshot from the renderer. A snapshot equal to the
    /// current document is ignored; a changed one becomes an undo step.
    /// Returns whether the document changed.
    pub fn adopt_snapshot(&mut self, items: Vec<Item>) -> Result<bool, EditError> {
        if items.as_slice() == self.store.document().items() {
            log::trace!("snapshot unchanged, ignored");
            return Ok(false);
        }
        let document = Document::from_items(items)
            .inspect_err(|e| log::warn!("snapshot rejected: {e}"))?;

        let before = self.store.replace(document);
        self.record(before, GESTURE_LABEL);
        self.selection.reconcile(self.store.document());
        Ok(true)
    }

    /// The renderer captured the asset of item `id` under `value`. The item
    /// is rewritten in the document and in every history snapshot (this is
    /// not an undo step) and its transient handle is released. Returns
    /// whether the current document changed.
    pub fn capture_asset(&mut self, id: ItemId, value: String) -> Result<bool, EditError> {
        if value.trim().is_empty() {
            return Err(EditError::invalid(format!("empty captured value for {id}")));
        }
        let Some(handle) = self.held_assets.remove(&id) else {
            log::debug!("no transient asset held for {id}");
            return Ok(false);
        };
        let changed = self.store.rebind_value(id, handle.reference(), &value);
        self.history.rebind_value(id, handle.reference(), &value);
        log::debug!("{id} captured as {value}");
        drop(handle);
        Ok(changed)
    }

    /// The user picked an item (or empty canvas) inside the renderer.
    pub fn adopt_selection(&mut self, id: Option<ItemId>) -> Result<bool, EditError> {
        self.selection
            .select(id, self.store.document())
            .inspect_err(|e| log::warn!("renderer selected unknown item: {e}"))
    }

    /// Apply one report. Returns whether it changed document or selection.
    pub fn handle_renderer_event(&mut self, event: RendererEvent) -> Result<bool, EditError> {
        match event {
            RendererEvent::Snapshot { items, generation } => {
                if let Some(taken_at) = generation
                    && taken_at < self.generation
                {
                    log::debug!(
                        "stale snapshot dropped (generation {taken_at} < {})",
                        self.generation
                    );
                    return Ok(false);
                }
                self.adopt_snapshot(items)
            }
            RendererEvent::AssetCaptured { id, value } => self.capture_asset(id, value),
            RendererEvent::SelectionChanged(id) => self.adopt_selection(id),
            RendererEvent::GestureStarted => {
                self.begin_gesture();
                Ok(false)
            }
            RendererEvent::GestureEnded => {
                self.end_gesture();
                Ok(false)
            }
        }
    }

    /// Drain and apply every pending renderer report. A rejected report
    /// does not stop the ones after it.
    pub fn sync_from_renderer(&mut self) -> SyncReport {
        let mut report = SyncReport::default();
        for event in self.renderer.poll_events() {
            match self.handle_renderer_event(event) {
                Ok(true) => report.applied += 1,
                Ok(false) => {}
                Err(e) => report.errors.push(e),
            }
        }
        report
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> Result<(), EditError> {
        let canvas = CanvasSettings {
            width,
            height,
            ..self.canvas
        };
        canvas.validate()?;
        self.canvas = canvas;
        self.renderer.apply_canvas(&self.canvas);
        Ok(())
    }

    pub fn set_background(&mut self, color: Color) {
        self.canvas.background = color;
        self.renderer.apply_canvas(&self.canvas);
    }
}

impl<R: Renderer> ControlHandle for Editor<R> {
    fn request_undo(&mut self) -> bool {
        self.undo().is_some()
    }

    fn request_redo(&mut self) -> bool {
        self.redo().is_some()
    }

    fn request_delete(&mut self) -> bool {
        match self.delete_selected() {
            Ok(removed) => removed.is_some(),
            Err(e) => {
                log::warn!("delete failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{HeadlessRenderer, RenderCall};

    fn editor() -> Editor<HeadlessRenderer> {
        Editor::new(HeadlessRenderer::new(), EditorConfig::default())
    }

    #[test]
    fn toolbar_add_goes_through_mailbox() {
        let mut ed = editor();
        assert!(ed.add_text().is_none());
        assert!(ed.has_pending_creation());
        assert!(ed.document().is_empty(), "nothing applied before flush");

        let flush = ed.flush();
        assert_eq!(flush.created, Some(ItemId::from(1)));
        assert!(!ed.has_pending_creation());
        assert_eq!(ed.document().items()[0].value, "Double-click to edit");

        assert!(ed.flush().is_idle(), "second flush sees empty slots");
        assert_eq!(ed.document().len(), 1);
    }

    #[test]
    fn patch_without_selection_is_ignored() {
        let mut ed = editor();
        ed.add_shape();
        ed.flush();
        assert!(!ed.post_patch(ItemPatch::position(1.0, 1.0)));
        assert!(!ed.has_pending_patch());
        assert_eq!(ed.edit_property("x", "5"), Ok(false));
    }

    #[test]
    fn panel_edit_updates_selected_item() {
        let mut ed = editor();
        ed.add_text();
        let id = ed.flush().created.unwrap();
        ed.select(Some(id)).unwrap();

        assert_eq!(ed.edit_property("fontSize", "36"), Ok(true));
        let flush = ed.flush();
        assert_eq!(flush.patched, Some(id));
        assert_eq!(ed.property_sheet().and_then(|s| s.text).map(|t| t.font_size), Some(36.0));
        assert!(ed.renderer().calls().contains(&RenderCall::Patch(id)));
    }

    #[test]
    fn unchanged_patch_records_no_step() {
        let mut ed = editor();
        ed.add_text();
        let id = ed.flush().created.unwrap();
        let depth = ed.history().undo_depth();
        assert_eq!(ed.update(id, &ItemPatch::position(0.0, 0.0)), Ok(false));
        assert_eq!(ed.history().undo_depth(), depth);
    }

    #[test]
    fn renderer_failure_leaves_state_untouched() {
        let mut ed = editor();
        ed.renderer_mut().fail_next_creation("out of memory");
        ed.add_shape();
        let flush = ed.flush();
        assert_eq!(flush.created, None);
        assert_eq!(flush.errors.as_slice(), &[EditError::Renderer("out of memory".into())]);
        assert!(ed.document().is_empty());
        assert!(!ed.can_undo());
    }

    #[test]
    fn select_unknown_is_an_error() {
        let mut ed = editor();
        let ghost = ItemId::from(3);
        assert_eq!(ed.select(Some(ghost)), Err(EditError::NotFound(ghost)));
        assert_eq!(ed.selected_id(), None);
    }

    #[test]
    fn control_availability() {
        let mut ed = editor();
        assert!(!ed.can_delete() && !ed.can_move_up() && !ed.can_move_down());
        ed.add_text();
        ed.flush();
        ed.add_shape();
        let top = ed.flush().created.unwrap();
        ed.select(Some(top)).unwrap();
        assert!(ed.can_delete());
        assert!(!ed.can_move_up());
        assert!(ed.can_move_down());
    }

    #[test]
    fn canvas_settings_reach_renderer() {
        let mut ed = editor();
        assert_eq!(ed.renderer().canvas().map(|c| (c.width, c.height)), Some((800, 600)));
        ed.set_canvas_size(1024, 768).unwrap();
        assert!(ed.set_canvas_size(0, 10).is_err());
        assert_eq!(ed.canvas().width, 1024);
        ed.set_background(Color::BLACK);
        assert_eq!(ed.renderer().canvas().map(|c| c.background), Some(Color::BLACK));
        assert!(!ed.can_undo(), "canvas changes are not undoable");
    }

    #[test]
    fn reset_empties_everything_but_keeps_counting() {
        let mut ed = editor();
        ed.add_text();
        let first = ed.flush().created.unwrap();
        ed.select(Some(first)).unwrap();
        ed.add_shape();

        ed.reset();
        assert!(ed.document().is_empty());
        assert_eq!(ed.selected_id(), None);
        assert!(!ed.can_undo() && !ed.has_pending_creation());

        ed.add_text();
        let second = ed.flush().created.unwrap();
        assert_ne!(first, second);
    }
}
