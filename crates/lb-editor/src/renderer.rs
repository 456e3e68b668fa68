//! The renderer boundary.
//!
//! The renderer is an external canvas engine that owns live visual state:
//! it draws items, runs hit-testing and transform handles, and lets the user
//! drag, resize, rotate and pick. The editor talks to it through
//! [`Renderer`] (commands in) and [`RendererEvent`] (reports out).
//!
//! Reports are full ordered snapshots. The editor adopts a snapshot only
//! when it differs from the current document and was taken after the last
//! document the editor pushed.

use crate::config::CanvasSettings;
use lb_core::{Document, EditError, Item, ItemId, ItemPatch};

/// What the renderer kept after instantiating an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capture {
    /// A reference that outlives the creation request, replacing the
    /// request's transient one (e.g. an image decoded into the renderer's
    /// own asset store). `None` keeps the requested value for now; a
    /// transient handle then stays alive until the renderer reports
    /// [`RendererEvent::AssetCaptured`] for the item.
    pub durable_value: Option<String>,
}

/// Commands from the editor to the renderer.
pub trait Renderer {
    /// Instantiate a visual object for `item`, which is about to be
    /// appended on top of the document.
    fn apply_creation(&mut self, item: &Item) -> Result<Capture, EditError>;

    /// Update the visual object for `id`.
    fn apply_patch(&mut self, id: ItemId, patch: &ItemPatch) -> Result<(), EditError>;

    /// Reflect a selection chosen by the editor (not by the user).
    fn apply_selection_override(&mut self, id: Option<ItemId>);

    /// Replace the whole scene, e.g. after undo/redo or a reorder.
    /// `generation` grows with every call; snapshots taken afterwards
    /// should carry it.
    fn apply_document(&mut self, document: &Document, generation: u64);

    fn apply_canvas(&mut self, _canvas: &CanvasSettings) {}

    /// Reports produced since the last poll.
    fn poll_events(&mut self) -> Vec<RendererEvent> {
        Vec::new()
    }
}

/// Reports from the renderer to the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// The full ordered scene after a change inside the renderer, tagged
    /// with the last document generation it had applied (`None` when the
    /// renderer does not track generations).
    Snapshot {
        items: Vec<Item>,
        generation: Option<u64>,
    },
    /// An item created from a transient reference now has a durable one.
    AssetCaptured { id: ItemId, value: String },
    /// The user picked an item or clicked on empty canvas.
    SelectionChanged(Option<ItemId>),
    /// A drag/resize/rotate gesture started.
    GestureStarted,
    /// The current gesture ended.
    GestureEnded,
}

// ─── Headless renderer ───────────────────────────────────────────────────

/// A command received by [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Create(ItemId),
    Patch(ItemId),
    Select(Option<ItemId>),
    Document(usize),
    Canvas(u32, u32),
}

/// An in-memory renderer: keeps its own copy of the scene, records every
/// command, and can simulate user gestures. Hosts use it for tests and
/// for running the editor without a display.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    scene: Vec<Item>,
    selected: Option<ItemId>,
    canvas: Option<CanvasSettings>,
    calls: Vec<RenderCall>,
    outbox: Vec<RendererEvent>,
    /// When set, images are captured under `{prefix}{n}`.
    asset_prefix: Option<String>,
    captured_assets: usize,
    generation: u64,
    /// When set, the next creation fails with this message.
    fail_next_creation: Option<String>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture images into a private asset store instead of keeping the
    /// transient reference.
    pub fn with_asset_store(prefix: impl Into<String>) -> Self {
        Self {
            asset_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn fail_next_creation(&mut self, reason: impl Into<String>) {
        self.fail_next_creation = Some(reason.into());
    }

    pub fn scene(&self) -> &[Item] {
        &self.scene
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn canvas(&self) -> Option<&CanvasSettings> {
        self.canvas.as_ref()
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Simulate the user dragging `id` by (`dx`, `dy`) in `steps` frames,
    /// reporting a snapshot per frame. Returns false if `id` is unknown.
    pub fn drag(&mut self, id: ItemId, dx: f64, dy: f64, steps: u32) -> bool {
        if !self.scene.iter().any(|i| i.id == id) {
            return false;
        }
        let steps = steps.max(1);
        self.outbox.push(RendererEvent::GestureStarted);
        for _ in 0..steps {
            if let Some(item) = self.scene.iter_mut().find(|i| i.id == id) {
                item.x += dx / steps as f64;
                item.y += dy / steps as f64;
            }
            self.report_scene();
        }
        self.outbox.push(RendererEvent::GestureEnded);
        true
    }

    /// Simulate the user rotating `id` to `degrees` with a handle.
    pub fn rotate(&mut self, id: ItemId, degrees: f64) -> bool {
        let Some(item) = self.scene.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.rotation = degrees;
        self.report_scene();
        true
    }

    /// Simulate the user clicking an item (`Some`) or empty canvas (`None`).
    pub fn pick(&mut self, id: Option<ItemId>) {
        self.selected = id;
        self.outbox.push(RendererEvent::SelectionChanged(id));
    }

    /// Simulate the user deleting `id` from inside the canvas (e.g. a key
    /// binding the engine handles itself).
    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.scene.len();
        self.scene.retain(|i| i.id != id);
        if self.scene.len() == before {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.report_scene();
        true
    }

    /// Simulate a late capture of the asset behind `id`, e.g. an image
    /// that finished uploading. Returns false if `id` is unknown.
    pub fn capture_asset(&mut self, id: ItemId, value: impl Into<String>) -> bool {
        let Some(item) = self.scene.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        let value = value.into();
        item.value = value.clone();
        self.outbox.push(RendererEvent::AssetCaptured { id, value });
        true
    }

    fn report_scene(&mut self) {
        self.outbox.push(RendererEvent::Snapshot {
            items: self.scene.clone(),
            generation: Some(self.generation),
        });
    }
}

impl Renderer for HeadlessRenderer {
    fn apply_creation(&mut self, item: &Item) -> Result<Capture, EditError> {
        if let Some(reason) = self.fail_next_creation.take() {
            return Err(EditError::Renderer(reason));
        }
        log::trace!("headless: create {} {}", item.kind, item.id);

        let mut placed = item.clone();
        let capture = match (&self.asset_prefix, item.kind) {
            (Some(prefix), lb_core::ItemKind::Image) => {
                self.captured_assets += 1;
                let durable = format!("{prefix}{}", self.captured_assets);
                placed.value = durable.clone();
                Capture {
                    durable_value: Some(durable),
                }
            }
            _ => Capture::default(),
        };

        self.calls.push(RenderCall::Create(item.id));
        self.scene.push(placed);
        self.report_scene();
        Ok(capture)
    }

    fn apply_patch(&mut self, id: ItemId, patch: &ItemPatch) -> Result<(), EditError> {
        let item = self
            .scene
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(EditError::NotFound(id))?;
        patch.apply_to(item);
        self.calls.push(RenderCall::Patch(id));
        self.report_scene();
        Ok(())
    }

    fn apply_selection_override(&mut self, id: Option<ItemId>) {
        self.selected = id;
        self.calls.push(RenderCall::Select(id));
    }

    fn apply_document(&mut self, document: &Document, generation: u64) {
        self.scene = document.items().to_vec();
        self.generation = generation;
        if let Some(id) = self.selected
            && !document.contains(id)
        {
            self.selected = None;
        }
        self.calls.push(RenderCall::Document(document.len()));
    }

    fn apply_canvas(&mut self, canvas: &CanvasSettings) {
        self.canvas = Some(*canvas);
        self.calls.push(RenderCall::Canvas(canvas.width, canvas.height));
    }

    fn poll_events(&mut self) -> Vec<RendererEvent> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::ItemKind;

    #[test]
    fn creation_reports_scene() {
        let mut renderer = HeadlessRenderer::new();
        let item = Item::new(ItemId::from(1), ItemKind::Text, "hi");
        assert_eq!(renderer.apply_creation(&item), Ok(Capture::default()));
        assert_eq!(
            renderer.poll_events(),
            vec![RendererEvent::Snapshot {
                items: vec![item],
                generation: Some(0)
            }]
        );
        assert!(renderer.poll_events().is_empty());
    }

    #[test]
    fn asset_store_captures_images() {
        let mut renderer = HeadlessRenderer::with_asset_store("asset://");
        let image = Item::new(ItemId::from(1), ItemKind::Image, "blob:abc");
        let capture = renderer.apply_creation(&image).unwrap();
        assert_eq!(capture.durable_value.as_deref(), Some("asset://1"));
        assert_eq!(renderer.scene()[0].value, "asset://1");
    }

    #[test]
    fn drag_reports_every_frame() {
        let mut renderer = HeadlessRenderer::new();
        let item = Item::new(ItemId::from(1), ItemKind::Shape, "star");
        renderer.apply_document(&Document::from_items(vec![item.clone()]).unwrap(), 3);
        assert!(renderer.drag(item.id, 30.0, 0.0, 3));
        let events = renderer.poll_events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], RendererEvent::GestureStarted);
        assert_eq!(events[4], RendererEvent::GestureEnded);
        assert!(matches!(events[1], RendererEvent::Snapshot { generation: Some(3), .. }));
        assert_eq!(renderer.scene()[0].x, 30.0);
        assert!(!renderer.drag(ItemId::from(9), 1.0, 1.0, 1));
    }
}
