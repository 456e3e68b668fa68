//! JSON traffic between the editor and the JavaScript canvas engine.
//!
//! Commands queue up in [`JsRenderer`] until the page drains them with
//! `take_commands`; reports from the page are parsed into
//! [`RendererEvent`]s and handed to the editor on the next sync.

use lb_core::{Document, EditError, Item, ItemId, ItemPatch};
use lb_editor::{CanvasSettings, Capture, Flush, Renderer, RendererEvent};
use serde::{Deserialize, Serialize};

/// One instruction for the canvas engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    Create { item: Item },
    Patch { id: ItemId, patch: ItemPatch },
    Select { id: Option<ItemId> },
    Document { items: Vec<Item>, generation: u64 },
    Canvas { canvas: CanvasSettings },
}

/// One report from the canvas engine, e.g.
/// `{"event":"selection","id":3}` or `{"event":"gestureStart"}`.
///
/// A snapshot should echo the `generation` of the last `document` command
/// the engine applied; without it a snapshot in flight during an undo would
/// be adopted as a new edit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Report {
    Snapshot {
        items: Vec<Item>,
        #[serde(default)]
        generation: Option<u64>,
    },
    Selection { id: Option<ItemId> },
    /// The engine stored the asset of `id` under a durable `value`; the
    /// transient URL may be revoked.
    Captured { id: ItemId, value: String },
    GestureStart,
    GestureEnd,
}

impl From<Report> for RendererEvent {
    fn from(report: Report) -> Self {
        match report {
            Report::Snapshot { items, generation } => RendererEvent::Snapshot { items, generation },
            Report::Captured { id, value } => RendererEvent::AssetCaptured { id, value },
            Report::Selection { id } => RendererEvent::SelectionChanged(id),
            Report::GestureStart => RendererEvent::GestureStarted,
            Report::GestureEnd => RendererEvent::GestureEnded,
        }
    }
}

/// A [`Renderer`] whose other side lives in JavaScript.
///
/// The engine instantiates objects asynchronously, so creation always
/// succeeds here and keeps the requested value. The editor holds an image's
/// transient handle until the engine sends a `captured` report.
#[derive(Debug, Default)]
pub struct JsRenderer {
    outbox: Vec<Command>,
    inbox: Vec<RendererEvent>,
}

impl JsRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a report from the page.
    pub fn report(&mut self, json: &str) -> Result<(), EditError> {
        let report: Report = serde_json::from_str(json)
            .map_err(|e| EditError::invalid(format!("malformed renderer report: {e}")))?;
        self.inbox.push(report.into());
        Ok(())
    }

    pub fn pending_reports(&self) -> usize {
        self.inbox.len()
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }
}

impl Renderer for JsRenderer {
    fn apply_creation(&mut self, item: &Item) -> Result<Capture, EditError> {
        self.outbox.push(Command::Create { item: item.clone() });
        Ok(Capture::default())
    }

    fn apply_patch(&mut self, id: ItemId, patch: &ItemPatch) -> Result<(), EditError> {
        self.outbox.push(Command::Patch {
            id,
            patch: patch.clone(),
        });
        Ok(())
    }

    fn apply_selection_override(&mut self, id: Option<ItemId>) {
        self.outbox.push(Command::Select { id });
    }

    fn apply_document(&mut self, document: &Document, generation: u64) {
        self.outbox.push(Command::Document {
            items: document.items().to_vec(),
            generation,
        });
    }

    fn apply_canvas(&mut self, canvas: &CanvasSettings) {
        self.outbox.push(Command::Canvas { canvas: *canvas });
    }

    fn poll_events(&mut self) -> Vec<RendererEvent> {
        std::mem::take(&mut self.inbox)
    }
}

/// `{"created":1,"patched":null,"errors":[]}`
pub fn flush_to_json(flush: &Flush) -> serde_json::Value {
    let errors: Vec<String> = flush.errors.iter().map(|e| e.to_string()).collect();
    serde_json::json!({
        "created": flush.created,
        "patched": flush.patched,
        "errors": errors,
    })
}
