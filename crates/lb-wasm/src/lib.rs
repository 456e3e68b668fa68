//! WASM bridge for Layerboard: exposes the editor to a JavaScript canvas
//! engine.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the canvas
//! engine: it forwards user actions to [`LayerboardEditor`], drains
//! `take_commands()` into the engine after every call, and reports engine
//! changes back with `report()` followed by `sync()`.

mod bridge;

pub use bridge::{Command, JsRenderer, Report, flush_to_json};

use lb_core::{Color, ItemId, TransientHandle};
use lb_editor::{CanvasSettings, ControlHandle, Editor, EditorConfig};
use wasm_bindgen::prelude::*;

/// The WASM-facing editor controller.
#[wasm_bindgen]
pub struct LayerboardEditor {
    editor: Editor<JsRenderer>,
}

#[wasm_bindgen]
impl LayerboardEditor {
    /// Create an editor for a canvas of the given size. A zero dimension
    /// falls back to the default canvas.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Self {
        console_error_panic_hook_setup();

        let requested = CanvasSettings {
            width,
            height,
            ..CanvasSettings::default()
        };
        let canvas = match requested.validate() {
            Ok(()) => requested,
            Err(e) => {
                log::warn!("{e}; using default canvas");
                CanvasSettings::default()
            }
        };
        let config = EditorConfig {
            canvas,
            ..EditorConfig::default()
        };
        Self {
            editor: Editor::new(JsRenderer::new(), config),
        }
    }

    /// Back to an empty document with no history.
    pub fn reset(&mut self) {
        self.editor.reset();
    }

    // ─── Toolbar ─────────────────────────────────────────────────────────

    pub fn add_text(&mut self) {
        self.editor.add_text();
    }

    pub fn add_shape(&mut self) {
        self.editor.add_shape();
    }

    /// Stage an image from a transient URL (e.g. `blob:`). `on_release` is
    /// called with the URL once the editor no longer needs it (after the
    /// engine reports `captured` for the item, or once the item can no
    /// longer come back through undo/redo), so the page can revoke it.
    pub fn add_image(&mut self, url: &str, on_release: Option<js_sys::Function>) {
        let handle = match on_release {
            Some(callback) => TransientHandle::with_release(url, move |reference| {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(reference)) {
                    log::warn!("release callback failed: {e:?}");
                }
            }),
            None => TransientHandle::new(url),
        };
        self.editor.add_image(handle);
    }

    /// Deliver staged requests. Returns a JSON string:
    /// `{"created":id|null,"patched":id|null,"errors":[...]}`
    pub fn flush(&mut self) -> String {
        flush_to_json(&self.editor.flush()).to_string()
    }

    pub fn undo(&mut self) -> bool {
        self.editor.request_undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.request_redo()
    }

    /// Delete the selected item. Returns true if one was deleted.
    pub fn delete_selected(&mut self) -> bool {
        self.editor.request_delete()
    }

    pub fn move_layer_up(&mut self) -> bool {
        self.editor
            .move_selected_up()
            .inspect_err(|e| log::warn!("move up failed: {e}"))
            .unwrap_or(false)
    }

    pub fn move_layer_down(&mut self) -> bool {
        self.editor
            .move_selected_down()
            .inspect_err(|e| log::warn!("move down failed: {e}"))
            .unwrap_or(false)
    }

    /// Which toolbar controls are enabled, as JSON, with the labels of the
    /// steps undo and redo would take (`null` when disabled).
    pub fn get_controls(&self) -> String {
        let history = self.editor.history();
        serde_json::json!({
            "undo": self.editor.can_undo(),
            "redo": self.editor.can_redo(),
            "undoLabel": history.next_undo(),
            "redoLabel": history.next_redo(),
            "delete": self.editor.can_delete(),
            "moveUp": self.editor.can_move_up(),
            "moveDown": self.editor.can_move_down(),
        })
        .to_string()
    }

    // ─── Property panel ──────────────────────────────────────────────────

    /// The selected item's properties as JSON, or `{}` with nothing
    /// selected.
    pub fn get_selected_props(&self) -> String {
        self.editor
            .property_sheet()
            .and_then(|sheet| serde_json::to_string(&sheet).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Stage one panel edit for the selected item. Returns false when the
    /// value does not parse or nothing is selected.
    pub fn set_prop(&mut self, key: &str, value: &str) -> bool {
        self.editor
            .edit_property(key, value)
            .inspect_err(|e| log::warn!("{e}"))
            .unwrap_or(false)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// `""` when nothing is selected.
    pub fn get_selected_id(&self) -> String {
        self.editor
            .selected_id()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Select by id; an empty string clears the selection.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        let target = if id.trim().is_empty() {
            None
        } else {
            match ItemId::new(id) {
                Ok(id) => Some(id),
                Err(_) => return false,
            }
        };
        self.editor.select(target).is_ok()
    }

    // ─── Renderer traffic ────────────────────────────────────────────────

    /// Commands for the canvas engine since the last call, as a JSON array.
    pub fn take_commands(&mut self) -> String {
        let commands = self.editor.renderer_mut().take_commands();
        serde_json::to_string(&commands).unwrap_or_else(|_| "[]".to_string())
    }

    /// Queue one engine report. Returns false if it does not parse.
    pub fn report(&mut self, json: &str) -> bool {
        self.editor
            .renderer_mut()
            .report(json)
            .inspect_err(|e| log::warn!("{e}"))
            .is_ok()
    }

    /// Apply queued reports. Returns how many changed document or
    /// selection.
    pub fn sync(&mut self) -> u32 {
        let report = self.editor.sync_from_renderer();
        for e in &report.errors {
            log::warn!("renderer report rejected: {e}");
        }
        report.applied as u32
    }

    /// The document, bottom to top, as a JSON array of items.
    pub fn get_document(&self) -> String {
        serde_json::to_string(self.editor.document()).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    pub fn get_canvas(&self) -> String {
        serde_json::to_string(self.editor.canvas()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> bool {
        self.editor.set_canvas_size(width, height).is_ok()
    }

    /// Set the background from a hex color. Returns false if it does not
    /// parse.
    pub fn set_background(&mut self, hex: &str) -> bool {
        match Color::from_hex(hex) {
            Some(color) => {
                self.editor.set_background(color);
                true
            }
            None => false,
        }
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Layerboard WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> LayerboardEditor {
        let mut canvas = LayerboardEditor::new(1024, 768);
        canvas.take_commands();
        canvas
    }

    #[test]
    fn zero_size_falls_back_to_default_canvas() {
        let canvas = LayerboardEditor::new(0, 768);
        let json: serde_json::Value = serde_json::from_str(&canvas.get_canvas()).unwrap();
        assert_eq!(json["width"], 800);
        assert_eq!(json["background"], "#FFFFFF");
    }

    #[test]
    fn toolbar_round_trip() {
        let mut canvas = canvas();
        canvas.add_shape();
        let flush: serde_json::Value = serde_json::from_str(&canvas.flush()).unwrap();
        assert_eq!(flush["created"], 1);

        let commands: serde_json::Value = serde_json::from_str(&canvas.take_commands()).unwrap();
        assert_eq!(commands[0]["op"], "create");
        assert_eq!(commands[0]["item"]["value"], "star");

        assert!(canvas.select_by_id("1"));
        assert_eq!(canvas.get_selected_id(), "1");
        assert!(canvas.set_prop("fill", "#00ff00"));
        assert!(!canvas.set_prop("fontSize", "big"));
        canvas.flush();

        let props: serde_json::Value = serde_json::from_str(&canvas.get_selected_props()).unwrap();
        assert_eq!(props["shape"]["fill"], "#00FF00");
        assert_eq!(props["type"], "shape");

        assert!(canvas.undo());
        assert!(canvas.delete_selected());
        assert_eq!(canvas.get_document(), "[]");
        assert_eq!(canvas.get_selected_props(), "{}");
    }

    #[test]
    fn engine_reports_are_adopted() {
        let mut canvas = canvas();
        assert!(canvas.report(r#"{"event":"gestureStart"}"#));
        assert!(canvas.report(
            r#"{"event":"snapshot","items":[{"id":"title","type":"text","value":"Hi"}]}"#
        ));
        assert!(canvas.report(r#"{"event":"selection","id":"title"}"#));
        assert!(canvas.report(r#"{"event":"gestureEnd"}"#));
        assert!(!canvas.report("{}"));

        assert_eq!(canvas.sync(), 2);
        assert_eq!(canvas.get_selected_id(), "title");

        let controls: serde_json::Value = serde_json::from_str(&canvas.get_controls()).unwrap();
        assert_eq!(controls["undo"], true);
        assert_eq!(controls["undoLabel"], "canvas edit");
        assert_eq!(controls["redoLabel"], serde_json::Value::Null);
        assert_eq!(controls["moveUp"], false);

        assert!(canvas.undo());
        let controls: serde_json::Value = serde_json::from_str(&canvas.get_controls()).unwrap();
        assert_eq!(controls["redoLabel"], "canvas edit");
    }

    #[test]
    fn background_rejects_bad_hex() {
        let mut canvas = canvas();
        assert!(!canvas.set_background("teal"));
        assert!(canvas.set_background("#336699"));
        assert!(!canvas.set_canvas_size(0, 0));
        let commands: serde_json::Value = serde_json::from_str(&canvas.take_commands()).unwrap();
        assert_eq!(commands.as_array().map(|c| c.len()), Some(1));
        assert_eq!(commands[0]["canvas"]["background"], "#336699");
    }
}
