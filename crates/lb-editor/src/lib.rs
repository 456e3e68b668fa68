pub mod config;
pub mod editor;
pub mod history;
pub mod mailbox;
pub mod panel;
pub mod renderer;
pub mod selection;

pub use config::{CanvasSettings, EditorConfig, HistoryLimit};
pub use editor::{ControlHandle, Editor, Flush, SyncReport};
pub use history::{History, HistoryEntry};
pub use mailbox::Mailbox;
pub use panel::PropertySheet;
pub use renderer::{Capture, HeadlessRenderer, RenderCall, Renderer, RendererEvent};
pub use selection::Selection;
