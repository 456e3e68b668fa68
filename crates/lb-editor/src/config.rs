//! Editor configuration.

use lb_core::{Color, EditError};
use serde::Serialize;

/// How many undo steps to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLimit {
    /// Keep every step for the lifetime of the editor.
    Unbounded,
    /// Keep at most `n` undo steps; the oldest is dropped first.
    /// `Capped(0)` disables undo entirely.
    Capped(usize),
}

impl HistoryLimit {
    pub fn allows(&self, len: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Capped(n) => len <= *n,
        }
    }
}

/// The fixed-size drawing surface. Not part of the document and not
/// recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub background: Color,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: Color::WHITE,
        }
    }
}

impl CanvasSettings {
    pub fn validate(&self) -> Result<(), EditError> {
        if self.width == 0 || self.height == 0 {
            return Err(EditError::invalid(format!(
                "canvas must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Configuration for [`crate::Editor`].
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Undo depth. Default: **Capped(100)**.
    pub history: HistoryLimit,

    /// Initial canvas. Default: 800×600 on white.
    pub canvas: CanvasSettings,

    /// Content of a text item created from the toolbar.
    pub text_placeholder: String,

    /// Shape created from the toolbar.
    pub default_shape: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryLimit::Capped(100),
            canvas: CanvasSettings::default(),
            text_placeholder: "Double-click to edit".to_string(),
            default_shape: "star".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_allows() {
        assert!(HistoryLimit::Unbounded.allows(usize::MAX));
        assert!(HistoryLimit::Capped(3).allows(3));
        assert!(!HistoryLimit::Capped(3).allows(4));
        assert!(!HistoryLimit::Capped(0).allows(1));
    }

    #[test]
    fn canvas_size_must_be_positive() {
        let mut canvas = CanvasSettings::default();
        assert!(canvas.validate().is_ok());
        canvas.height = 0;
        assert!(canvas.validate().is_err());
    }
}
