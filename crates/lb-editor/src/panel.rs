//! Property panel view of the selected item, with defaults resolved.

use lb_core::{Color, FontStyle, Item, ItemId, ItemKind};
use serde::Serialize;

/// Editable values for one item as the panel shows them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySheet {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    /// The uniform scale control shows the horizontal factor.
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    pub content: String,
    pub font_size: f64,
    pub fill: Color,
    pub italic: bool,
    pub stroke: Color,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeProperties {
    pub fill: Color,
}

impl PropertySheet {
    pub fn for_item(item: &Item) -> Self {
        let text = (item.kind == ItemKind::Text).then(|| TextProperties {
            content: item.value.clone(),
            font_size: item.font_size_or_default(),
            fill: item.fill_or_default(),
            italic: item.font_style_or_default() == FontStyle::Italic,
            stroke: item.stroke_or_default(),
            stroke_width: item.stroke_width_or_default(),
        });
        let shape = (item.kind == ItemKind::Shape).then(|| ShapeProperties {
            fill: item.fill_or_default(),
        });

        Self {
            id: item.id,
            kind: item.kind,
            x: item.x,
            y: item.y,
            rotation: item.rotation,
            scale: item.scale_x,
            text,
            shape,
        }
    }
}
