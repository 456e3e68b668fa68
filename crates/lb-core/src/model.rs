//! Item data model.
//!
//! An item is one placed visual object: a text run, an image, or a vector
//! shape. All items share position and transform fields; the remaining
//! fields only mean something for some kinds (see [`ItemKind::accepts`]).
//! Absent optional fields resolve to the documented defaults below.

use crate::color::Color;
use crate::error::EditError;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

// ─── Defaults ────────────────────────────────────────────────────────────

pub const DEFAULT_ROTATION: f64 = 0.0;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_FONT_SIZE: f64 = 20.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 0.0;
pub const DEFAULT_FILL: Color = Color::BLACK;
pub const DEFAULT_STROKE: Color = Color::BLACK;

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The closed set of item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Text,
    Image,
    Shape,
}

/// A field that only some kinds carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Value,
    FontSize,
    Fill,
    Stroke,
    StrokeWidth,
    FontStyle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
        }
    }

    /// Whether `field` is meaningful for this kind.
    pub fn accepts(&self, field: Field) -> bool {
        match self {
            Self::Text => true,
            Self::Shape => matches!(field, Field::Value | Field::Fill),
            Self::Image => matches!(field, Field::Value),
        }
    }
}

impl FromStr for ItemKind {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "shape" => Ok(Self::Shape),
            other => Err(EditError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

// ─── Item ────────────────────────────────────────────────────────────────

/// One placed object. Two items are equal iff every field is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    /// Text content, image source, or shape name.
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

impl Item {
    /// A new item at the origin with identity transform.
    pub fn new(id: ItemId, kind: ItemKind, value: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            x: 0.0,
            y: 0.0,
            rotation: DEFAULT_ROTATION,
            scale_x: DEFAULT_SCALE,
            scale_y: DEFAULT_SCALE,
            value: value.into(),
            font_size: None,
            fill: None,
            stroke: None,
            stroke_width: None,
            font_style: None,
        }
    }

    /// Build from untyped parts, rejecting a blank id or an unknown kind.
    pub fn from_parts(id: &str, kind: &str, value: impl Into<String>) -> Result<Self, EditError> {
        let id = ItemId::new(id)?;
        let kind = kind.parse()?;
        Ok(Self::new(id, kind, value))
    }

    pub fn font_size_or_default(&self) -> f64 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub fn fill_or_default(&self) -> Color {
        self.fill.unwrap_or(DEFAULT_FILL)
    }

    pub fn stroke_or_default(&self) -> Color {
        self.stroke.unwrap_or(DEFAULT_STROKE)
    }

    pub fn stroke_width_or_default(&self) -> f64 {
        self.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH)
    }

    pub fn font_style_or_default(&self) -> FontStyle {
        self.font_style.unwrap_or_default()
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), EditError> {
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
        ] {
            finite(name, v)?;
        }
        Ok(())
    }
}

fn finite(name: &str, v: f64) -> Result<(), EditError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(EditError::invalid(format!("{name} must be a finite number, got {v}")))
    }
}

// ─── Patch ───────────────────────────────────────────────────────────────

/// A partial update to one item. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

impl ItemPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// The property panel's "Scale" control: both axes at once.
    pub fn uniform_scale(scale: f64) -> Self {
        Self {
            scale_x: Some(scale),
            scale_y: Some(scale),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the fields this patch sets, in wire spelling.
    pub fn changed_fields(&self) -> SmallVec<[&'static str; 4]> {
        let mut out = SmallVec::new();
        let flags = [
            ("x", self.x.is_some()),
            ("y", self.y.is_some()),
            ("rotation", self.rotation.is_some()),
            ("scaleX", self.scale_x.is_some()),
            ("scaleY", self.scale_y.is_some()),
            ("value", self.value.is_some()),
            ("fontSize", self.font_size.is_some()),
            ("fill", self.fill.is_some()),
            ("stroke", self.stroke.is_some()),
            ("strokeWidth", self.stroke_width.is_some()),
            ("fontStyle", self.font_style.is_some()),
        ];
        for (name, set) in flags {
            if set {
                out.push(name);
            }
        }
        out
    }

    /// Reject values no item may hold.
    pub fn validate(&self) -> Result<(), EditError> {
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("fontSize", self.font_size),
            ("strokeWidth", self.stroke_width),
        ] {
            if let Some(v) = v {
                finite(name, v)?;
            }
        }
        if let Some(size) = self.font_size
            && size <= 0.0
        {
            return Err(EditError::invalid(format!("fontSize must be positive, got {size}")));
        }
        if let Some(width) = self.stroke_width
            && width < 0.0
        {
            return Err(EditError::invalid(format!(
                "strokeWidth must not be negative, got {width}"
            )));
        }
        Ok(())
    }

    /// Drop the fields `kind` does not carry.
    pub fn restricted_to(mut self, kind: ItemKind) -> Self {
        if !kind.accepts(Field::Value) {
            self.value = None;
        }
        if !kind.accepts(Field::FontSize) {
            self.font_size = None;
        }
        if !kind.accepts(Field::Fill) {
            self.fill = None;
        }
        if !kind.accepts(Field::Stroke) {
            self.stroke = None;
        }
        if !kind.accepts(Field::StrokeWidth) {
            self.stroke_width = None;
        }
        if !kind.accepts(Field::FontStyle) {
            self.font_style = None;
        }
        self
    }

    /// Merge into `item`. Returns whether anything actually changed.
    /// Call [`ItemPatch::validate`] first; fields `item.kind` does not carry
    /// are ignored.
    pub fn apply_to(&self, item: &mut Item) -> bool {
        let patch = self.clone().restricted_to(item.kind);
        let before = item.clone();

        if let Some(v) = patch.x {
            item.x = v;
        }
        if let Some(v) = patch.y {
            item.y = v;
        }
        if let Some(v) = patch.rotation {
            item.rotation = v;
        }
        if let Some(v) = patch.scale_x {
            item.scale_x = v;
        }
        if let Some(v) = patch.scale_y {
            item.scale_y = v;
        }
        if let Some(v) = patch.value {
            item.value = v;
        }
        if patch.font_size.is_some() {
            item.font_size = patch.font_size;
        }
        if patch.fill.is_some() {
            item.fill = patch.fill;
        }
        if patch.stroke.is_some() {
            item.stroke = patch.stroke;
        }
        if patch.stroke_width.is_some() {
            item.stroke_width = patch.stroke_width;
        }
        if patch.font_style.is_some() {
            item.font_style = patch.font_style;
        }

        *item != before
    }

    /// Parse one property-panel edit (`key`, raw input text) into a patch.
    ///
    /// Position, rotation, font size and stroke width are whole numbers;
    /// `scale` is fractional and sets both axes. `italic` takes a boolean.
    /// Text content (`value`) is taken verbatim; every other input is
    /// trimmed before parsing.
    pub fn from_panel_field(key: &str, input: &str) -> Result<Self, EditError> {
        let raw = input.trim();
        let int = |name: &str| -> Result<f64, EditError> {
            raw.parse::<i64>()
                .map(|n| n as f64)
                .map_err(|_| EditError::invalid(format!("{name} expects a whole number, got `{raw}`")))
        };
        let color = |name: &str| -> Result<Color, EditError> {
            Color::from_hex(raw)
                .ok_or_else(|| EditError::invalid(format!("{name} expects a hex color, got `{raw}`")))
        };

        let mut patch = Self::default();
        match key {
            "x" => patch.x = Some(int(key)?),
            "y" => patch.y = Some(int(key)?),
            "rotation" => patch.rotation = Some(int(key)?),
            "scale" => {
                let scale = raw
                    .parse::<f64>()
                    .map_err(|_| EditError::invalid(format!("scale expects a number, got `{raw}`")))?;
                patch = Self::uniform_scale(scale);
            }
            "value" => patch.value = Some(input.to_string()),
            "fontSize" => patch.font_size = Some(int(key)?),
            "fill" => patch.fill = Some(color(key)?),
            "stroke" => patch.stroke = Some(color(key)?),
            "strokeWidth" => patch.stroke_width = Some(int(key)?),
            "italic" => {
                let italic = raw
                    .parse::<bool>()
                    .map_err(|_| EditError::invalid(format!("italic expects true/false, got `{raw}`")))?;
                patch.font_style = Some(if italic {
                    FontStyle::Italic
                } else {
                    FontStyle::Normal
                });
            }
            other => return Err(EditError::invalid(format!("unknown property `{other}`"))),
        }
        patch.validate()?;
        Ok(patch)
    }
}
