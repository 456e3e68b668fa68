//! RGBA colors as used by `fill` and `stroke`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn short_channel(c: u8) -> f32 {
    (c * 17) as f32 / 255.0
}

fn byte_channel(hi: u8, lo: u8) -> f32 {
    (hi << 4 | lo) as f32 / 255.0
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let digits = hex
            .bytes()
            .map(hex_val)
            .collect::<Option<Vec<u8>>>()?;

        match digits.as_slice() {
            [r, g, b] => Some(Self::rgba(
                short_channel(*r),
                short_channel(*g),
                short_channel(*b),
                1.0,
            )),
            [r, g, b, a] => Some(Self::rgba(
                short_channel(*r),
                short_channel(*g),
                short_channel(*b),
                short_channel(*a),
            )),
            [r1, r2, g1, g2, b1, b2] => Some(Self::rgba(
                byte_channel(*r1, *r2),
                byte_channel(*g1, *g2),
                byte_channel(*b1, *b2),
                1.0,
            )),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Self::rgba(
                byte_channel(*r1, *r2),
                byte_channel(*g1, *g2),
                byte_channel(*b1, *b2),
                byte_channel(*a1, *a2),
            )),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        let a = (self.a * 255.0).round() as u8;

        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}
