//! # Segment styles
//!
//! Colors and stroke attributes handed to the map widget.

use crate::congestion::{Classification, ColorContext};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Stroke weight of an ordinary segment.
pub const BASE_WEIGHT: u8 = 5;
/// Stroke weight of a segment whose road is selected or hovered.
pub const EMPHASIS_WEIGHT: u8 = 7;
/// Opacity of an ordinary segment.
pub const BASE_OPACITY: f32 = 0.9;
/// Opacity of a hovered segment.
pub const HOVER_OPACITY: f32 = 1.0;

/// Default color for hover highlighting.
pub const DEFAULT_HOVER_COLOR: Color = Color::from_rgb(0xFF, 0x78, 0x75);

/// An opaque sRGB color, written as `#RRGGBB`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid color {0:?}; expected #RRGGBB")]
pub struct ColorParseError(String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorParseError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };

        Ok(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Style attributes of one drawn segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentStyle {
    pub color: Color,
    pub weight: u8,
    pub opacity: f32,
}

impl SegmentStyle {
    /// The style a segment is created with, before any congestion data is applied.
    pub fn initial() -> Self {
        Self::baseline(&Classification::unknown(), false)
    }

    /// The congestion-driven style for a segment.
    ///
    /// Segments belonging to the selected road are drawn heavier.
    pub fn baseline(classification: &Classification, selected: bool) -> Self {
        Self {
            color: classification.color(ColorContext::Drawing),
            weight: if selected { EMPHASIS_WEIGHT } else { BASE_WEIGHT },
            opacity: BASE_OPACITY,
        }
    }

    /// The transient style of a segment under the pointer.
    pub fn hover(color: Color) -> Self {
        Self {
            color,
            weight: EMPHASIS_WEIGHT,
            opacity: HOVER_OPACITY,
        }
    }
}
