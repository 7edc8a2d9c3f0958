//! Text labels.

use super::{Color, DrawableId, default_scale};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Font family used for new labels.
pub const DEFAULT_FONT_FAMILY: &str = "Calibri";
/// Font size used for new labels.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// A single text label.
///
/// Unlike geometric shapes, resizing does not bake into the font size: the
/// gesture's scale factors are kept in `scale_x`/`scale_y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLabel {
    pub id: DrawableId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_fill")]
    pub fill: Color,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub draggable: bool,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_fill() -> Color {
    Color::WHITE
}

impl TextLabel {
    /// Create a label with a fresh id and default font.
    pub fn new(position: Point, text: String) -> Self {
        Self {
            id: DrawableId::generate(),
            x: position.x,
            y: position.y,
            text,
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            fill: Color::WHITE,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            draggable: false,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
