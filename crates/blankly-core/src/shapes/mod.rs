//! Drawable entities placed on the whiteboard.
//!
//! The scene keeps three separate collections (geometric shapes, text labels
//! and images), so the data model mirrors that split: [`Shape`] covers the
//! geometric variants and [`Drawable`] is the closed union over everything a
//! tool can commit or a peer can relay.

mod ellipse;
mod image;
mod rectangle;
mod stroke;
mod text;

pub use ellipse::Ellipse;
pub use image::{ImageItem, fit_within};
pub use rectangle::Rectangle;
pub use stroke::Stroke;
pub use text::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, TextLabel};

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Default stroke color for new shapes.
pub const DEFAULT_STROKE: Color = Color::WHITE;
/// Default stroke width for new shapes.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;
/// Default fill for new shapes.
pub const DEFAULT_FILL: Color = Color::TRANSPARENT;

/// Identifier of a drawable, stable for its whole lifetime.
///
/// The value `"preview"` is reserved for the single uncommitted shape held by
/// the tool manager and never appears in the committed scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawableId(String);

impl DrawableId {
    /// Reserved identifier of the in-progress preview shape.
    pub const PREVIEW: &'static str = "preview";

    /// Identifier used by the in-progress preview shape.
    pub fn preview() -> Self {
        Self(Self::PREVIEW.to_string())
    }

    /// Generate a fresh, collision-free identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Whether this is the reserved preview identifier.
    pub fn is_preview(&self) -> bool {
        self.0 == Self::PREVIEW
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DrawableId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DrawableId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Error returned when a CSS color string cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported color: {0:?}")]
pub struct ColorParseError(pub String);

/// RGBA8 color, serialized as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color: `transparent`, `white`, `black`, `#rgb`, `#rrggbb`
    /// or `#rrggbbaa`.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "transparent" => return Ok(Self::TRANSPARENT),
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            _ => {}
        }

        let err = || ColorParseError(input.to_string());
        let hex = trimmed.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| err());

        match hex.len() {
            3 => Ok(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
                255,
            )),
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(err()),
        }
    }

    /// Format as a CSS color string.
    pub fn to_css(&self) -> String {
        if *self == Self::TRANSPARENT {
            "transparent".to_string()
        } else if *self == Self::WHITE {
            "white".to_string()
        } else if *self == Self::BLACK {
            "black".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_css()
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Kind tag of a drawable, used for dispatch without borrowing the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawableKind {
    Line,
    Arrow,
    Rect,
    Ellipse,
    Text,
    Image,
}

impl DrawableKind {
    /// Lines and arrows store their geometry as a flat point list.
    pub fn is_stroke_like(self) -> bool {
        matches!(self, DrawableKind::Line | DrawableKind::Arrow)
    }

    /// Rectangles, ellipses and images store a width/height style extent.
    pub fn is_box_like(self) -> bool {
        matches!(self, DrawableKind::Rect | DrawableKind::Ellipse | DrawableKind::Image)
    }
}

/// Geometric shapes, held together in the scene's first collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Line(Stroke),
    Arrow(Stroke),
    Rect(Rectangle),
    Ellipse(Ellipse),
}

impl Shape {
    pub fn id(&self) -> &DrawableId {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => &s.id,
            Shape::Rect(r) => &r.id,
            Shape::Ellipse(e) => &e.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: DrawableId) {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => s.id = id,
            Shape::Rect(r) => r.id = id,
            Shape::Ellipse(e) => e.id = id,
        }
    }

    pub fn kind(&self) -> DrawableKind {
        match self {
            Shape::Line(_) => DrawableKind::Line,
            Shape::Arrow(_) => DrawableKind::Arrow,
            Shape::Rect(_) => DrawableKind::Rect,
            Shape::Ellipse(_) => DrawableKind::Ellipse,
        }
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => s.rotation,
            Shape::Rect(r) => r.rotation,
            Shape::Ellipse(e) => e.rotation,
        }
    }

    pub fn draggable(&self) -> bool {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => s.draggable,
            Shape::Rect(r) => r.draggable,
            Shape::Ellipse(e) => e.draggable,
        }
    }

    pub(crate) fn set_draggable(&mut self, draggable: bool) {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => s.draggable = draggable,
            Shape::Rect(r) => r.draggable = draggable,
            Shape::Ellipse(e) => e.draggable = draggable,
        }
    }

    /// Position of the rendering node (top-left for rectangles, center for
    /// ellipses, translation offset for strokes).
    pub fn position(&self) -> Point {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => Point::new(s.x, s.y),
            Shape::Rect(r) => Point::new(r.x, r.y),
            Shape::Ellipse(e) => Point::new(e.x, e.y),
        }
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => {
                s.x = position.x;
                s.y = position.y;
            }
            Shape::Rect(r) => {
                r.x = position.x;
                r.y = position.y;
            }
            Shape::Ellipse(e) => {
                e.x = position.x;
                e.y = position.y;
            }
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Shape::Line(s) | Shape::Arrow(s) => Some(s),
            _ => None,
        }
    }
}

/// Any entity placeable on the scene.
///
/// Shapes carry a `type` tag on the wire; text labels and images are told
/// apart by their field sets, matching the persisted collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Drawable {
    Shape(Shape),
    Text(TextLabel),
    Image(ImageItem),
}

impl Drawable {
    pub fn id(&self) -> &DrawableId {
        match self {
            Drawable::Shape(s) => s.id(),
            Drawable::Text(t) => &t.id,
            Drawable::Image(i) => &i.id,
        }
    }

    pub fn kind(&self) -> DrawableKind {
        match self {
            Drawable::Shape(s) => s.kind(),
            Drawable::Text(_) => DrawableKind::Text,
            Drawable::Image(_) => DrawableKind::Image,
        }
    }

    pub fn rotation(&self) -> f64 {
        match self {
            Drawable::Shape(s) => s.rotation(),
            Drawable::Text(t) => t.rotation,
            Drawable::Image(i) => i.rotation,
        }
    }

    pub fn draggable(&self) -> bool {
        match self {
            Drawable::Shape(s) => s.draggable(),
            Drawable::Text(t) => t.draggable,
            Drawable::Image(i) => i.draggable,
        }
    }

    pub(crate) fn set_draggable(&mut self, draggable: bool) {
        match self {
            Drawable::Shape(s) => s.set_draggable(draggable),
            Drawable::Text(t) => t.draggable = draggable,
            Drawable::Image(i) => i.draggable = draggable,
        }
    }
}

impl From<Shape> for Drawable {
    fn from(shape: Shape) -> Self {
        Drawable::Shape(shape)
    }
}

impl From<TextLabel> for Drawable {
    fn from(text: TextLabel) -> Self {
        Drawable::Text(text)
    }
}

impl From<ImageItem> for Drawable {
    fn from(image: ImageItem) -> Self {
        Drawable::Image(image)
    }
}
