//! Raster images placed on the canvas.

use super::DrawableId;
use crate::image_decode::DecodedImage;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An image with a display size independent of its source pixel size.
///
/// Only the source reference (`src`, usually a `data:` URL) is persisted; the
/// decoded pixels are rebuilt on load and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub id: DrawableId,
    #[serde(default)]
    pub name: String,
    pub src: String,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub draggable: bool,
    #[serde(skip)]
    pub pixels: Option<Arc<DecodedImage>>,
}

impl ImageItem {
    /// Create an image at `position` with a fresh id.
    pub fn new(name: impl Into<String>, src: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id: DrawableId::generate(),
            name: name.into(),
            src: src.into(),
            x: position.x,
            y: position.y,
            width: size.width.abs(),
            height: size.height.abs(),
            rotation: 0.0,
            draggable: false,
            pixels: None,
        }
    }

    /// Create an image from decoded pixels, shrunk to fit `max` and centered
    /// on `center`.
    pub fn placed(
        name: impl Into<String>,
        src: impl Into<String>,
        pixels: Arc<DecodedImage>,
        max: Size,
        center: Point,
    ) -> Self {
        let size = fit_within(
            Size::new(f64::from(pixels.width), f64::from(pixels.height)),
            max,
        );
        let position = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        let mut item = Self::new(name, src, position, size);
        item.pixels = Some(pixels);
        item
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn is_decoded(&self) -> bool {
        self.pixels.is_some()
    }
}

/// Shrink `source` to fit inside `max`, preserving aspect ratio.
///
/// Sources already inside `max` keep their size.
pub fn fit_within(source: Size, max: Size) -> Size {
    if source.width <= 0.0 || source.height <= 0.0 {
        return Size::ZERO;
    }
    let aspect = source.width / source.height;
    let mut width = source.width;
    let mut height = source.height;

    if width > max.width {
        width = max.width;
        height = max.width / aspect;
    }
    if height > max.height {
        height = max.height;
        width = max.height * aspect;
    }

    Size::new(width, height)
}
