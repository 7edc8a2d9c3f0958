//! Ellipse shape.

use super::{Color, DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, DrawableId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// An ellipse positioned by its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub id: DrawableId,
    /// Center point.
    pub x: f64,
    pub y: f64,
    #[serde(rename = "radiusX")]
    pub radius_x: f64,
    #[serde(rename = "radiusY")]
    pub radius_y: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Color,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub draggable: bool,
}

impl Ellipse {
    /// Create a new ellipse with default styling and the preview id.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: DrawableId::preview(),
            x: center.x,
            y: center.y,
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            stroke: DEFAULT_STROKE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill: DEFAULT_FILL,
            rotation: 0.0,
            draggable: false,
        }
    }

    /// Create an ellipse inscribed in the box spanned by two corners.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let center = p1.midpoint(p2);
        Self::new(center, (p2.x - p1.x).abs() / 2.0, (p2.y - p1.y).abs() / 2.0)
    }

    pub(crate) fn span(&mut self, p1: Point, p2: Point) {
        let spanned = Self::from_corners(p1, p2);
        self.x = spanned.x;
        self.y = spanned.y;
        self.radius_x = spanned.radius_x;
        self.radius_y = spanned.radius_y;
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Unrotated bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.radius_x,
            self.y - self.radius_y,
            self.x + self.radius_x,
            self.y + self.radius_y,
        )
    }
}
