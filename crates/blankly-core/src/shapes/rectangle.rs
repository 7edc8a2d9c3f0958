//! Rectangle shape.

use super::{Color, DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, DrawableId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle positioned by its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub id: DrawableId,
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Color,
    /// Rotation in degrees, around the top-left corner.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub draggable: bool,
}

impl Rectangle {
    /// Create a new rectangle with default styling and the preview id.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: DrawableId::preview(),
            x: position.x,
            y: position.y,
            width: width.abs(),
            height: height.abs(),
            stroke: DEFAULT_STROKE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill: DEFAULT_FILL,
            rotation: 0.0,
            draggable: false,
        }
    }

    /// Create a rectangle from two corner points, in either order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let min_x = p1.x.min(p2.x);
        let min_y = p1.y.min(p2.y);
        let width = (p2.x - p1.x).abs();
        let height = (p2.y - p1.y).abs();

        Self::new(Point::new(min_x, min_y), width, height)
    }

    /// Re-span this rectangle between two corners, keeping id and style.
    pub(crate) fn span(&mut self, p1: Point, p2: Point) {
        let spanned = Self::from_corners(p1, p2);
        self.x = spanned.x;
        self.y = spanned.y;
        self.width = spanned.width;
        self.height = spanned.height;
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Unrotated bounds as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rectangle::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 10.0));
        assert!((rect.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.y - 10.0).abs() < f64::EPSILON);
        assert!((rect.width - 40.0).abs() < f64::EPSILON);
        assert!((rect.height - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_corners_order_independent() {
        let a = Point::new(-3.0, 8.0);
        let b = Point::new(12.5, -1.0);
        let c = Point::new(-3.0, -1.0);
        let d = Point::new(12.5, 8.0);
        let ab = Rectangle::from_corners(a, b);
        assert_eq!(ab, Rectangle::from_corners(b, a));
        assert_eq!(ab, Rectangle::from_corners(c, d));
        assert_eq!(ab, Rectangle::from_corners(d, c));
    }

    #[test]
    fn test_new_never_negative() {
        let rect = Rectangle::new(Point::ZERO, -5.0, -2.0);
        assert_eq!(rect.width, 5.0);
        assert_eq!(rect.height, 2.0);
    }

    #[test]
    fn test_as_rect() {
        let rect = Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0);
        assert_eq!(rect.as_rect(), Rect::new(1.0, 2.0, 4.0, 6.0));
    }
}
