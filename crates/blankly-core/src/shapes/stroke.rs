//! Polyline geometry shared by lines, arrows and freehand strokes.

use super::{Color, DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, DrawableId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A sequence of scene-space points stored as flattened `x, y` pairs.
///
/// `x`/`y` are a translation applied on top of the points; dragging a stroke
/// only moves this offset and leaves the points untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: DrawableId,
    pub points: Vec<f64>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Color,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub draggable: bool,
}

impl Stroke {
    /// Create a stroke with default styling and the preview id.
    pub fn new(points: Vec<f64>) -> Self {
        Self {
            id: DrawableId::preview(),
            points,
            x: 0.0,
            y: 0.0,
            stroke: DEFAULT_STROKE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill: DEFAULT_FILL,
            rotation: 0.0,
            draggable: false,
        }
    }

    /// Seed a two-point stroke whose both ends sit at `start`.
    pub fn segment_from(start: Point) -> Self {
        Self::new(vec![start.x, start.y, start.x, start.y])
    }

    /// Seed a freehand stroke with a single point.
    pub fn freehand_from(start: Point) -> Self {
        Self::new(vec![start.x, start.y])
    }

    /// Iterate over the points as pairs.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.chunks_exact(2).map(|p| Point::new(p[0], p[1]))
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }

    /// Append a point pair.
    pub fn push_point(&mut self, point: Point) {
        self.points.push(point.x);
        self.points.push(point.y);
    }

    /// Replace the second point pair, keeping the first fixed.
    pub fn set_end(&mut self, point: Point) {
        self.points.truncate(2);
        self.push_point(point);
    }

    /// Multiply x coordinates by `sx` and y coordinates by `sy`.
    pub fn scale_points(&mut self, sx: f64, sy: f64) {
        for (i, value) in self.points.iter_mut().enumerate() {
            if i % 2 == 0 {
                *value *= sx;
            } else {
                *value *= sy;
            }
        }
    }

    /// Make the point list satisfy the committed invariant of at least two
    /// pairs: a lone click becomes a zero-length segment.
    pub(crate) fn finalize(&mut self) {
        if self.points.len() % 2 == 1 {
            self.points.pop();
        }
        match self.points.len() {
            0 => self.points.extend([0.0; 4]),
            2 => {
                let (x, y) = (self.points[0], self.points[1]);
                self.points.extend([x, y]);
            }
            _ => {}
        }
    }
}
