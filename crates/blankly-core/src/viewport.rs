//! Zoom/pan state and the mapping between screen and scene space.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Multiplicative zoom change per wheel step.
pub const ZOOM_STEP: f64 = 1.05;
/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 10.0;

/// Viewport transform: `screen = scene * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Uniform zoom factor, kept within [`MIN_SCALE`, `MAX_SCALE`].
    pub scale: f64,
    /// Pan translation in screen pixels.
    pub offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Affine transform from scene to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Convert a scene point to screen coordinates.
    pub fn to_screen(&self, scene_point: Point) -> Point {
        Point::new(
            scene_point.x * self.scale + self.offset.x,
            scene_point.y * self.scale + self.offset.y,
        )
    }

    /// Convert a screen point to scene coordinates.
    pub fn to_scene(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.scale,
            (screen_point.y - self.offset.y) / self.scale,
        )
    }

    /// Apply one wheel step at `pointer`. A positive `delta_y` zooms out, a
    /// negative one zooms in; zero is ignored.
    pub fn wheel(&mut self, pointer: Point, delta_y: f64) {
        if delta_y > 0.0 {
            self.zoom_at(pointer, 1.0 / ZOOM_STEP);
        } else if delta_y < 0.0 {
            self.zoom_at(pointer, ZOOM_STEP);
        }
    }

    /// Zoom by `factor`, keeping the scene point under `pointer` fixed on
    /// screen.
    pub fn zoom_at(&mut self, pointer: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let scene_point = self.to_scene(pointer);
        self.scale = new_scale;
        self.offset = Vec2::new(
            pointer.x - scene_point.x * new_scale,
            pointer.y - scene_point.y * new_scale,
        );
    }

    /// Set the pan offset to the end position of a drag.
    pub fn pan_to(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Reset to unit scale and no offset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
