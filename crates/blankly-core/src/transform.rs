//! Reconciliation of resize/rotate gestures into entity geometry.
//!
//! The rendering surface applies a gesture by changing a node's scale,
//! rotation and position. When the gesture ends, geometric entities fold the
//! scale into their own geometry and the node's scale is reset to `(1, 1)`,
//! so the next gesture starts from a clean base. Text keeps the scale factors
//! as its own fields instead.

use crate::scene::DrawableMut;
use crate::shapes::Shape;
use kurbo::{Point, Vec2};

/// Unit scale.
pub const IDENTITY_SCALE: Vec2 = Vec2::new(1.0, 1.0);

/// The rendering node an entity is drawn with, as seen after a gesture.
pub trait SurfaceNode {
    fn position(&self) -> Point;
    fn scale(&self) -> Vec2;
    /// Rotation in degrees.
    fn rotation(&self) -> f64;
    fn set_scale(&mut self, scale: Vec2);
}

/// Plain node state, for surfaces that report gesture results by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeState {
    pub position: Point,
    pub scale: Vec2,
    pub rotation: f64,
}

impl NodeState {
    pub fn new(position: Point, scale: Vec2, rotation: f64) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }
}

impl SurfaceNode for NodeState {
    fn position(&self) -> Point {
        self.position
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }
}

/// Fold the node's post-gesture state into `target`.
pub fn reconcile_transform(target: &mut DrawableMut<'_>, node: &mut dyn SurfaceNode) {
    let scale = node.scale();
    let position = node.position();
    let rotation = node.rotation();

    match target {
        DrawableMut::Shape(shape) => {
            match &mut **shape {
                Shape::Line(stroke) | Shape::Arrow(stroke) => {
                    stroke.scale_points(scale.x, scale.y);
                    stroke.rotation = rotation;
                }
                Shape::Rect(rect) => {
                    rect.width *= scale.x.abs();
                    rect.height *= scale.y.abs();
                    rect.rotation = rotation;
                }
                Shape::Ellipse(ellipse) => {
                    ellipse.radius_x *= scale.x.abs();
                    ellipse.radius_y *= scale.y.abs();
                    ellipse.rotation = rotation;
                }
            }
            shape.set_position(position);
            node.set_scale(IDENTITY_SCALE);
        }
        DrawableMut::Image(image) => {
            image.width *= scale.x.abs();
            image.height *= scale.y.abs();
            image.x = position.x;
            image.y = position.y;
            image.rotation = rotation;
            node.set_scale(IDENTITY_SCALE);
        }
        DrawableMut::Text(text) => {
            text.scale_x = scale.x;
            text.scale_y = scale.y;
            text.x = position.x;
            text.y = position.y;
            text.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Ellipse, ImageItem, Rectangle, Stroke, TextLabel};
    use kurbo::Size;

    #[test]
    fn test_stroke_scales_even_odd_and_resets() {
        let mut shape = Shape::Arrow(Stroke::new(vec![1.0, 2.0, 3.0, 4.0]));
        let mut node = NodeState::new(Point::new(5.0, 6.0), Vec2::new(2.0, 3.0), 45.0);
        reconcile_transform(&mut DrawableMut::Shape(&mut shape), &mut node);

        let stroke = shape.as_stroke().unwrap();
        assert_eq!(stroke.points, vec![2.0, 6.0, 6.0, 12.0]);
        assert_eq!((stroke.x, stroke.y), (5.0, 6.0));
        assert_eq!(stroke.rotation, 45.0);
        assert_eq!(node.scale, IDENTITY_SCALE);
    }

    #[test]
    fn test_repeated_transforms_do_not_compound() {
        let mut shape = Shape::Line(Stroke::new(vec![1.0, 1.0, 2.0, 2.0]));
        let mut node = NodeState::new(Point::ZERO, Vec2::new(2.0, 2.0), 0.0);
        reconcile_transform(&mut DrawableMut::Shape(&mut shape), &mut node);
        // No further gesture: the node reports the reset scale.
        reconcile_transform(&mut DrawableMut::Shape(&mut shape), &mut node);
        assert_eq!(shape.as_stroke().unwrap().points, vec![2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn test_rect_bakes_scale_into_size() {
        let mut shape = Shape::Rect(Rectangle::new(Point::ZERO, 10.0, 20.0));
        let mut node = NodeState::new(Point::new(1.0, 2.0), Vec2::new(1.5, 0.5), 90.0);
        reconcile_transform(&mut DrawableMut::Shape(&mut shape), &mut node);

        let Shape::Rect(rect) = &shape else { unreachable!() };
        assert!((rect.width - 15.0).abs() < f64::EPSILON);
        assert!((rect.height - 10.0).abs() < f64::EPSILON);
        assert_eq!((rect.x, rect.y, rect.rotation), (1.0, 2.0, 90.0));
        assert_eq!(node.scale, IDENTITY_SCALE);
    }

    #[test]
    fn test_box_size_stays_non_negative_on_flip() {
        let mut shape = Shape::Ellipse(Ellipse::new(Point::ZERO, 4.0, 4.0));
        let mut node = NodeState::new(Point::ZERO, Vec2::new(-2.0, 1.0), 0.0);
        reconcile_transform(&mut DrawableMut::Shape(&mut shape), &mut node);
        let Shape::Ellipse(ellipse) = &shape else { unreachable!() };
        assert_eq!(ellipse.radius_x, 8.0);
    }

    #[test]
    fn test_image_bakes_scale() {
        let mut image = ImageItem::new("a.png", "data:", Point::ZERO, Size::new(100.0, 50.0));
        let mut node = NodeState::new(Point::new(3.0, 4.0), Vec2::new(0.5, 2.0), 10.0);
        reconcile_transform(&mut DrawableMut::Image(&mut image), &mut node);
        assert_eq!((image.width, image.height), (50.0, 100.0));
        assert_eq!((image.x, image.y, image.rotation), (3.0, 4.0, 10.0));
        assert_eq!(node.scale, IDENTITY_SCALE);
    }

    #[test]
    fn test_text_keeps_scale_fields() {
        let mut text = TextLabel::new(Point::ZERO, "hi".into());
        let mut node = NodeState::new(Point::new(8.0, 9.0), Vec2::new(2.0, 0.5), 30.0);
        reconcile_transform(&mut DrawableMut::Text(&mut text), &mut node);
        assert_eq!((text.scale_x, text.scale_y), (2.0, 0.5));
        assert_eq!(text.font_size, 24.0);
        assert_eq!(text.rotation, 30.0);
        assert_eq!(node.scale, Vec2::new(2.0, 0.5));
    }
}
