//! Tool system for the whiteboard.

use crate::shapes::{DrawableId, Ellipse, Rectangle, Shape, Stroke};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Hand,
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    #[serde(rename = "freehand-draw")]
    Freehand,
    Eraser,
    Text,
}

impl ToolKind {
    /// Tools that create a preview shape on pointer-down.
    pub fn is_drawing(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Ellipse
                | ToolKind::Line
                | ToolKind::Arrow
                | ToolKind::Freehand
        )
    }
}

/// State of a drawing interaction.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    /// Waiting for pointer-down.
    #[default]
    Idle,
    /// A preview shape follows the pointer.
    Previewing {
        /// Pointer-down position. Box tools re-span from it on every move.
        start: Point,
        preview: Shape,
    },
}

/// Manages the current tool and its drawing state.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool, abandoning any preview. Returns `true` if a
    /// preview was abandoned.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        self.current_tool = tool;
        let abandoned = self.is_active();
        self.state = ToolState::Idle;
        abandoned
    }

    /// Begin a drawing interaction at scene position `point`.
    ///
    /// Returns `false` (and stays idle) for non-drawing tools.
    pub fn begin(&mut self, point: Point) -> bool {
        let preview = match self.current_tool {
            ToolKind::Rectangle => Shape::Rect(Rectangle::from_corners(point, point)),
            ToolKind::Ellipse => Shape::Ellipse(Ellipse::from_corners(point, point)),
            ToolKind::Line => Shape::Line(Stroke::segment_from(point)),
            ToolKind::Arrow => Shape::Arrow(Stroke::segment_from(point)),
            ToolKind::Freehand => Shape::Line(Stroke::freehand_from(point)),
            ToolKind::Select | ToolKind::Hand | ToolKind::Eraser | ToolKind::Text => return false,
        };
        self.state = ToolState::Previewing {
            start: point,
            preview,
        };
        true
    }

    /// Update the preview from the current pointer position.
    pub fn update(&mut self, point: Point) {
        let ToolState::Previewing { start, preview } = &mut self.state else {
            return;
        };
        match (self.current_tool, preview) {
            (ToolKind::Freehand, Shape::Line(stroke)) => stroke.push_point(point),
            (ToolKind::Line, Shape::Line(stroke)) | (ToolKind::Arrow, Shape::Arrow(stroke)) => {
                stroke.set_end(point)
            }
            (ToolKind::Rectangle, Shape::Rect(rect)) => rect.span(*start, point),
            (ToolKind::Ellipse, Shape::Ellipse(ellipse)) => ellipse.span(*start, point),
            _ => {}
        }
    }

    /// Finish the interaction, returning the preview as a committed shape with
    /// a permanent id. Returns `None` if there was no preview.
    pub fn end(&mut self) -> Option<Shape> {
        let ToolState::Previewing { mut preview, .. } = std::mem::take(&mut self.state) else {
            return None;
        };
        if let Shape::Line(stroke) | Shape::Arrow(stroke) = &mut preview {
            stroke.finalize();
        }
        preview.set_id(DrawableId::generate());
        Some(preview)
    }

    /// Cancel the current interaction.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    /// Check if a tool interaction is active.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Previewing { .. })
    }

    /// The in-progress preview shape, if any.
    pub fn preview(&self) -> Option<&Shape> {
        match &self.state {
            ToolState::Previewing { preview, .. } => Some(preview),
            ToolState::Idle => None,
        }
    }
}
