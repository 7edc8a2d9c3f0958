//! Interaction dispatcher: routes pointer, wheel and keyboard input to the
//! active tool and the scene.
//!
//! The rendering surface resolves what lies under the pointer before calling
//! in here, so an entity click never also reaches the empty-canvas handlers.

use crate::image_decode::{DecodeError, ImageDecoder};
use crate::protocol::CanvasState;
use crate::scene::Scene;
use crate::shapes::{Drawable, DrawableId, ImageItem, TextLabel};
use crate::text_entry::{EntryKey, TextEntry};
use crate::tools::{ToolKind, ToolManager};
use crate::transform::SurfaceNode;
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use std::sync::Arc;

/// What the pointer landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Bare canvas background.
    Empty,
    /// The topmost entity under the pointer.
    Entity(DrawableId),
}

/// Something the canvas did that the host may want to react to.
#[derive(Debug, Clone)]
pub enum CanvasEvent {
    /// A new entity entered the scene.
    Committed(Drawable),
    /// An existing entity was moved or transformed.
    Updated(Drawable),
    /// An entity was removed.
    Erased(Drawable),
    SelectionChanged(Option<DrawableId>),
}

impl CanvasEvent {
    /// The entity to relay to peers, if this event produces a `draw` frame.
    pub fn broadcastable(&self) -> Option<&Drawable> {
        match self {
            CanvasEvent::Committed(d) | CanvasEvent::Updated(d) => Some(d),
            CanvasEvent::Erased(_) | CanvasEvent::SelectionChanged(_) => None,
        }
    }

    /// Whether the scene content changed and should be saved.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, CanvasEvent::SelectionChanged(_))
    }
}

/// The whiteboard as seen by one user.
#[derive(Debug, Default)]
pub struct Canvas {
    pub scene: Scene,
    pub tools: ToolManager,
    pub viewport: Viewport,
    pub text_entry: TextEntry,
    /// Size of the rendering surface in screen pixels.
    pub viewport_size: Size,
    events: Vec<CanvasEvent>,
}

impl Canvas {
    pub fn new() -> Self {
        let mut canvas = Self::default();
        canvas.scene.set_drag_enabled(true);
        canvas
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    /// Switch tools. Any preview is dropped without committing, and an open
    /// text entry is committed as if it lost focus.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if let Some(label) = self.text_entry.blur() {
            self.commit_text(label);
        }
        if self.tools.set_tool(tool) {
            log::debug!("Abandoned preview on switch to {:?}", tool);
        }
        self.scene.set_drag_enabled(tool == ToolKind::Select);
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    /// Pointer pressed at `screen`. `None` means the surface could not
    /// resolve a position and the press is ignored.
    pub fn pointer_down(&mut self, screen: Option<Point>, target: PointerTarget) {
        let Some(screen) = screen else {
            return;
        };
        let point = self.viewport.to_scene(screen);
        let tool = self.tools.current_tool;

        match (tool, target) {
            (ToolKind::Select, PointerTarget::Entity(id)) => {
                if !self.scene.is_selected(&id) && self.scene.select(&id) {
                    self.events.push(CanvasEvent::SelectionChanged(Some(id)));
                }
            }
            (ToolKind::Select, PointerTarget::Empty) => {
                if self.scene.selection().is_some() {
                    self.scene.clear_selection();
                    self.events.push(CanvasEvent::SelectionChanged(None));
                }
            }
            (ToolKind::Eraser, PointerTarget::Entity(id)) => {
                let was_selected = self.scene.is_selected(&id);
                if let Some(removed) = self.scene.erase(&id) {
                    log::debug!("Erased {}", id);
                    self.events.push(CanvasEvent::Erased(removed));
                    if was_selected {
                        self.events.push(CanvasEvent::SelectionChanged(None));
                    }
                }
            }
            (ToolKind::Text, PointerTarget::Empty) => {
                if let Some(label) = self.text_entry.open_at(point) {
                    self.commit_text(label);
                }
            }
            (tool, _) if tool.is_drawing() => {
                self.tools.begin(point);
            }
            _ => {}
        }
    }

    /// Pointer moved to `screen` while a gesture may be in progress.
    pub fn pointer_move(&mut self, screen: Option<Point>) {
        let Some(screen) = screen else {
            return;
        };
        if self.tools.is_active() {
            let point = self.viewport.to_scene(screen);
            self.tools.update(point);
        }
    }

    /// Pointer released. Commits the preview, if there is one.
    pub fn pointer_up(&mut self) {
        let Some(shape) = self.tools.end() else {
            return;
        };
        let drawable = Drawable::Shape(shape);
        if self.scene.commit(drawable.clone()) {
            self.events.push(CanvasEvent::Committed(drawable));
        }
    }

    /// Hand-tool drag finished with the stage at `offset`.
    pub fn pan_end(&mut self, offset: Vec2) {
        if self.tools.current_tool == ToolKind::Hand {
            self.viewport.pan_to(offset);
        }
    }

    /// One wheel step at `pointer` (screen space).
    pub fn wheel(&mut self, pointer: Point, delta_y: f64) {
        self.viewport.wheel(pointer, delta_y);
    }

    /// An entity was dragged to `position` (scene space).
    pub fn drag_end(&mut self, id: &DrawableId, position: Point) {
        if let Some(updated) = self.scene.move_to(id, position) {
            self.events.push(CanvasEvent::Updated(updated));
        }
    }

    /// A resize/rotate gesture on `id` finished; `node` holds its result.
    pub fn transform_end(&mut self, id: &DrawableId, node: &mut dyn SurfaceNode) {
        if let Some(updated) = self.scene.transform(id, node) {
            self.events.push(CanvasEvent::Updated(updated));
        }
    }

    pub fn set_text_content(&mut self, content: impl Into<String>) {
        self.text_entry.set_content(content);
    }

    pub fn text_key_down(&mut self, key: EntryKey) {
        if let Some(label) = self.text_entry.key_down(key) {
            self.commit_text(label);
        }
    }

    pub fn text_blur(&mut self) {
        if let Some(label) = self.text_entry.blur() {
            self.commit_text(label);
        }
    }

    /// Screen position for the floating text entry, if it is open.
    pub fn text_entry_screen_position(&self) -> Option<Point> {
        self.text_entry.screen_position(&self.viewport)
    }

    /// Decode `src` and place it in the middle of the visible area, at most
    /// half the viewport in each direction.
    pub fn add_image(
        &mut self,
        name: &str,
        src: &str,
        decoder: &dyn ImageDecoder,
    ) -> Result<DrawableId, DecodeError> {
        let pixels = Arc::new(decoder.decode(src)?);
        let source = Size::new(f64::from(pixels.width), f64::from(pixels.height));
        let max = if self.viewport_size.width <= 0.0 || self.viewport_size.height <= 0.0 {
            source
        } else {
            Size::new(
                self.viewport_size.width * 0.5 / self.viewport.scale,
                self.viewport_size.height * 0.5 / self.viewport.scale,
            )
        };
        let screen_center = Point::new(
            self.viewport_size.width / 2.0,
            self.viewport_size.height / 2.0,
        );
        let center = self.viewport.to_scene(screen_center);

        let item = ImageItem::placed(name, src, pixels, max, center);
        let id = item.id.clone();
        self.commit_image(item);
        Ok(id)
    }

    /// Replace the scene with a saved or received snapshot.
    pub fn restore(&mut self, state: CanvasState, decoder: &dyn ImageDecoder) {
        self.tools.cancel();
        self.scene.restore(state, decoder);
    }

    /// Drain the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    fn commit_text(&mut self, label: TextLabel) {
        let drawable = Drawable::Text(label);
        if self.scene.commit(drawable.clone()) {
            self.events.push(CanvasEvent::Committed(drawable));
        }
    }

    fn commit_image(&mut self, item: ImageItem) -> bool {
        let drawable = Drawable::Image(item);
        let committed = self.scene.commit(drawable.clone());
        if committed {
            self.events.push(CanvasEvent::Committed(drawable));
        }
        committed
    }
}
