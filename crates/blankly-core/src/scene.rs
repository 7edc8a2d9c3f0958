//! The scene controller: committed drawables and the current selection.

use crate::image_decode::{self, ImageDecoder};
use crate::protocol::CanvasState;
use crate::shapes::{Drawable, DrawableId, ImageItem, Shape, TextLabel};
use crate::transform::{self, SurfaceNode};
use kurbo::Point;

/// Borrowed view of an entity in one of the scene's collections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawableRef<'a> {
    Shape(&'a Shape),
    Text(&'a TextLabel),
    Image(&'a ImageItem),
}

impl DrawableRef<'_> {
    pub fn id(&self) -> &DrawableId {
        match self {
            DrawableRef::Shape(s) => s.id(),
            DrawableRef::Text(t) => &t.id,
            DrawableRef::Image(i) => &i.id,
        }
    }

    pub fn to_drawable(&self) -> Drawable {
        match *self {
            DrawableRef::Shape(s) => Drawable::Shape(s.clone()),
            DrawableRef::Text(t) => Drawable::Text(t.clone()),
            DrawableRef::Image(i) => Drawable::Image(i.clone()),
        }
    }
}

/// Mutable view of an entity in one of the scene's collections.
#[derive(Debug)]
pub enum DrawableMut<'a> {
    Shape(&'a mut Shape),
    Text(&'a mut TextLabel),
    Image(&'a mut ImageItem),
}

impl DrawableMut<'_> {
    fn set_position(&mut self, position: Point) {
        match self {
            DrawableMut::Shape(s) => s.set_position(position),
            DrawableMut::Text(t) => {
                t.x = position.x;
                t.y = position.y;
            }
            DrawableMut::Image(i) => {
                i.x = position.x;
                i.y = position.y;
            }
        }
    }

    fn to_drawable(&self) -> Drawable {
        match self {
            DrawableMut::Shape(s) => Drawable::Shape((**s).clone()),
            DrawableMut::Text(t) => Drawable::Text((**t).clone()),
            DrawableMut::Image(i) => Drawable::Image((**i).clone()),
        }
    }
}

/// Committed entities, held in three ordered collections, plus the single
/// selected id.
///
/// An entity is draggable only while dragging is enabled (the selection tool
/// is active) and it is the current selection; every mutator keeps the
/// `draggable` flags in line with that rule.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: Vec<Shape>,
    texts: Vec<TextLabel>,
    images: Vec<ImageItem>,
    selection: Option<DrawableId>,
    drag_enabled: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn texts(&self) -> &[TextLabel] {
        &self.texts
    }

    pub fn images(&self) -> &[ImageItem] {
        &self.images
    }

    /// Total number of committed entities.
    pub fn len(&self) -> usize {
        self.shapes.len() + self.texts.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entity and the selection.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.texts.clear();
        self.images.clear();
        self.selection = None;
    }

    /// Look up an entity across all three collections.
    pub fn find(&self, id: &DrawableId) -> Option<DrawableRef<'_>> {
        if let Some(shape) = self.shapes.iter().find(|s| s.id() == id) {
            return Some(DrawableRef::Shape(shape));
        }
        if let Some(text) = self.texts.iter().find(|t| &t.id == id) {
            return Some(DrawableRef::Text(text));
        }
        self.images.iter().find(|i| &i.id == id).map(DrawableRef::Image)
    }

    pub fn contains(&self, id: &DrawableId) -> bool {
        self.find(id).is_some()
    }

    fn find_mut(&mut self, id: &DrawableId) -> Option<DrawableMut<'_>> {
        if let Some(shape) = self.shapes.iter_mut().find(|s| s.id() == id) {
            return Some(DrawableMut::Shape(shape));
        }
        if let Some(text) = self.texts.iter_mut().find(|t| &t.id == id) {
            return Some(DrawableMut::Text(text));
        }
        self.images.iter_mut().find(|i| &i.id == id).map(DrawableMut::Image)
    }

    /// Append a locally committed entity.
    ///
    /// Returns `false` without touching the scene if the entity still carries
    /// the preview id or its id is already taken.
    pub fn commit(&mut self, drawable: Drawable) -> bool {
        if drawable.id().is_preview() {
            log::warn!("Refusing to commit an entity with the preview id");
            return false;
        }
        if self.contains(drawable.id()) {
            log::warn!("Refusing to commit duplicate id {}", drawable.id());
            return false;
        }
        self.push(drawable);
        true
    }

    /// Add an image to the image collection.
    pub fn add_image(&mut self, image: ImageItem) -> bool {
        self.commit(Drawable::Image(image))
    }

    fn push(&mut self, mut drawable: Drawable) {
        let draggable = self.drag_enabled && self.selection.as_ref() == Some(drawable.id());
        drawable.set_draggable(draggable);
        match drawable {
            Drawable::Shape(s) => self.shapes.push(s),
            Drawable::Text(t) => self.texts.push(t),
            Drawable::Image(i) => self.images.push(i),
        }
    }

    /// Apply an entity relayed from a peer: replace by id when the owning
    /// collection already has it, otherwise append.
    pub fn apply_remote(&mut self, drawable: Drawable) {
        if drawable.id().is_preview() {
            log::warn!("Ignoring relayed entity with the preview id");
            return;
        }
        let draggable = self.drag_enabled && self.selection.as_ref() == Some(drawable.id());
        let mut drawable = drawable;
        drawable.set_draggable(draggable);

        let id = drawable.id().clone();
        // Ids are unique across all three collections.
        let before = self.len();
        match &drawable {
            Drawable::Shape(_) => {
                self.texts.retain(|t| t.id != id);
                self.images.retain(|i| i.id != id);
            }
            Drawable::Text(_) => {
                self.shapes.retain(|s| s.id() != &id);
                self.images.retain(|i| i.id != id);
            }
            Drawable::Image(_) => {
                self.shapes.retain(|s| s.id() != &id);
                self.texts.retain(|t| t.id != id);
            }
        }
        let moved = self.len() < before;
        let replaced = match drawable {
            Drawable::Shape(shape) => replace_or_push(&mut self.shapes, shape, |s| s.id() == &id),
            Drawable::Text(text) => replace_or_push(&mut self.texts, text, |t| t.id == id),
            Drawable::Image(image) => replace_or_push(&mut self.images, image, |i| i.id == id),
        } || moved;
        log::debug!(
            "Applied remote entity {} ({})",
            id,
            if replaced { "replaced" } else { "appended" }
        );
    }

    /// Move an entity after a drag gesture. Returns the updated entity, or
    /// `None` if the id is no longer present.
    pub fn move_to(&mut self, id: &DrawableId, position: Point) -> Option<Drawable> {
        let Some(mut target) = self.find_mut(id) else {
            log::warn!("Dropping drag update for unknown entity {}", id);
            return None;
        };
        target.set_position(position);
        Some(target.to_drawable())
    }

    /// Fold a finished resize/rotate gesture back into the entity geometry.
    /// Returns the updated entity, or `None` if the id is no longer present.
    pub fn transform(&mut self, id: &DrawableId, node: &mut dyn SurfaceNode) -> Option<Drawable> {
        let Some(mut target) = self.find_mut(id) else {
            log::warn!("Dropping transform update for unknown entity {}", id);
            return None;
        };
        transform::reconcile_transform(&mut target, node);
        Some(target.to_drawable())
    }

    /// Remove an entity from whichever collection owns it, clearing the
    /// selection if it was selected.
    pub fn erase(&mut self, id: &DrawableId) -> Option<Drawable> {
        let removed = if let Some(pos) = self.shapes.iter().position(|s| s.id() == id) {
            Drawable::Shape(self.shapes.remove(pos))
        } else if let Some(pos) = self.texts.iter().position(|t| &t.id == id) {
            Drawable::Text(self.texts.remove(pos))
        } else if let Some(pos) = self.images.iter().position(|i| &i.id == id) {
            Drawable::Image(self.images.remove(pos))
        } else {
            return None;
        };

        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        Some(removed)
    }

    pub fn selection(&self) -> Option<&DrawableId> {
        self.selection.as_ref()
    }

    pub fn is_selected(&self, id: &DrawableId) -> bool {
        self.selection.as_ref() == Some(id)
    }

    /// Make `id` the sole selection. Unknown ids leave the selection as is.
    pub fn select(&mut self, id: &DrawableId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selection = Some(id.clone());
        self.sync_draggable();
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.sync_draggable();
    }

    /// Enable or disable dragging of the selected entity.
    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.drag_enabled = enabled;
        self.sync_draggable();
    }

    fn sync_draggable(&mut self) {
        let selected = if self.drag_enabled { self.selection.clone() } else { None };
        let is_selected = |id: &DrawableId| selected.as_ref() == Some(id);
        for shape in &mut self.shapes {
            let draggable = is_selected(shape.id());
            shape.set_draggable(draggable);
        }
        for text in &mut self.texts {
            text.draggable = is_selected(&text.id);
        }
        for image in &mut self.images {
            image.draggable = is_selected(&image.id);
        }
    }

    /// Capture the scene as a serializable state. Draggable flags are not
    /// carried over.
    pub fn snapshot(&self, timestamp: u64) -> CanvasState {
        let mut state = CanvasState {
            shapes: self.shapes.clone(),
            text_array: self.texts.clone(),
            konva_images: self.images.clone(),
            timestamp,
        };
        state.shapes.iter_mut().for_each(|s| s.set_draggable(false));
        state.text_array.iter_mut().for_each(|t| t.draggable = false);
        state.konva_images.iter_mut().for_each(|i| i.draggable = false);
        state
    }

    /// Replace the whole scene with `state`, decoding images and dropping
    /// those that fail. Clears the selection.
    pub fn restore(&mut self, state: CanvasState, decoder: &dyn ImageDecoder) {
        self.clear();
        let images = image_decode::rehydrate(state.konva_images, decoder);
        let drawables = state
            .shapes
            .into_iter()
            .map(Drawable::Shape)
            .chain(state.text_array.into_iter().map(Drawable::Text))
            .chain(images.into_iter().map(Drawable::Image));
        for drawable in drawables {
            if !self.commit(drawable) {
                log::warn!("Skipped an entity while restoring the scene");
            }
        }
        log::info!("Restored scene with {} entities", self.len());
    }
}

fn replace_or_push<T>(items: &mut Vec<T>, item: T, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter_mut().find(|existing| matches(existing)) {
        Some(existing) => {
            *existing = item;
            true
        }
        None => {
            items.push(item);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_decode::{DataUrlDecoder, tests::png_data_url};
    use crate::shapes::{Ellipse, Rectangle, Stroke};
    use crate::transform::NodeState;
    use kurbo::{Size, Vec2};

    fn committed(shape: Shape) -> Drawable {
        let mut shape = shape;
        shape.set_id(DrawableId::generate());
        Drawable::Shape(shape)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Drawable {
        committed(Shape::Rect(Rectangle::from_corners(
            Point::new(x0, y0),
            Point::new(x1, y1),
        )))
    }

    #[test]
    fn test_commit_rejects_preview_id() {
        let mut scene = Scene::new();
        let preview = Drawable::Shape(Shape::Rect(Rectangle::new(Point::ZERO, 1.0, 1.0)));
        assert!(!scene.commit(preview));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_commit_routes_to_collections() {
        let mut scene = Scene::new();
        scene.commit(rect(0.0, 0.0, 1.0, 1.0));
        scene.commit(Drawable::Text(TextLabel::new(Point::ZERO, "a".into())));
        scene.commit(Drawable::Image(ImageItem::new(
            "x.png",
            "data:",
            Point::ZERO,
            Size::new(1.0, 1.0),
        )));
        assert_eq!(scene.shapes().len(), 1);
        assert_eq!(scene.texts().len(), 1);
        assert_eq!(scene.images().len(), 1);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut scene = Scene::new();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(2.0, 2.0, 3.0, 3.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        scene.commit(a);
        scene.commit(b);
        scene.set_drag_enabled(true);

        scene.select(&a_id);
        scene.select(&b_id);
        assert!(!scene.is_selected(&a_id));
        assert!(scene.is_selected(&b_id));

        let draggable: Vec<bool> = scene.shapes().iter().map(Shape::draggable).collect();
        assert_eq!(draggable, vec![false, true]);
    }

    #[test]
    fn test_select_unknown_id_keeps_selection() {
        let mut scene = Scene::new();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let a_id = a.id().clone();
        scene.commit(a);
        scene.select(&a_id);
        assert!(!scene.select(&DrawableId::from("missing")));
        assert!(scene.is_selected(&a_id));
    }

    #[test]
    fn test_draggable_follows_drag_enabled() {
        let mut scene = Scene::new();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let a_id = a.id().clone();
        scene.commit(a);
        scene.select(&a_id);
        assert!(!scene.shapes()[0].draggable());
        scene.set_drag_enabled(true);
        assert!(scene.shapes()[0].draggable());
        scene.set_drag_enabled(false);
        assert!(!scene.shapes()[0].draggable());
    }

    #[test]
    fn test_erase_removes_from_one_collection_and_clears_selection() {
        let mut scene = Scene::new();
        let text = TextLabel::new(Point::ZERO, "note".into());
        let text_id = text.id.clone();
        scene.commit(rect(0.0, 0.0, 1.0, 1.0));
        scene.commit(Drawable::Text(text));
        scene.select(&text_id);

        let removed = scene.erase(&text_id).unwrap();
        assert!(matches!(removed, Drawable::Text(_)));
        assert_eq!(scene.shapes().len(), 1);
        assert!(scene.texts().is_empty());
        assert_eq!(scene.selection(), None);
        assert!(scene.erase(&text_id).is_none());
    }

    #[test]
    fn test_erase_other_keeps_selection() {
        let mut scene = Scene::new();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(2.0, 2.0, 3.0, 3.0);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        scene.commit(a);
        scene.commit(b);
        scene.select(&a_id);
        scene.erase(&b_id);
        assert!(scene.is_selected(&a_id));
    }

    #[test]
    fn test_apply_remote_replaces_or_appends() {
        let mut scene = Scene::new();
        let original = rect(0.0, 0.0, 10.0, 10.0);
        let id = original.id().clone();
        scene.apply_remote(original.clone());
        assert_eq!(scene.len(), 1);

        let Drawable::Shape(Shape::Rect(mut moved)) = original else {
            unreachable!()
        };
        moved.x = 99.0;
        scene.apply_remote(Drawable::Shape(Shape::Rect(moved)));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.find(&id).unwrap().to_drawable().kind(), crate::shapes::DrawableKind::Rect);
        let Some(DrawableRef::Shape(Shape::Rect(r))) = scene.find(&id) else {
            panic!("rect missing");
        };
        assert_eq!(r.x, 99.0);
    }

    #[test]
    fn test_apply_remote_under_another_kind_keeps_one_entry() {
        let mut scene = Scene::new();
        let original = rect(0.0, 0.0, 10.0, 10.0);
        let id = original.id().clone();
        scene.apply_remote(original);

        let mut label = TextLabel::new(Point::ZERO, "was a rect".into());
        label.id = id.clone();
        scene.apply_remote(Drawable::Text(label));

        assert_eq!(scene.len(), 1);
        assert!(scene.shapes().is_empty());
        assert_eq!(scene.texts()[0].id, id);
    }

    #[test]
    fn test_apply_remote_arrives_not_draggable() {
        let mut scene = Scene::new();
        let mut shape = Stroke::new(vec![0.0, 0.0, 1.0, 1.0]);
        shape.id = DrawableId::generate();
        shape.draggable = true;
        scene.apply_remote(Drawable::Shape(Shape::Line(shape)));
        assert!(!scene.shapes()[0].draggable());
    }

    #[test]
    fn test_move_to_updates_position() {
        let mut scene = Scene::new();
        let ellipse = committed(Shape::Ellipse(Ellipse::new(Point::ZERO, 3.0, 4.0)));
        let id = ellipse.id().clone();
        scene.commit(ellipse);

        let updated = scene.move_to(&id, Point::new(7.0, 8.0)).unwrap();
        let Drawable::Shape(Shape::Ellipse(e)) = updated else {
            panic!("expected ellipse");
        };
        assert_eq!((e.x, e.y), (7.0, 8.0));
        assert!(scene.move_to(&DrawableId::from("gone"), Point::ZERO).is_none());
    }

    #[test]
    fn test_transform_unknown_id_is_dropped() {
        let mut scene = Scene::new();
        let mut node = NodeState::new(Point::ZERO, Vec2::new(2.0, 2.0), 0.0);
        assert!(scene.transform(&DrawableId::from("gone"), &mut node).is_none());
        assert_eq!(node.scale, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut scene = Scene::new();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let a_id = a.id().clone();
        scene.commit(a);
        scene.commit(Drawable::Text(TextLabel::new(Point::ZERO, "t".into())));
        scene.commit(Drawable::Image(ImageItem::new(
            "ok.png",
            png_data_url(2, 2),
            Point::ZERO,
            Size::new(2.0, 2.0),
        )));
        scene.commit(Drawable::Image(ImageItem::new(
            "broken.png",
            "data:image/png;base64,AAAA",
            Point::ZERO,
            Size::new(2.0, 2.0),
        )));
        scene.set_drag_enabled(true);
        scene.select(&a_id);

        let state = scene.snapshot(1234);
        assert_eq!(state.timestamp, 1234);
        assert!(!state.shapes[0].draggable());

        let mut restored = Scene::new();
        restored.restore(state, &DataUrlDecoder);
        assert_eq!(restored.shapes().len(), 1);
        assert_eq!(restored.texts().len(), 1);
        assert_eq!(restored.images().len(), 1);
        assert_eq!(restored.images()[0].name, "ok.png");
        assert!(restored.images()[0].is_decoded());
        assert_eq!(restored.selection(), None);
    }
}
