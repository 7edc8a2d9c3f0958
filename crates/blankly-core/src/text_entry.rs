//! Floating text-entry surface used by the text tool.

use crate::shapes::{DEFAULT_FONT_SIZE, TextLabel};
use crate::viewport::Viewport;
use kurbo::Point;

/// Keys the entry surface reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKey {
    /// Enter; with `newline` set (shift held) it inserts a line break instead
    /// of committing.
    Enter { newline: bool },
    Other,
}

/// Entry surface state: hidden, or open at a scene position with the text
/// typed so far.
#[derive(Debug, Clone, Default)]
pub struct TextEntry {
    anchor: Option<Point>,
    content: String,
}

impl TextEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the surface at a scene position. An already open surface is
    /// committed first, and its label returned.
    pub fn open_at(&mut self, scene_point: Point) -> Option<TextLabel> {
        let committed = self.commit();
        self.anchor = Some(scene_point);
        committed
    }

    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }

    /// Scene position the surface is anchored to.
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the typed content. Ignored while hidden.
    pub fn set_content(&mut self, content: impl Into<String>) {
        if self.is_open() {
            self.content = content.into();
        }
    }

    /// Handle a key press. Enter without the newline modifier commits.
    pub fn key_down(&mut self, key: EntryKey) -> Option<TextLabel> {
        match key {
            EntryKey::Enter { newline: false } => self.commit(),
            EntryKey::Enter { newline: true } => {
                if self.is_open() {
                    self.content.push('\n');
                }
                None
            }
            EntryKey::Other => None,
        }
    }

    /// Focus loss commits.
    pub fn blur(&mut self) -> Option<TextLabel> {
        self.commit()
    }

    /// Hide the surface, producing a label when the trimmed content is
    /// non-empty.
    fn commit(&mut self) -> Option<TextLabel> {
        let anchor = self.anchor.take()?;
        let content = std::mem::take(&mut self.content);
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(TextLabel::new(anchor, trimmed.to_string()))
    }

    /// Where to place the surface on screen so it lines up with the canvas.
    pub fn screen_position(&self, viewport: &Viewport) -> Option<Point> {
        self.anchor.map(|anchor| viewport.to_screen(anchor))
    }

    /// Font size in screen pixels for the surface.
    pub fn screen_font_size(viewport: &Viewport) -> f64 {
        DEFAULT_FONT_SIZE * viewport.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    #[test]
    fn test_enter_commits_trimmed_text() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::new(10.0, 20.0));
        entry.set_content("  hello  ");
        let label = entry.key_down(EntryKey::Enter { newline: false }).unwrap();
        assert_eq!(label.text, "hello");
        assert_eq!((label.x, label.y), (10.0, 20.0));
        assert!(!entry.is_open());
        assert_eq!(entry.content(), "");
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::ZERO);
        entry.set_content("a");
        assert!(entry.key_down(EntryKey::Enter { newline: true }).is_none());
        assert!(entry.is_open());
        assert_eq!(entry.content(), "a\n");
    }

    #[test]
    fn test_blank_content_commits_nothing() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::ZERO);
        entry.set_content("   \n ");
        assert!(entry.blur().is_none());
        assert!(!entry.is_open());
    }

    #[test]
    fn test_blur_commits() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::new(1.0, 1.0));
        entry.set_content("note");
        assert_eq!(entry.blur().unwrap().text, "note");
    }

    #[test]
    fn test_reopen_commits_previous() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::new(1.0, 1.0));
        entry.set_content("first");
        let label = entry.open_at(Point::new(2.0, 2.0)).unwrap();
        assert_eq!(label.text, "first");
        assert_eq!(entry.anchor(), Some(Point::new(2.0, 2.0)));
        assert_eq!(entry.content(), "");
    }

    #[test]
    fn test_hidden_ignores_input() {
        let mut entry = TextEntry::new();
        entry.set_content("x");
        assert_eq!(entry.content(), "");
        assert!(entry.key_down(EntryKey::Enter { newline: false }).is_none());
    }

    #[test]
    fn test_screen_position_follows_viewport() {
        let mut entry = TextEntry::new();
        entry.open_at(Point::new(10.0, 10.0));
        let viewport = Viewport {
            scale: 2.0,
            offset: Vec2::new(5.0, -5.0),
        };
        assert_eq!(entry.screen_position(&viewport), Some(Point::new(25.0, 15.0)));
        assert_eq!(TextEntry::screen_font_size(&viewport), 48.0);
    }
}
