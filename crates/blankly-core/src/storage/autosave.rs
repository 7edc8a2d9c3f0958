//! Debounced saving of the scene.
//!
//! Bursts of mutations coalesce into one write: every mutation restarts the
//! quiet-period timer, and the snapshot is written once the timer runs out
//! with no further mutation.

use crate::protocol::CanvasState;
use crate::scene::Scene;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Quiet period after the last mutation before the scene is saved.
pub const AUTOSAVE_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Key the scene snapshot is stored under.
pub const STORAGE_KEY: &str = "canvasStorageState";

/// Manages debounced scene persistence.
pub struct AutoSaveManager<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    /// Time without mutations required before saving.
    quiet_period: Duration,
    /// When the pending save fires, if a mutation is waiting to be saved.
    deadline: Option<Instant>,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            quiet_period: AUTOSAVE_QUIET_PERIOD,
            deadline: None,
        }
    }

    /// Set the quiet period.
    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.quiet_period = quiet_period;
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record a mutation at `now`, restarting the timer.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Check if the scene has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the quiet period has elapsed since the last mutation.
    pub fn should_save(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Save the scene if the timer has run out. Failures are logged and
    /// absorbed. Returns true if a save was performed.
    pub async fn poll(&mut self, now: Instant, scene: &Scene) -> bool {
        if !self.should_save(now) {
            return false;
        }
        self.deadline = None;
        match self.save(&scene.snapshot(crate::epoch_millis())).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Autosave failed: {}", e);
                false
            }
        }
    }

    /// Save a snapshot immediately, stamping it with the current time.
    pub async fn save(&mut self, state: &CanvasState) -> StorageResult<()> {
        let mut state = state.clone();
        state.timestamp = crate::epoch_millis();
        self.storage.save(STORAGE_KEY, &state).await?;
        self.deadline = None;
        log::debug!("Saved scene snapshot ({} shapes)", state.shapes.len());
        Ok(())
    }

    /// Load the last saved snapshot. A missing snapshot or an unavailable
    /// store yields `None`.
    pub async fn load_last(&mut self) -> Option<CanvasState> {
        match self.storage.load(STORAGE_KEY).await {
            Ok(state) => {
                self.deadline = None;
                Some(state)
            }
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("Failed to load saved scene: {}", e);
                None
            }
        }
    }

    /// Remove the saved snapshot.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.deadline = None;
        self.storage.clear(STORAGE_KEY).await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Drawable, DrawableId, Rectangle, Shape};
    use crate::storage::{BoxFuture, MemoryStorage, block_on};
    use kurbo::Point;

    fn scene_with_rect() -> Scene {
        let mut rect = Rectangle::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        rect.id = DrawableId::generate();
        let mut scene = Scene::new();
        scene.commit(Drawable::Shape(Shape::Rect(rect)));
        scene
    }

    /// Storage whose every operation fails.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn save(&self, _: &str, _: &CanvasState) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }
        fn load(&self, _: &str) -> BoxFuture<'_, StorageResult<CanvasState>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }
        fn clear(&self, _: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }
        fn exists(&self, _: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Err(StorageError::Io("disk gone".into())) })
        }
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save(Instant::now()));
        assert_eq!(manager.quiet_period(), Duration::from_millis(1000));
    }

    #[test]
    fn test_waits_for_quiet_period() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let t0 = Instant::now();
        manager.mark_dirty(t0);
        assert!(!manager.should_save(t0 + Duration::from_millis(999)));
        assert!(manager.should_save(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_new_mutation_restarts_timer() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        let scene = scene_with_rect();
        let t0 = Instant::now();

        manager.mark_dirty(t0);
        manager.mark_dirty(t0 + Duration::from_millis(800));
        assert!(!block_on(manager.poll(t0 + Duration::from_millis(1200), &scene)));
        assert!(!block_on(storage.exists(STORAGE_KEY)).unwrap());

        assert!(block_on(manager.poll(t0 + Duration::from_millis(1800), &scene)));
        assert!(!manager.is_dirty());
        assert!(block_on(storage.exists(STORAGE_KEY)).unwrap());

        // One write per quiet period.
        assert!(!block_on(manager.poll(t0 + Duration::from_millis(5000), &scene)));
    }

    #[test]
    fn test_save_stamps_timestamp() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let state = CanvasState::default();
        block_on(manager.save(&state)).unwrap();
        let loaded = block_on(manager.load_last()).unwrap();
        assert!(loaded.timestamp > 0);
    }

    #[test]
    fn test_autosave_load_last() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage);
        let scene = scene_with_rect();
        let t0 = Instant::now();
        manager.mark_dirty(t0);
        block_on(manager.poll(t0 + AUTOSAVE_QUIET_PERIOD, &scene));

        let mut manager2 = AutoSaveManager::new(manager.storage().clone());
        let loaded = block_on(manager2.load_last()).expect("Should load last scene");
        assert_eq!(loaded.shapes, scene.shapes());
    }

    #[test]
    fn test_load_last_empty_store() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(block_on(manager.load_last()).is_none());
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        block_on(manager.save(&CanvasState::default())).unwrap();
        block_on(manager.clear()).unwrap();
        assert!(block_on(manager.load_last()).is_none());
    }

    #[test]
    fn test_store_failures_are_absorbed() {
        let mut manager = AutoSaveManager::new(Arc::new(BrokenStorage));
        let scene = scene_with_rect();
        let t0 = Instant::now();
        manager.mark_dirty(t0);
        assert!(!block_on(manager.poll(t0 + AUTOSAVE_QUIET_PERIOD, &scene)));
        assert!(!manager.is_dirty());
        assert!(block_on(manager.load_last()).is_none());
    }
}
