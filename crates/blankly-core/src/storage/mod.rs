//! Storage abstraction for scene snapshots.

mod autosave;
mod file;
mod memory;

pub use autosave::{AUTOSAVE_QUIET_PERIOD, AutoSaveManager, STORAGE_KEY};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::protocol::CanvasState;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by storage backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key-value store for scene snapshots.
///
/// Callers treat every failure as non-fatal: the scene keeps working in
/// memory when the store is unavailable.
pub trait Storage: Send + Sync {
    /// Save a snapshot under `key`, replacing any previous one.
    fn save(&self, key: &str, state: &CanvasState) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the snapshot stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<CanvasState>>;

    /// Remove the snapshot stored under `key`. Missing keys are not an error.
    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check if a snapshot exists under `key`.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Minimal executor for driving storage futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
