//! Blankly Core Library
//!
//! Scene model, tools, viewport and collaboration client for the Blankly
//! whiteboard. Rendering and input plumbing live with the host.

pub mod canvas;
pub mod collaboration;
pub mod image_decode;
pub mod protocol;
pub mod scene;
pub mod share;
pub mod shapes;
pub mod storage;
pub mod sync;
pub mod text_entry;
pub mod tools;
pub mod transform;
pub mod viewport;

pub use canvas::{Canvas, CanvasEvent, PointerTarget};
pub use collaboration::CollaborationManager;
pub use image_decode::{DataUrlDecoder, DecodeError, DecodeOutcome, DecodedImage, ImageDecoder};
pub use protocol::{CanvasState, ClientMessage, ServerMessage};
pub use scene::{DrawableRef, Scene};
pub use share::{RedeemOutcome, ShareCodeResponse};
pub use shapes::{Color, Drawable, DrawableId, DrawableKind, Shape};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, Storage, StorageError};
pub use sync::{ConnectionState, NativeWebSocket, SyncEvent};
pub use text_entry::{EntryKey, TextEntry};
pub use tools::{ToolKind, ToolManager, ToolState};
pub use transform::{NodeState, SurfaceNode};
pub use viewport::Viewport;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
