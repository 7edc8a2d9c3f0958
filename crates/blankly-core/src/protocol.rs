//! Relay wire messages and the serialized scene state.
//!
//! Frames are JSON objects tagged by a snake_case `type` field, with
//! camelCase payload fields.

use crate::shapes::{Drawable, ImageItem, Shape, TextLabel};
use serde::{Deserialize, Serialize};

/// Serialized scene: the payload of a late-join bootstrap and of the local
/// snapshot store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub text_array: Vec<TextLabel>,
    #[serde(default)]
    pub konva_images: Vec<ImageItem>,
    /// Epoch milliseconds of the capture.
    #[serde(default)]
    pub timestamp: u64,
}

impl CanvasState {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.text_array.is_empty() && self.konva_images.is_empty()
    }
}

/// Messages sent to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room, leaving any previous one.
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    /// Ask the other members for their current scene.
    #[serde(rename_all = "camelCase")]
    RequestCanvasState { room_id: String },
    /// A committed or updated entity.
    #[serde(rename_all = "camelCase")]
    Draw { room_id: String, shape: Drawable },
    /// Answer to a scene request, delivered only to the requester.
    #[serde(rename_all = "camelCase")]
    SendCanvasState {
        requester_id: String,
        canvas_state: CanvasState,
    },
}

/// Messages received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms a join; `user_id` is this connection's id.
    #[serde(rename_all = "camelCase")]
    Joined { room_id: String, user_id: String },
    /// Another connection joined the room.
    #[serde(rename_all = "camelCase")]
    UserJoined { user_id: String },
    /// A member wants the current scene.
    #[serde(rename_all = "camelCase")]
    RequestCanvasState { requester_id: String },
    /// An entity drawn or updated by a peer.
    #[serde(rename_all = "camelCase")]
    Draw { room_id: String, shape: Drawable },
    /// Scene snapshot answering our request.
    #[serde(rename_all = "camelCase")]
    ReceiveCanvasState { canvas_state: CanvasState },
    /// Error message
    Error { message: String },
}
