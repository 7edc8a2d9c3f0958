//! Collaboration client for the room relay.
//!
//! The relay never stores scenes. Local commits and updates are broadcast
//! as `draw` frames and applied by peers as whole-entity replace-or-append;
//! a client joining late asks the room for its scene and adopts the first
//! snapshot it receives. Later snapshots for the same join are ignored.

use crate::image_decode::{self, DecodeOutcome, ImageDecoder};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::scene::Scene;
use crate::shapes::Drawable;
use crate::sync::SyncEvent;

/// Room membership, outgoing frame queue and incoming frame handling.
#[derive(Debug, Default)]
pub struct CollaborationManager {
    /// Room this client addresses its frames to.
    current_room: Option<String>,
    /// Connection id assigned by the relay.
    user_id: Option<String>,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
    /// Set by `join_room` until the first scene snapshot is adopted.
    awaiting_snapshot: bool,
}

impl CollaborationManager {
    /// Create a new collaboration manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current room ID.
    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    /// Check if we're in a room.
    pub fn is_in_room(&self) -> bool {
        self.current_room.is_some()
    }

    /// Connection id the relay assigned us, once the join is confirmed.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Join a room and ask its members for their current scene.
    pub fn join_room(&mut self, room_id: &str) {
        log::info!("Joining room {}", room_id);
        self.current_room = Some(room_id.to_string());
        self.user_id = None;
        self.awaiting_snapshot = true;
        self.queue(&ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
        });
        self.queue(&ClientMessage::RequestCanvasState {
            room_id: room_id.to_string(),
        });
    }

    /// Forget the room locally. The relay drops membership on disconnect.
    pub fn leave_room(&mut self) {
        self.current_room = None;
        self.user_id = None;
        self.awaiting_snapshot = false;
    }

    /// Whether a requested scene snapshot has yet to arrive.
    pub fn is_awaiting_snapshot(&self) -> bool {
        self.awaiting_snapshot
    }

    /// Queue a `draw` frame for a committed or updated entity. Does nothing
    /// outside a room.
    pub fn broadcast(&mut self, drawable: &Drawable) {
        let Some(room_id) = self.current_room.clone() else {
            return;
        };
        self.queue(&ClientMessage::Draw {
            room_id,
            shape: drawable.clone(),
        });
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    /// Check if there are pending outgoing messages.
    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    fn queue(&mut self, msg: &ClientMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => self.outgoing.push(json),
            Err(e) => log::warn!("Failed to encode relay message: {}", e),
        }
    }

    /// Handle an incoming relay frame, applying it to `scene`.
    /// Returns a SyncEvent describing what happened.
    pub fn handle_message(
        &mut self,
        json: &str,
        scene: &mut Scene,
        decoder: &dyn ImageDecoder,
    ) -> Option<SyncEvent> {
        let msg: ServerMessage = match serde_json::from_str(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Ignoring unparseable relay message: {}", e);
                return None;
            }
        };

        match msg {
            ServerMessage::Joined { room_id, user_id } => {
                log::info!("Joined room {} as {}", room_id, user_id);
                self.user_id = Some(user_id.clone());
                Some(SyncEvent::JoinedRoom { room_id, user_id })
            }
            ServerMessage::UserJoined { user_id } => Some(SyncEvent::PeerJoined { user_id }),
            ServerMessage::RequestCanvasState { requester_id } => {
                log::debug!("Sending scene to {}", requester_id);
                self.queue(&ClientMessage::SendCanvasState {
                    requester_id: requester_id.clone(),
                    canvas_state: scene.snapshot(crate::epoch_millis()),
                });
                Some(SyncEvent::SceneRequested { requester_id })
            }
            ServerMessage::Draw { shape, .. } => {
                let shape = match shape {
                    Drawable::Image(item) => match image_decode::decode_item(item, decoder) {
                        DecodeOutcome::Loaded(item) => Drawable::Image(item),
                        DecodeOutcome::Failed { id, error } => {
                            log::warn!("Dropping relayed image {}: {}", id, error);
                            return None;
                        }
                    },
                    other => other,
                };
                let id = shape.id().clone();
                scene.apply_remote(shape);
                Some(SyncEvent::RemoteDraw { id })
            }
            ServerMessage::ReceiveCanvasState { canvas_state } => {
                if !self.awaiting_snapshot {
                    log::debug!("Ignoring scene snapshot nothing is waiting for");
                    return None;
                }
                self.awaiting_snapshot = false;
                scene.restore(canvas_state, decoder);
                Some(SyncEvent::SceneReceived {
                    entities: scene.len(),
                })
            }
            ServerMessage::Error { message } => {
                log::warn!("Relay error: {}", message);
                Some(SyncEvent::Error { message })
            }
        }
    }
}
