//! Room relay.
//!
//! Pure fan-out plus the late-join handshake. Scene payloads are opaque JSON
//! passed through verbatim; the relay never stores or inspects them.
//!
//! ## Protocol
//!
//! Client frames:
//! ```json
//! { "type": "join_room", "roomId": "r" }
//! { "type": "request_canvas_state", "roomId": "r" }
//! { "type": "draw", "roomId": "r", "shape": { ... } }
//! { "type": "send_canvas_state", "requesterId": "<peer>", "canvasState": { ... } }
//! ```

use crate::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A frame sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join a room, leaving any previous one.
    JoinRoom { room_id: String },
    /// Ask the room's other members for their scene.
    RequestCanvasState { room_id: String },
    /// A committed or updated entity.
    Draw { room_id: String, shape: Value },
    /// Answer to a scene request, for one peer only.
    SendCanvasState {
        requester_id: String,
        canvas_state: Value,
    },
}

/// A frame delivered to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Join confirmation, carrying the joiner's connection id.
    Joined { room_id: String, user_id: String },
    UserJoined { user_id: String },
    RequestCanvasState { requester_id: String },
    Draw { room_id: String, shape: Value },
    ReceiveCanvasState { canvas_state: Value },
    Error { message: String },
}

/// Room registry plus the outbound queue of every connection.
///
/// Every frame a connection receives, whether room fan-out or a
/// point-to-point reply, goes through its single queue, so frames from one
/// sender arrive in the order they were relayed.
#[derive(Default)]
pub struct Relay {
    rooms: DashMap<String, HashSet<String>>,
    peers: DashMap<String, mpsc::UnboundedSender<ServerMessage>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return its outbound queue.
    pub fn connect(&self, peer_id: &str) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(peer_id.to_string(), tx);
        rx
    }

    /// Forget a connection and its room membership.
    pub fn disconnect(&self, peer_id: &str, room_id: Option<&str>) {
        if let Some(room_id) = room_id {
            self.leave_room(room_id, peer_id);
        }
        self.peers.remove(peer_id);
    }

    /// Add peer to room
    pub fn join_room(&self, room_id: &str, peer_id: &str) {
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(peer_id.to_string());
    }

    /// Remove peer from room
    pub fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(peer_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(room_id, |_, members| members.is_empty());
            }
        }
    }

    /// Queue `msg` for every member of `room_id` except `from`. Returns how
    /// many members it was queued for.
    pub fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) -> usize {
        let targets: Vec<String> = match self.rooms.get(room_id) {
            Some(members) => members.iter().filter(|id| *id != from).cloned().collect(),
            None => {
                debug!("Dropping frame for empty room {}", room_id);
                return 0;
            }
        };

        targets
            .iter()
            .filter(|target| {
                let queued = self.send_to(target, msg.clone());
                if !queued {
                    warn!("Peer {} gone, frame for room {} dropped", target, room_id);
                }
                queued
            })
            .count()
    }

    /// Deliver to a single connection. Returns false if it is gone.
    pub fn send_to(&self, peer_id: &str, msg: ServerMessage) -> bool {
        self.peers
            .get(peer_id)
            .is_some_and(|tx| tx.send(msg).is_ok())
    }

    pub fn room_size(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |members| members.len())
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode frame: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let relay = &state.relay;
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut outbound = relay.connect(&peer_id);
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                };

                let client_msg = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Invalid message from {}: {}", peer_id, e);
                        relay.send_to(&peer_id, ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        });
                        continue;
                    }
                };

                match client_msg {
                    ClientMessage::JoinRoom { room_id } => {
                        if let Some(old_room) = current_room.take() {
                            relay.leave_room(&old_room, &peer_id);
                        }
                        relay.join_room(&room_id, &peer_id);
                        current_room = Some(room_id.clone());

                        relay.send_to(&peer_id, ServerMessage::Joined {
                            room_id: room_id.clone(),
                            user_id: peer_id.clone(),
                        });
                        relay.broadcast(&room_id, &peer_id, ServerMessage::UserJoined {
                            user_id: peer_id.clone(),
                        });
                        info!("Peer {} joined room {}", peer_id, room_id);
                    }
                    ClientMessage::RequestCanvasState { room_id } => {
                        debug!("Peer {} requests scene of {}", peer_id, room_id);
                        relay.broadcast(&room_id, &peer_id, ServerMessage::RequestCanvasState {
                            requester_id: peer_id.clone(),
                        });
                    }
                    ClientMessage::Draw { room_id, shape } => {
                        relay.broadcast(&room_id, &peer_id, ServerMessage::Draw {
                            room_id: room_id.clone(),
                            shape,
                        });
                    }
                    ClientMessage::SendCanvasState { requester_id, canvas_state } => {
                        if !relay.send_to(&requester_id, ServerMessage::ReceiveCanvasState { canvas_state }) {
                            debug!("Scene for {} dropped, requester gone", requester_id);
                        }
                    }
                }
            }

            Some(frame) = outbound.recv() => {
                if !send_json(&mut sender, &frame).await {
                    break;
                }
            }
        }
    }

    relay.disconnect(&peer_id, current_room.as_deref());
    info!("Connection closed: {}", peer_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_frames_use_wire_names() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "send_canvas_state",
            "requesterId": "p1",
            "canvasState": {"shapes": []},
        }))
        .unwrap();
        assert!(matches!(msg, ClientMessage::SendCanvasState { ref requester_id, .. } if requester_id == "p1"));

        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "join_room", "roomId": "r"})).unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom { ref room_id } if room_id == "r"));
    }

    #[test]
    fn server_frames_use_wire_names() {
        let value = serde_json::to_value(ServerMessage::RequestCanvasState {
            requester_id: "p1".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "request_canvas_state", "requesterId": "p1"}));

        let value = serde_json::to_value(ServerMessage::ReceiveCanvasState {
            canvas_state: json!({"timestamp": 1}),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "receive_canvas_state", "canvasState": {"timestamp": 1}}));
    }

    #[test]
    fn draw_payload_is_opaque() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "draw",
            "roomId": "r",
            "shape": {"anything": [1, 2, 3]},
        }))
        .unwrap();
        let ClientMessage::Draw { shape, .. } = msg else {
            panic!("expected draw");
        };
        assert_eq!(shape, json!({"anything": [1, 2, 3]}));
    }

    #[test]
    fn broadcast_skips_sender() {
        let relay = Relay::new();
        let mut rx_a = relay.connect("a");
        let mut rx_b = relay.connect("b");
        relay.join_room("r", "a");
        relay.join_room("r", "b");
        assert_eq!(relay.room_size("r"), 2);

        let queued = relay.broadcast("r", "b", ServerMessage::UserJoined { user_id: "b".into() });
        assert_eq!(queued, 1);
        assert!(matches!(rx_a.try_recv().unwrap(), ServerMessage::UserJoined { .. }));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn room_frames_and_direct_replies_share_one_queue() {
        let relay = Relay::new();
        let mut rx_a = relay.connect("a");
        let _rx_b = relay.connect("b");
        relay.join_room("r", "a");
        relay.join_room("r", "b");

        relay.send_to("a", ServerMessage::ReceiveCanvasState { canvas_state: json!({"timestamp": 1}) });
        for n in 0..3 {
            relay.broadcast("r", "b", ServerMessage::Draw { room_id: "r".into(), shape: json!({"id": n}) });
        }

        assert!(matches!(rx_a.try_recv().unwrap(), ServerMessage::ReceiveCanvasState { .. }));
        for n in 0..3 {
            let ServerMessage::Draw { shape, .. } = rx_a.try_recv().unwrap() else {
                panic!("expected draw");
            };
            assert_eq!(shape["id"], n);
        }
    }

    #[test]
    fn broadcast_counts_only_live_members() {
        let relay = Relay::new();
        let _rx_a = relay.connect("a");
        relay.join_room("r", "a");
        // Member of the room with no connection behind it.
        relay.join_room("r", "ghost");

        let queued = relay.broadcast("r", "x", ServerMessage::UserJoined { user_id: "x".into() });
        assert_eq!(queued, 1);
    }

    #[test]
    fn empty_rooms_are_removed() {
        let relay = Relay::new();
        relay.join_room("r", "a");
        relay.leave_room("r", "a");
        assert_eq!(relay.room_size("r"), 0);
        // Broadcasting into a missing room is a no-op.
        assert_eq!(relay.broadcast("r", "a", ServerMessage::UserJoined { user_id: "a".into() }), 0);
    }

    #[test]
    fn send_to_is_point_to_point() {
        let relay = Relay::new();
        let mut rx_a = relay.connect("a");
        let mut rx_b = relay.connect("b");

        assert!(relay.send_to("a", ServerMessage::Error { message: "x".into() }));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());

        relay.disconnect("a", None);
        assert!(!relay.send_to("a", ServerMessage::Error { message: "x".into() }));
        assert_eq!(relay.connection_count(), 1);
    }
}
