//! Client side of the share-code flow.
//!
//! A host issues a short code that maps to a fresh room id for a limited
//! time; a guest redeems the code to learn the room id. The store on the
//! server is authoritative for expiry; `expires_at` only drives the host's
//! countdown.

use serde::{Deserialize, Serialize};

/// Length of a share code.
pub const SHARE_CODE_LEN: usize = 6;

/// Path of the share endpoint.
pub const SHARE_PATH: &str = "/api/share";

/// Message shown when a code does not resolve to a room.
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired code";

/// Body returned when a code is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCodeResponse {
    pub share_code: String,
    pub room_id: String,
    /// Epoch milliseconds after which the code stops resolving.
    pub expires_at: u64,
}

impl ShareCodeResponse {
    /// Seconds left on the code at `now_ms`.
    pub fn seconds_remaining(&self, now_ms: u64) -> u64 {
        seconds_remaining(self.expires_at, now_ms)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.seconds_remaining(now_ms) == 0
    }
}

/// Body returned when a code is redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a redeem attempt means for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The code resolved; join this room.
    Join { room_id: String },
    /// Unknown or expired code. The two are indistinguishable.
    InvalidOrExpired,
    /// The request itself failed.
    Failed(String),
}

impl RedeemOutcome {
    /// Interpret an HTTP status and body from the redeem endpoint.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: RedeemResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Unreadable redeem response ({}): {}", status, e);
                return if (200..300).contains(&status) || status == 404 {
                    RedeemOutcome::InvalidOrExpired
                } else {
                    RedeemOutcome::Failed(format!("HTTP {}", status))
                };
            }
        };

        match (status, parsed) {
            (
                200..=299,
                RedeemResponse {
                    valid: true,
                    room_id: Some(room_id),
                    ..
                },
            ) if !room_id.is_empty() => RedeemOutcome::Join { room_id },
            (200..=299 | 400 | 404, _) => RedeemOutcome::InvalidOrExpired,
            (_, parsed) => RedeemOutcome::Failed(
                parsed.error.unwrap_or_else(|| format!("HTTP {}", status)),
            ),
        }
    }

    /// Text to show the user, if the attempt did not succeed.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            RedeemOutcome::Join { .. } => None,
            RedeemOutcome::InvalidOrExpired => Some(INVALID_CODE_MESSAGE),
            RedeemOutcome::Failed(_) => Some("Failed to join"),
        }
    }
}

/// Normalize a typed code for redeeming: trimmed and upper-cased. Codes
/// shorter than [`SHARE_CODE_LEN`] are rejected before any request is made.
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    if code.chars().count() < SHARE_CODE_LEN {
        return None;
    }
    Some(code)
}

/// Request path and query for redeeming `code`.
pub fn redeem_path(code: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(code.as_bytes()).collect();
    format!("{}?code={}", SHARE_PATH, encoded)
}

/// Whole seconds until `expires_at_ms`, never negative.
pub fn seconds_remaining(expires_at_ms: u64, now_ms: u64) -> u64 {
    expires_at_ms.saturating_sub(now_ms) / 1000
}

/// Format seconds as `MM:SS`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
