//! Share codes: short-lived, typeable tokens that resolve to a room id.

use crate::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dashmap::{DashMap, mapref::entry::Entry};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info};
use uuid::Uuid;

pub const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

struct ShareEntry {
    room_id: String,
    expires_at: Instant,
}

/// Body returned when a code is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedShare {
    pub share_code: String,
    pub room_id: String,
    /// Epoch milliseconds, for the host's countdown only.
    pub expires_at: u64,
}

/// Code → room id map with per-key expiry.
pub struct ShareStore {
    entries: DashMap<String, ShareEntry>,
    ttl: Duration,
}

impl ShareStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a code for a fresh room.
    pub fn issue(&self) -> IssuedShare {
        self.issue_at(Instant::now())
    }

    pub fn issue_at(&self, now: Instant) -> IssuedShare {
        let room_id = Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;

        let share_code = loop {
            let code = generate_code();
            match self.entries.entry(code.clone()) {
                Entry::Occupied(mut slot) if slot.get().expires_at <= now => {
                    slot.insert(ShareEntry {
                        room_id: room_id.clone(),
                        expires_at,
                    });
                    break code;
                }
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(ShareEntry {
                        room_id: room_id.clone(),
                        expires_at,
                    });
                    break code;
                }
            }
        };

        IssuedShare {
            share_code,
            room_id,
            expires_at: epoch_millis().saturating_add(self.ttl.as_millis() as u64),
        }
    }

    /// Resolve a code, case-insensitively. Expired and unknown codes are
    /// indistinguishable.
    pub fn redeem(&self, code: &str) -> Option<String> {
        self.redeem_at(code, Instant::now())
    }

    pub fn redeem_at(&self, code: &str, now: Instant) -> Option<String> {
        let code = code.trim().to_ascii_uppercase();
        let room_id = {
            let entry = self.entries.get(&code)?;
            (entry.expires_at > now).then(|| entry.room_id.clone())
        };
        if room_id.is_none() {
            self.entries.remove_if(&code, |_, entry| entry.expires_at <= now);
        }
        room_id
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Deserialize)]
pub struct RedeemQuery {
    code: Option<String>,
}

/// `POST /api/share`
pub async fn issue(State(state): State<Arc<AppState>>) -> Json<IssuedShare> {
    let issued = state.shares.issue();
    info!("Issued share code for room {}", issued.room_id);
    Json(issued)
}

/// `GET /api/share?code=`
pub async fn redeem(State(state): State<Arc<AppState>>, Query(query): Query<RedeemQuery>) -> Response {
    let Some(code) = query.code.filter(|code| !code.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Code is required" }))).into_response();
    };

    match state.shares.redeem(&code) {
        Some(room_id) => {
            debug!("Share code redeemed for room {}", room_id);
            Json(json!({ "valid": true, "roomId": room_id })).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "valid": false, "message": "Code expired or invalid" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_uppercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn issued_code_resolves_until_expiry() {
        let store = ShareStore::new(Duration::from_secs(120));
        let t0 = Instant::now();
        let issued = store.issue_at(t0);

        assert_eq!(
            store.redeem_at(&issued.share_code, t0 + Duration::from_secs(119)),
            Some(issued.room_id.clone())
        );
        assert_eq!(store.redeem_at(&issued.share_code, t0 + Duration::from_secs(120)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn redeem_is_case_insensitive_and_repeatable() {
        let store = ShareStore::new(Duration::from_secs(120));
        let issued = store.issue();
        let lower = issued.share_code.to_ascii_lowercase();
        assert_eq!(store.redeem(&lower), Some(issued.room_id.clone()));
        assert_eq!(store.redeem(&issued.share_code), Some(issued.room_id));
    }

    #[test]
    fn unknown_code_is_none() {
        let store = ShareStore::new(Duration::from_secs(120));
        assert_eq!(store.redeem("ZZZZZZ"), None);
    }

    #[test]
    fn each_issue_gets_its_own_room() {
        let store = ShareStore::new(Duration::from_secs(120));
        let a = store.issue();
        let b = store.issue();
        assert_ne!(a.room_id, b.room_id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expires_at_is_ttl_ahead() {
        let store = ShareStore::new(Duration::from_secs(120));
        let before = epoch_millis();
        let issued = store.issue();
        assert!(issued.expires_at >= before + 120_000);
        assert!(issued.expires_at <= epoch_millis() + 120_000);
    }

    #[test]
    fn purge_drops_only_expired() {
        let store = ShareStore::new(Duration::from_secs(10));
        let t0 = Instant::now();
        store.issue_at(t0);
        store.issue_at(t0 + Duration::from_secs(5));
        assert_eq!(store.purge_expired(t0 + Duration::from_secs(12)), 1);
        assert_eq!(store.len(), 1);
    }
}
