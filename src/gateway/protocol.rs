use serde::{Deserialize, Serialize};

use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::state::BettingState;
use crate::ledger::types::HandId;

use super::error::ErrorCode;
use super::presence::PresenceStatus;

pub type TableId = i64;
pub type ConnectionId = uuid::Uuid;

/// `{kind}:{scopeId}` channel key. Equality/hashing is on the pair directly
/// rather than the formatted string so routing never pays for formatting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub kind: ChannelKind,
    pub scope_id: i64,
}

impl ChannelKey {
    pub fn new(kind: ChannelKind, scope_id: i64) -> Self {
        Self { kind, scope_id }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.scope_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Table,
    Chat,
    Lobby,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResumeCursor {
    pub channel: ChannelKind,
    pub scope_id: i64,
    pub last_seq: u64,
}

/// Messages a client may send over the socket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { channel: ChannelKind, scope_id: i64 },
    Unsubscribe { channel: ChannelKind, scope_id: i64 },
    ChatSend { table_id: TableId, text: String },
    Action {
        table_id: TableId,
        hand_id: HandId,
        action: PlayerAction,
    },
    Resume { cursors: Vec<ResumeCursor> },
    Ping,
}

/// Messages the gateway may send over the socket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        session_id: ConnectionId,
        server_time: chrono::DateTime<chrono::Utc>,
    },
    Snapshot {
        table_id: TableId,
        version: i64,
        state: BettingState,
        board: Vec<crate::engine::deck::Card>,
        /// The requesting connection's own hole cards, if it owns a seat in
        /// this hand. Never populated for any seat but the recipient's own —
        /// spectators and other seats see `None`.
        hole_cards: Option<[crate::engine::deck::Card; 2]>,
    },
    TablePatch {
        table_id: TableId,
        seq: u64,
        patch: crate::engine::nl::events::GameEvent,
    },
    ChatMessage {
        table_id: TableId,
        seq: u64,
        from: i64,
        text: String,
        ts: chrono::DateTime<chrono::Utc>,
    },
    Presence {
        user_id: i64,
        status: PresenceStatus,
    },
    Error {
        code: ErrorCode,
        message: String,
        retry_after_ms: Option<u64>,
    },
    Pong,
}

/// The envelope carried on the shared pub/sub fabric. Every gateway instance
/// subscribes to the same bus and discards envelopes it authored itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FabricEnvelope {
    pub channel: ChannelKey,
    pub payload: ServerMessage,
    pub source_id: String,
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::serde::assert_round_trip_json;

    #[test]
    fn channel_key_round_trips_with_serde() {
        let key = ChannelKey::new(ChannelKind::Table, 42);
        assert_round_trip_json(&key);
    }

    #[test]
    fn snapshot_omits_hole_cards_for_non_owning_recipient() {
        use crate::engine::nl::state::BettingState;

        let snapshot = ServerMessage::Snapshot {
            table_id: 1,
            version: 3,
            state: serde_json::from_value::<BettingState>(sample_state()).unwrap(),
            board: vec![],
            hole_cards: None,
        };
        let encoded = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(encoded["hole_cards"], serde_json::Value::Null);
        assert_eq!(encoded["board"], serde_json::json!([]));
    }

    fn sample_state() -> serde_json::Value {
        serde_json::json!({
            "street": "preflop",
            "button": 0,
            "first_to_act": 0,
            "to_act": 0,
            "current_bet_to_match": 10,
            "last_full_raise_amount": 10,
            "last_aggressor": null,
            "voluntary_bet_opened": false,
            "players": [],
            "pots": {"main": {"amount": 0, "eligible": []}, "sides": []},
            "cfg": {
                "stakes": {"small_blind": 5, "big_blind": 10, "ante": 0},
                "button": 0,
                "small_blind_seat": 0,
                "big_blind_seat": 1,
                "check_raise_allowed": true,
                "max_seats": 2
            },
            "pending_to_match": [],
            "betting_locked_all_in": false,
            "action_log": []
        })
    }

    #[test]
    fn client_message_decodes_tagged_json() {
        let json = r#"{"type":"subscribe","channel":"table","scope_id":7}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Subscribe { channel: ChannelKind::Table, scope_id: 7 }
        ));
    }
}
