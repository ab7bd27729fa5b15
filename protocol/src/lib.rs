use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// ---- Rule knobs shared with clients ----
pub const SNAPSHOT_VERSION: u32 = 1;
pub const DEFAULT_ALL_IN_MIN_STACK: u64 = 1000;
pub const DEFAULT_STACK: u64 = 1000;
/// Largest stack a seat can be given. Leaves room for millions of seats' worth
/// of chips in one `u64` pot.
pub const MAX_STACK: u64 = 1_000_000_000_000;
pub const MAX_NAME_LEN: usize = 24;
pub const DEFAULT_LOG_CAPACITY: usize = 80;
pub const DEFAULT_CODE_LEN: usize = 4;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identity of one live socket. Players are bound to it while connected.
pub type ConnectionId = Uuid;
pub type PlayerId = Uuid;

/// ---- Room codes ----
pub fn random_room_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are typed by humans: surrounding whitespace and case don't matter.
pub fn normalize_room_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// ---- Read model ----
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Running,
    Pay,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Running => write!(f, "running"),
            Phase::Pay => write!(f, "pay"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub stack: u64,
    pub in_round: bool,
    pub folded: bool,
    pub street_put: u64,
    pub total_put: u64,
    /// Internal identity of the bound socket; `None` while disconnected.
    pub connection_id: Option<ConnectionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub current_bet: u64,
    /// `None` means nobody is to act.
    pub turn_index: Option<usize>,
    pub phase: Phase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub version: u32,
    pub room_code: String,
    pub created_at: DateTime<Utc>,
    pub dealer_index: usize,
    pub players: Vec<PlayerView>,
    pub round: Option<RoundView>,
    pub pot: u64,
    /// Oldest first.
    pub log: Vec<String>,
}

impl RoomSnapshot {
    pub fn seat_of(&self, connection: ConnectionId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection_id == Some(connection))
    }

    pub fn phase(&self) -> Option<Phase> {
        self.round.as_ref().map(|r| r.phase)
    }

    pub fn actor_index(&self) -> Option<usize> {
        self.round.as_ref().and_then(|r| r.turn_index)
    }

    /// Chips the seat still has to put in to match the current bet.
    pub fn owed_by(&self, seat: usize) -> u64 {
        let current_bet = self.round.as_ref().map_or(0, |r| r.current_bet);
        self.players
            .get(seat)
            .map_or(0, |p| current_bet.saturating_sub(p.street_put))
    }
}

/// ---- Request payloads ----
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    #[serde(default)]
    pub room_code: String,
}

impl RoomRef {
    pub fn new(room_code: impl Into<String>) -> Self {
        RoomRef {
            room_code: room_code.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoin {
    #[serde(default)]
    pub room_code: String,
    #[serde(default)]
    pub name: String,
    /// Loosely typed on the wire; coerced by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BetTo {
    #[serde(default)]
    pub room_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_to: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub player_id: PlayerId,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    #[serde(default)]
    pub room_code: String,
    /// Expected to be an array of `{playerId, amount}`; validated by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<serde_json::Value>,
}

impl Settlement {
    pub fn new(room_code: impl Into<String>, payments: &[Payment]) -> Self {
        Settlement {
            room_code: room_code.into(),
            payments: serde_json::to_value(payments).ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientToServer {
    #[serde(rename = "room:create")]
    CreateRoom,
    #[serde(rename = "room:join")]
    JoinRoom(RoomRef),
    #[serde(rename = "player:join")]
    JoinAsPlayer(PlayerJoin),

    // Host commands; any connection may issue them
    #[serde(rename = "host:startRound")]
    StartRound(RoomRef),
    #[serde(rename = "host:goToPay")]
    GoToPay(RoomRef),
    #[serde(rename = "host:nextRound")]
    NextRound(RoomRef),
    #[serde(rename = "host:pay")]
    Pay(Settlement),

    // Player actions, only honoured on the actor's turn
    #[serde(rename = "action:fold")]
    Fold(RoomRef),
    #[serde(rename = "action:check")]
    Check(RoomRef),
    #[serde(rename = "action:call")]
    Call(RoomRef),
    #[serde(rename = "action:bet")]
    Bet(BetTo),
    #[serde(rename = "action:allin")]
    AllIn(RoomRef),
}

impl ClientToServer {
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientToServer::CreateRoom => None,
            ClientToServer::JoinRoom(r)
            | ClientToServer::StartRound(r)
            | ClientToServer::GoToPay(r)
            | ClientToServer::NextRound(r)
            | ClientToServer::Fold(r)
            | ClientToServer::Check(r)
            | ClientToServer::Call(r)
            | ClientToServer::AllIn(r) => Some(&r.room_code),
            ClientToServer::JoinAsPlayer(j) => Some(&j.room_code),
            ClientToServer::Bet(b) => Some(&b.room_code),
            ClientToServer::Pay(s) => Some(&s.room_code),
        }
    }
}

/// ---- Server events ----
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub all_in_min_stack: u64,
    pub your_id: ConnectionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorText {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ServerToClient {
    #[serde(rename = "hello")]
    Hello(Hello),
    #[serde(rename = "room:created")]
    RoomCreated(RoomRef),
    #[serde(rename = "room:joined")]
    RoomJoined(RoomRef),
    #[serde(rename = "state")]
    State(Box<RoomSnapshot>),
    #[serde(rename = "errorMsg")]
    ErrorMsg(ErrorText),
}

impl ServerToClient {
    pub fn error(text: impl Into<String>) -> Self {
        ServerToClient::ErrorMsg(ErrorText { text: text.into() })
    }
}
