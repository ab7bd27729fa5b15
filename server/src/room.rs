use std::collections::VecDeque;

use chipledger_protocol::{
    ConnectionId, Phase, PlayerId, PlayerView, RoomSnapshot, RoundView, SNAPSHOT_VERSION,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ledger;

/// A seat at the table. Survives disconnects; only dropped with its room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub stack: u64,
    pub in_round: bool,
    pub folded: bool,
    pub street_put: u64,
    pub total_put: u64,
    pub connection: Option<ConnectionId>,
}

impl Player {
    pub fn new(name: String, stack: u64, connection: Option<ConnectionId>) -> Self {
        Player {
            id: Uuid::new_v4(),
            name,
            stack,
            in_round: false,
            folded: false,
            street_put: 0,
            total_put: 0,
            connection,
        }
    }

    pub fn can_act(&self) -> bool {
        self.in_round && !self.folded
    }

    pub(crate) fn reset_for_round(&mut self, in_round: bool) {
        self.in_round = in_round;
        self.folded = false;
        self.street_put = 0;
        self.total_put = 0;
    }

    fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            stack: self.stack,
            in_round: self.in_round,
            folded: self.folded,
            street_put: self.street_put,
            total_put: self.total_put,
            connection_id: self.connection,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    pub current_bet: u64,
    pub turn_index: Option<usize>,
    pub phase: Phase,
    /// Seats that have acted since the round started, indexed like `Room::players`.
    pub acted: Vec<bool>,
}

impl Round {
    pub fn new(seats: usize) -> Self {
        Round {
            current_bet: 0,
            turn_index: None,
            phase: Phase::Running,
            acted: vec![false; seats],
        }
    }

    pub fn has_acted(&self, seat: usize) -> bool {
        self.acted.get(seat).copied().unwrap_or(false)
    }

    pub fn mark_acted(&mut self, seat: usize) {
        if seat >= self.acted.len() {
            self.acted.resize(seat + 1, false);
        }
        self.acted[seat] = true;
    }

    fn view(&self) -> RoundView {
        RoundView {
            current_bet: self.current_bet,
            turn_index: self.turn_index,
            phase: self.phase,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub created_at: DateTime<Utc>,
    /// Seat order is join order; it defines turn order and dealer rotation.
    pub players: Vec<Player>,
    pub dealer_index: usize,
    pub round: Option<Round>,
    log: VecDeque<String>,
    log_capacity: usize,
}

impl Room {
    pub fn new(code: String, log_capacity: usize) -> Self {
        Room {
            code,
            created_at: Utc::now(),
            players: Vec::new(),
            dealer_index: 0,
            round: None,
            log: VecDeque::with_capacity(log_capacity),
            log_capacity,
        }
    }

    pub fn add_log(&mut self, line: impl Into<String>) {
        if self.log_capacity == 0 {
            return;
        }
        while self.log.len() >= self.log_capacity {
            self.log.pop_front();
        }
        self.log.push_back(line.into());
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn pot(&self) -> u64 {
        ledger::total_pot(&self.players)
    }

    pub fn phase(&self) -> Option<Phase> {
        self.round.as_ref().map(|r| r.phase)
    }

    pub fn seat_of_connection(&self, connection: ConnectionId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection == Some(connection))
    }

    pub fn seat_of_player(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn actor_index(&self) -> Option<usize> {
        self.round.as_ref().and_then(|r| r.turn_index)
    }

    pub fn has_live_connection(&self) -> bool {
        self.players.iter().any(|p| p.connection.is_some())
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            version: SNAPSHOT_VERSION,
            room_code: self.code.clone(),
            created_at: self.created_at,
            dealer_index: self.dealer_index,
            players: self.players.iter().map(Player::view).collect(),
            round: self.round.as_ref().map(Round::view),
            pot: self.pot(),
            log: self.log.iter().cloned().collect(),
        }
    }
}
