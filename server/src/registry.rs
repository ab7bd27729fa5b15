use std::collections::HashMap;

use chipledger_protocol::{normalize_room_code, random_room_code, ConnectionId};
use tracing::info;

use crate::config::RulesConfig;
use crate::error::LedgerError;
use crate::room::Room;

/// Attempts at a given code length before the code space is widened.
const CODE_ATTEMPTS: usize = 32;

/// Owns every live room for the life of the process.
///
/// Rooms are created on request and only removed by [`RoomRegistry::garbage_collect`]
/// once nobody seated in them is connected any more.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    code_len: usize,
    log_capacity: usize,
}

impl RoomRegistry {
    pub fn new(rules: &RulesConfig) -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
            code_len: rules.code_len.max(1),
            log_capacity: rules.log_capacity,
        }
    }

    pub fn create(&mut self) -> &mut Room {
        let code = self.fresh_code();
        let log_capacity = self.log_capacity;
        info!(room = %code, "room created");
        self.rooms
            .entry(code.clone())
            .or_insert_with(|| Room::new(code, log_capacity))
    }

    fn fresh_code(&self) -> String {
        let mut len = self.code_len;
        loop {
            for _ in 0..CODE_ATTEMPTS {
                let code = random_room_code(len);
                if !self.rooms.contains_key(&code) {
                    return code;
                }
            }
            len += 1;
        }
    }

    pub fn lookup(&self, raw_code: &str) -> Result<&Room, LedgerError> {
        self.rooms
            .get(&normalize_room_code(raw_code))
            .ok_or(LedgerError::RoomNotFound)
    }

    pub fn lookup_mut(&mut self, raw_code: &str) -> Result<&mut Room, LedgerError> {
        self.rooms
            .get_mut(&normalize_room_code(raw_code))
            .ok_or(LedgerError::RoomNotFound)
    }

    /// Rooms where `connection` currently holds a seat.
    pub fn codes_seating(&self, connection: ConnectionId) -> Vec<String> {
        self.rooms
            .values()
            .filter(|r| r.seat_of_connection(connection).is_some())
            .map(|r| r.code.clone())
            .collect()
    }

    /// Drop the room if no seated player is connected. Returns whether it was removed.
    pub fn garbage_collect(&mut self, code: &str) -> bool {
        let empty = self
            .rooms
            .get(code)
            .is_some_and(|room| !room.has_live_connection());
        if empty {
            self.rooms.remove(code);
            info!(room = %code, "room deleted (no connected players)");
        }
        empty
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
