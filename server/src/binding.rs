//! Binding live connections to rooms and seats.
//!
//! A seat belongs to the connection that created it. When that connection
//! goes away the seat and its chips stay, only the binding is cleared; the
//! room itself is dropped once nobody seated in it is connected.

use chipledger_protocol::{ConnectionId, PlayerJoin, RoomRef, ServerToClient, MAX_NAME_LEN};
use tracing::info;

use crate::error::LedgerError;
use crate::ledger;
use crate::lobby::Lobby;
use crate::room::Player;

/// Trimmed and capped at [`MAX_NAME_LEN`] characters; `None` if nothing is left.
pub fn clean_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    (!name.is_empty()).then_some(name)
}

impl Lobby {
    /// Watch a room without taking a seat.
    pub fn join_room(&mut self, connection: ConnectionId, raw_code: &str) -> Result<(), LedgerError> {
        let room = self.rooms.lookup(raw_code)?;
        self.channel.subscribe(connection, &room.code);
        self.channel
            .send_to(connection, ServerToClient::RoomJoined(RoomRef::new(room.code.clone())));
        self.channel.publish(room);
        Ok(())
    }

    /// Take a seat, or rename the seat this connection already holds.
    pub fn join_as_player(
        &mut self,
        connection: ConnectionId,
        req: PlayerJoin,
    ) -> Result<(), LedgerError> {
        let default_stack = self.rules.default_stack;
        let room = self.rooms.lookup_mut(&req.room_code)?;
        let name = clean_name(&req.name).ok_or(LedgerError::InvalidName)?;

        match room.seat_of_connection(connection) {
            Some(seat) => room.players[seat].name = name,
            None => {
                let stack = ledger::coerce_stack(req.stack.as_ref(), default_stack);
                info!(room = %room.code, %name, stack, "player seated");
                room.add_log(format!("{name} joined."));
                room.players.push(Player::new(name, stack, Some(connection)));
            }
        }

        self.channel.subscribe(connection, &room.code);
        self.channel.publish(room);
        Ok(())
    }

    /// Release everything the connection held and tidy up rooms left without players.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let mut touched = self.channel.unregister(connection);
        for code in self.rooms.codes_seating(connection) {
            if !touched.contains(&code) {
                touched.push(code);
            }
        }

        for code in touched {
            if let Ok(room) = self.rooms.lookup_mut(&code) {
                if let Some(seat) = room.seat_of_connection(connection) {
                    let player = &mut room.players[seat];
                    player.connection = None;
                    let line = format!("{} left.", player.name);
                    info!(room = %code, player = %player.name, "player disconnected");
                    room.add_log(line);
                }
            }

            if self.rooms.garbage_collect(&code) {
                self.channel.drop_group(&code);
            } else if let Ok(room) = self.rooms.lookup(&code) {
                self.channel.publish(room);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_capped() {
        assert_eq!(clean_name("  Ana  "), Some("Ana".to_string()));
        assert_eq!(clean_name("   "), None);
        assert_eq!(clean_name(""), None);

        let long = "ç".repeat(40);
        let capped = clean_name(&long).unwrap();
        assert_eq!(capped.chars().count(), MAX_NAME_LEN);
    }
}
