use chipledger_protocol::{ClientToServer, ConnectionId, Hello, RoomRef, ServerToClient};
use tracing::{debug, info};

use crate::broadcast::{BroadcastChannel, Outbox};
use crate::config::RulesConfig;
use crate::engine::{Action, RoundEngine};
use crate::error::{RequestError, RequestResult};
use crate::ledger;
use crate::registry::RoomRegistry;
use crate::room::Room;

/// All mutable server state. One event is handled to completion under the
/// lock before the next one starts.
#[derive(Debug)]
pub struct Lobby {
    pub(crate) rooms: RoomRegistry,
    pub(crate) channel: BroadcastChannel,
    pub(crate) engine: RoundEngine,
    pub(crate) rules: RulesConfig,
}

impl Lobby {
    pub fn new(rules: RulesConfig) -> Self {
        Lobby {
            rooms: RoomRegistry::new(&rules),
            channel: BroadcastChannel::new(),
            engine: RoundEngine::new(rules.all_in_min_stack),
            rules,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn connect(&mut self, connection: ConnectionId, outbox: Outbox) {
        self.channel.register(connection, outbox);
        self.channel.send_to(
            connection,
            ServerToClient::Hello(Hello {
                all_in_min_stack: self.engine.all_in_min_stack(),
                your_id: connection,
            }),
        );
    }

    /// Tell one connection its frame could not be understood.
    pub fn reject_frame(&self, connection: ConnectionId) {
        self.channel
            .send_to(connection, ServerToClient::error("Unrecognised message."));
    }

    pub fn create_room(&mut self, connection: ConnectionId) -> String {
        let room = self.rooms.create();
        let code = room.code.clone();
        self.channel.subscribe(connection, &code);
        self.channel
            .send_to(connection, ServerToClient::RoomCreated(RoomRef::new(code.clone())));
        self.channel.publish(room);
        code
    }

    /// Route one inbound event. User-facing failures become `errorMsg`,
    /// everything else that is refused is only logged.
    pub fn handle(&mut self, connection: ConnectionId, cmd: ClientToServer) {
        debug!(
            %connection,
            room = cmd.room_code().unwrap_or("-"),
            ?cmd,
            "request"
        );
        match self.route(connection, cmd) {
            Ok(()) => {}
            Err(RequestError::Ledger(e)) => {
                info!(%connection, error = %e, "request refused");
                self.channel.send_to(connection, ServerToClient::error(e.to_string()));
            }
            Err(RequestError::Ignored(why)) => {
                debug!(%connection, reason = %why, "request ignored");
            }
        }
    }

    fn route(&mut self, connection: ConnectionId, cmd: ClientToServer) -> RequestResult {
        match cmd {
            ClientToServer::CreateRoom => {
                self.create_room(connection);
                Ok(())
            }
            ClientToServer::JoinRoom(r) => Ok(self.join_room(connection, &r.room_code)?),
            ClientToServer::JoinAsPlayer(req) => Ok(self.join_as_player(connection, req)?),

            ClientToServer::StartRound(r) => self.with_room(&r.room_code, |engine, room| {
                Ok(engine.start_round(room)?)
            }),
            ClientToServer::GoToPay(r) => self.with_room(&r.room_code, |engine, room| {
                Ok(engine.go_to_pay(room)?)
            }),
            ClientToServer::NextRound(r) => self.with_room(&r.room_code, |engine, room| {
                Ok(engine.next_round(room)?)
            }),
            ClientToServer::Pay(s) => self.with_room(&s.room_code, |engine, room| {
                engine.settle(room, s.payments.as_ref())
            }),

            ClientToServer::Fold(r) => self.act(connection, &r.room_code, Action::Fold),
            ClientToServer::Check(r) => self.act(connection, &r.room_code, Action::Check),
            ClientToServer::Call(r) => self.act(connection, &r.room_code, Action::Call),
            ClientToServer::AllIn(r) => self.act(connection, &r.room_code, Action::AllIn),
            ClientToServer::Bet(b) => {
                let target = b.bet_to.as_ref().and_then(ledger::coerce_int);
                self.act(connection, &b.room_code, Action::Bet(target))
            }
        }
    }

    fn act(&mut self, connection: ConnectionId, code: &str, action: Action) -> RequestResult {
        self.with_room(code, |engine, room| Ok(engine.act(room, connection, action)?))
    }

    /// Resolve the room, run `f` against it and publish if it changed anything.
    fn with_room<F>(&mut self, code: &str, f: F) -> RequestResult
    where
        F: FnOnce(&RoundEngine, &mut Room) -> RequestResult,
    {
        let room = self.rooms.lookup_mut(code)?;
        f(&self.engine, room)?;
        self.channel.publish(room);
        Ok(())
    }
}
