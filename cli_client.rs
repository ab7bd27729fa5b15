use std::sync::Arc;

use chipledger_protocol::{
    BetTo, ClientToServer, ConnectionId, Payment, PlayerJoin, RoomRef, RoomSnapshot,
    ServerToClient, Settlement, DEFAULT_ALL_IN_MIN_STACK,
};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Terminal client for a chip ledger room.
#[derive(Parser, Debug)]
#[command(name = "cli_client")]
struct Args {
    /// Server WebSocket endpoint
    #[arg(long, env = "CHIPLEDGER_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

/// What this terminal knows about the server side.
#[derive(Debug, Default)]
struct ClientView {
    me: Option<ConnectionId>,
    all_in_min_stack: u64,
    room_code: Option<String>,
    snapshot: Option<RoomSnapshot>,
}

#[derive(Debug, PartialEq)]
enum Input {
    Send(ClientToServer),
    Help,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("Chip ledger terminal");
    println!("Connecting to {}...", args.url);

    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();
    let view = Arc::new(Mutex::new(ClientView {
        all_in_min_stack: DEFAULT_ALL_IN_MIN_STACK,
        ..ClientView::default()
    }));

    tokio::spawn({
        let view = view.clone();
        async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerToClient>(&text) {
                        Ok(event) => handle_server_message(event, &mut view.lock()),
                        Err(e) => println!("Could not read server message: {e}"),
                    },
                    Ok(Message::Close(_)) => {
                        println!("Connection closed by server");
                        break;
                    }
                    Err(e) => {
                        println!("WebSocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    });

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let parsed = parse_command(&line, &view.lock());
        match parsed {
            Ok(Input::Send(cmd)) => {
                let json = serde_json::to_string(&cmd)?;
                write.send(Message::Text(json)).await?;
            }
            Ok(Input::Help) => print_help(),
            Ok(Input::Quit) => break,
            Err(why) => println!("{why}"),
        }
    }

    let _ = write.send(Message::Close(None)).await;
    println!("Bye.");
    Ok(())
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  create               - open a new room");
    println!("  join CODE            - watch a room");
    println!("  sit NAME [STACK]     - take a seat (again to rename)");
    println!("  start | topay | next - host controls");
    println!("  pay SEAT=AMOUNT ...  - settle the pot, e.g. pay 0=150 2=50");
    println!("  fold | check | call | allin");
    println!("  bet TOTAL            - raise your street total to TOTAL");
    println!("  help | quit");
    println!();
}

fn handle_server_message(msg: ServerToClient, view: &mut ClientView) {
    match msg {
        ServerToClient::Hello(h) => {
            view.me = Some(h.your_id);
            view.all_in_min_stack = h.all_in_min_stack;
            println!("Connected. All-in needs a stack of at least {}.", h.all_in_min_stack);
        }
        ServerToClient::RoomCreated(r) => {
            println!("Room {} created.", r.room_code);
            view.room_code = Some(r.room_code);
        }
        ServerToClient::RoomJoined(r) => {
            println!("Watching room {}.", r.room_code);
            view.room_code = Some(r.room_code);
        }
        ServerToClient::State(snapshot) => {
            print_room(&snapshot, view);
            view.room_code = Some(snapshot.room_code.clone());
            view.snapshot = Some(*snapshot);
        }
        ServerToClient::ErrorMsg(e) => println!("Error: {}", e.text),
    }
}

fn print_room(snapshot: &RoomSnapshot, view: &ClientView) {
    println!("\n=== Room {} ===", snapshot.room_code);
    match snapshot.phase() {
        Some(phase) => println!(
            "Phase: {phase}  Pot: {}  Bet: {}",
            snapshot.pot,
            snapshot.round.as_ref().map_or(0, |r| r.current_bet)
        ),
        None => println!("Waiting for the host to start a round"),
    }

    let actor = snapshot.actor_index();
    for (seat, p) in snapshot.players.iter().enumerate() {
        let mut tags = Vec::new();
        if seat == snapshot.dealer_index {
            tags.push("dealer");
        }
        if actor == Some(seat) {
            tags.push("to act");
        }
        if p.folded {
            tags.push("folded");
        }
        if p.connection_id.is_none() {
            tags.push("away");
        }
        if view.me.is_some() && p.connection_id == view.me {
            tags.push("you");
        }
        println!(
            "  {seat}: {} stack {} street {} total {} {}",
            p.name,
            p.stack,
            p.street_put,
            p.total_put,
            if tags.is_empty() { String::new() } else { format!("[{}]", tags.join(", ")) }
        );
    }

    if let (Some(me), Some(seat)) = (view.me, actor) {
        if snapshot.seat_of(me) == Some(seat) {
            let owed = snapshot.owed_by(seat);
            if owed > 0 {
                println!("Your turn: {owed} to call.");
            } else {
                println!("Your turn: check or bet.");
            }
        }
    }
    for line in snapshot.log.iter().rev().take(5).rev() {
        println!("  > {line}");
    }
}

fn parse_command(input: &str, view: &ClientView) -> Result<Input, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some(head) = parts.first() else {
        return Err("Type help for commands.".into());
    };

    let room = || {
        view.room_code
            .clone()
            .ok_or_else(|| "Create or join a room first.".to_string())
    };

    let cmd = match head.to_lowercase().as_str() {
        "help" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        "create" => ClientToServer::CreateRoom,
        "join" => {
            let code = parts.get(1).ok_or("Usage: join CODE")?;
            ClientToServer::JoinRoom(RoomRef::new(*code))
        }
        "sit" => {
            let name = parts.get(1).ok_or("Usage: sit NAME [STACK]")?;
            let stack = match parts.get(2) {
                Some(raw) => Some(
                    raw.parse::<u64>()
                        .map_err(|_| format!("Not a stack: {raw}"))?
                        .into(),
                ),
                None => None,
            };
            ClientToServer::JoinAsPlayer(PlayerJoin {
                room_code: room()?,
                name: name.to_string(),
                stack,
            })
        }
        "start" => ClientToServer::StartRound(RoomRef::new(room()?)),
        "topay" => ClientToServer::GoToPay(RoomRef::new(room()?)),
        "next" => ClientToServer::NextRound(RoomRef::new(room()?)),
        "pay" => {
            let snapshot = view.snapshot.as_ref().ok_or("No room state yet.")?;
            let mut payments = Vec::new();
            for part in &parts[1..] {
                let (seat, amount) = part
                    .split_once('=')
                    .ok_or_else(|| format!("Expected SEAT=AMOUNT, got {part}"))?;
                let seat: usize = seat.parse().map_err(|_| format!("Not a seat: {seat}"))?;
                let amount: u64 = amount
                    .parse()
                    .map_err(|_| format!("Not an amount: {amount}"))?;
                let player = snapshot
                    .players
                    .get(seat)
                    .ok_or_else(|| format!("No player in seat {seat}"))?;
                payments.push(Payment {
                    player_id: player.id,
                    amount,
                });
            }
            ClientToServer::Pay(Settlement::new(room()?, &payments))
        }
        "fold" => ClientToServer::Fold(RoomRef::new(room()?)),
        "check" => ClientToServer::Check(RoomRef::new(room()?)),
        "call" => ClientToServer::Call(RoomRef::new(room()?)),
        "allin" => {
            let me = view.snapshot.as_ref().zip(view.me).and_then(|(s, me)| {
                s.seat_of(me).map(|seat| s.players[seat].stack)
            });
            if me.is_some_and(|stack| stack < view.all_in_min_stack) {
                return Err(format!(
                    "All-in needs a stack of at least {}.",
                    view.all_in_min_stack
                ));
            }
            ClientToServer::AllIn(RoomRef::new(room()?))
        }
        "bet" => {
            let total = parts.get(1).ok_or("Usage: bet TOTAL")?;
            let total: u64 = total.parse().map_err(|_| format!("Not an amount: {total}"))?;
            ClientToServer::Bet(BetTo {
                room_code: room()?,
                bet_to: Some(total.into()),
            })
        }
        other => return Err(format!("Unknown command: {other}")),
    };
    Ok(Input::Send(cmd))
}
