//! The betting-round state machine for a single room.
//!
//! Phases only move forward: `running -> pay -> ended`, or straight from
//! `running` to `ended` when everyone but one player folds. The engine
//! mutates the [`Room`] it is handed and never broadcasts; callers publish
//! a snapshot after every `Ok`.

use chipledger_protocol::{ConnectionId, Phase};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{LedgerError, Rejection, RequestResult};
use crate::ledger;
use crate::room::{Player, Room, Round};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Raise own street commitment to this total. `None` when the request carried no usable number.
    Bet(Option<i64>),
    AllIn,
}

#[derive(Debug, Clone, Copy)]
pub struct RoundEngine {
    all_in_min_stack: u64,
}

impl RoundEngine {
    pub fn new(all_in_min_stack: u64) -> Self {
        RoundEngine { all_in_min_stack }
    }

    pub fn all_in_min_stack(&self) -> u64 {
        self.all_in_min_stack
    }

    /// Deal everyone in and hand the turn to the seat after the dealer.
    ///
    /// A round still running or waiting for payment cannot be restarted,
    /// since its committed chips would be lost.
    pub fn start_round(&self, room: &mut Room) -> Result<(), Rejection> {
        let n = room.players.len();
        if n < 2 {
            return Err(Rejection::TooFewPlayers);
        }
        if let Some(phase) = room.phase().filter(|p| *p != Phase::Ended) {
            return Err(Rejection::WrongPhase(phase));
        }

        for p in room.players.iter_mut() {
            p.reset_for_round(true);
        }
        room.clear_log();
        room.add_log("Round started.");

        let mut round = Round::new(n);
        let dealer = room.dealer_index % n;
        let first = (dealer + 1) % n;
        round.turn_index = if room.players[first].can_act() {
            Some(first)
        } else {
            next_eligible(&room.players, &round, Some(dealer))
        };

        info!(
            room = %room.code,
            players = n,
            dealer,
            first_to_act = ?round.turn_index,
            "round started"
        );
        room.round = Some(round);
        Ok(())
    }

    pub fn go_to_pay(&self, room: &mut Room) -> Result<(), Rejection> {
        let phase = room.phase().ok_or(Rejection::NoRound)?;
        if phase != Phase::Running {
            return Err(Rejection::WrongPhase(phase));
        }
        enter_pay(room);
        Ok(())
    }

    /// Rotate the dealer and clear the finished round.
    pub fn next_round(&self, room: &mut Room) -> Result<(), Rejection> {
        let phase = room.phase().ok_or(Rejection::NoRound)?;
        if phase != Phase::Ended {
            return Err(Rejection::WrongPhase(phase));
        }
        room.dealer_index = (room.dealer_index + 1) % room.players.len().max(1);
        room.round = None;
        room.clear_log();
        info!(room = %room.code, dealer = room.dealer_index, "dealer button moved");
        Ok(())
    }

    /// Apply a player action on behalf of `connection`.
    ///
    /// Only the connection bound to the seat whose turn it is may act, and
    /// only while the round is running.
    pub fn act(
        &self,
        room: &mut Room,
        connection: ConnectionId,
        action: Action,
    ) -> Result<(), Rejection> {
        let seat = actor_seat(room, connection)?;
        let current_bet = room.round.as_ref().map_or(0, |r| r.current_bet);
        let min_stack = self.all_in_min_stack;

        let player = &mut room.players[seat];
        let owed = ledger::amount_owed(current_bet, player.street_put);
        let line = match action {
            Action::Fold => {
                player.folded = true;
                format!("{} folded.", player.name)
            }
            Action::Check => {
                if owed != 0 {
                    return Err(Rejection::OwesChips);
                }
                format!("{} checked.", player.name)
            }
            Action::Call => {
                if owed == 0 {
                    return Err(Rejection::NothingOwed);
                }
                let paid = ledger::commit_chips(player, owed);
                format!("{} called {}.", player.name, paid)
            }
            Action::Bet(target) => {
                let target = match target {
                    Some(t) if t > 0 => t as u64,
                    _ => return Err(Rejection::InvalidBet),
                };
                let delta = target.saturating_sub(player.street_put);
                if delta == 0 {
                    return Err(Rejection::InvalidBet);
                }
                let paid = ledger::commit_chips(player, delta);
                format!("{} bet to {} (paid {}).", player.name, player.street_put, paid)
            }
            Action::AllIn => {
                if player.stack < min_stack {
                    return Err(Rejection::BelowAllInMinimum);
                }
                let stack = player.stack;
                ledger::commit_chips(player, stack);
                format!("{} went ALL-IN to {}.", player.name, player.street_put)
            }
        };

        let street_put = player.street_put;
        if let Some(round) = room.round.as_mut() {
            if matches!(action, Action::Bet(_) | Action::AllIn) {
                round.current_bet = round.current_bet.max(street_put);
            }
            round.mark_acted(seat);
        }
        debug!(room = %room.code, seat, ?action, "{line}");
        room.add_log(line);

        advance_turn_or_end(room);
        Ok(())
    }

    /// Credit the pot back to stacks as the host decided, then end the round.
    ///
    /// The credited total must match the pot exactly or nothing changes.
    pub fn settle(&self, room: &mut Room, payments: Option<&Value>) -> RequestResult {
        let phase = room.phase().ok_or(Rejection::NoRound)?;
        if phase != Phase::Pay {
            return Err(Rejection::WrongPhase(phase).into());
        }

        let mut credits: Vec<(usize, u64)> = Vec::new();
        for (id, amount) in ledger::parse_payments(payments)? {
            let Some(seat) = room.seat_of_player(id) else {
                debug!(room = %room.code, %id, "payment to unknown player dropped");
                continue;
            };
            match credits.iter_mut().find(|(s, _)| *s == seat) {
                Some((_, total)) => *total = total.saturating_add(amount),
                None => credits.push((seat, amount)),
            }
        }

        let pot = room.pot();
        let sum = credits
            .iter()
            .fold(0u64, |acc, (_, amount)| acc.saturating_add(*amount));
        if sum != pot {
            return Err(LedgerError::SettlementSumMismatch { pot }.into());
        }

        let parts: Vec<String> = credits
            .iter()
            .map(|&(seat, amount)| {
                let p = &mut room.players[seat];
                p.stack = p.stack.saturating_add(amount);
                format!("{} +{}", p.name, amount)
            })
            .collect();
        if parts.is_empty() {
            room.add_log("Payment: nothing to pay.");
        } else {
            room.add_log(format!("Payment: {}.", parts.join(" | ")));
        }
        info!(room = %room.code, pot, "pot settled");
        end_round(room);
        Ok(())
    }
}

/// Close the round: chips already moved stay where they are, round bookkeeping is wiped.
pub(crate) fn end_round(room: &mut Room) {
    let Some(round) = room.round.as_mut() else {
        return;
    };
    round.phase = Phase::Ended;
    round.turn_index = None;
    for p in room.players.iter_mut() {
        p.reset_for_round(false);
    }
    info!(room = %room.code, "round ended");
}

fn enter_pay(room: &mut Room) {
    if let Some(round) = room.round.as_mut() {
        round.phase = Phase::Pay;
        round.turn_index = None;
    }
    room.add_log("Moving to payment.");
    info!(room = %room.code, pot = room.pot(), "betting closed, waiting for payment");
}

fn actor_seat(room: &Room, connection: ConnectionId) -> Result<usize, Rejection> {
    let round = room.round.as_ref().ok_or(Rejection::NoRound)?;
    if round.phase != Phase::Running {
        return Err(Rejection::WrongPhase(round.phase));
    }
    round
        .turn_index
        .filter(|&i| room.players.get(i).and_then(|p| p.connection) == Some(connection))
        .ok_or(Rejection::NotYourTurn)
}

/// Index of the only player still in, if exactly one is left.
fn last_one_standing(players: &[Player]) -> Option<usize> {
    let mut active = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.can_act())
        .map(|(i, _)| i);
    match (active.next(), active.next()) {
        (Some(i), None) => Some(i),
        _ => None,
    }
}

/// A seat still has something to do this street: it hasn't acted yet, or it
/// is short of the current bet and has chips left to put in.
fn is_eligible(p: &Player, round: &Round, seat: usize) -> bool {
    p.can_act()
        && (!round.has_acted(seat)
            || (ledger::amount_owed(round.current_bet, p.street_put) > 0 && p.stack > 0))
}

/// Scan one lap strictly after `from`, wrapping. `None` means the street is done:
/// every live seat has acted and is either matched or out of chips.
fn next_eligible(players: &[Player], round: &Round, from: Option<usize>) -> Option<usize> {
    let n = players.len();
    (1..=n)
        .map(|step| match from {
            Some(f) => (f + step) % n,
            None => step - 1,
        })
        .find(|&i| is_eligible(&players[i], round, i))
}

fn advance_turn_or_end(room: &mut Room) {
    if let Some(winner) = last_one_standing(&room.players) {
        let pot = room.pot();
        let name = room.players[winner].name.clone();
        let stack = &mut room.players[winner].stack;
        *stack = stack.saturating_add(pot);
        room.add_log(format!("{name} won (everyone else folded)."));
        info!(room = %room.code, winner = %name, pot, "last player standing takes the pot");
        end_round(room);
        return;
    }

    let next = match room.round.as_ref() {
        Some(round) => next_eligible(&room.players, round, round.turn_index),
        None => return,
    };
    match next {
        Some(i) => {
            if let Some(round) = room.round.as_mut() {
                round.turn_index = Some(i);
            }
        }
        None => enter_pay(room),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipledger_protocol::MAX_STACK;
    use serde_json::json;
    use uuid::Uuid;

    struct Table {
        room: Room,
        conns: Vec<ConnectionId>,
        engine: RoundEngine,
    }

    impl Table {
        fn new(stacks: &[u64]) -> Self {
            let mut room = Room::new("TEST".into(), 80);
            let mut conns = Vec::new();
            for (i, &stack) in stacks.iter().enumerate() {
                let conn = Uuid::new_v4();
                room.players
                    .push(Player::new(format!("P{i}"), stack, Some(conn)));
                conns.push(conn);
            }
            Table {
                room,
                conns,
                engine: RoundEngine::new(1000),
            }
        }

        fn start(&mut self) {
            self.engine.start_round(&mut self.room).unwrap();
        }

        fn act(&mut self, seat: usize, action: Action) -> Result<(), Rejection> {
            self.engine.act(&mut self.room, self.conns[seat], action)
        }

        fn turn(&self) -> Option<usize> {
            self.room.actor_index()
        }

        fn phase(&self) -> Option<Phase> {
            self.room.phase()
        }

        fn stacks(&self) -> Vec<u64> {
            self.room.players.iter().map(|p| p.stack).collect()
        }

        fn pay(&mut self, pairs: &[(usize, u64)]) -> RequestResult {
            let list: Vec<_> = pairs
                .iter()
                .map(|&(seat, amount)| {
                    json!({"playerId": self.room.players[seat].id.to_string(), "amount": amount})
                })
                .collect();
            self.engine.settle(&mut self.room, Some(&Value::Array(list)))
        }
    }

    #[test]
    fn start_needs_two_players() {
        let mut t = Table::new(&[1000]);
        assert_eq!(
            t.engine.start_round(&mut t.room),
            Err(Rejection::TooFewPlayers)
        );
        assert!(t.room.round.is_none());
    }

    #[test]
    fn open_round_cannot_be_restarted() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        t.act(1, Action::Bet(Some(50))).unwrap();
        assert_eq!(
            t.engine.start_round(&mut t.room),
            Err(Rejection::WrongPhase(Phase::Running))
        );
        t.engine.go_to_pay(&mut t.room).unwrap();
        assert_eq!(
            t.engine.start_round(&mut t.room),
            Err(Rejection::WrongPhase(Phase::Pay))
        );
        assert_eq!(t.room.pot(), 50);

        t.pay(&[(1, 50)]).unwrap();
        t.start();
        assert_eq!(t.phase(), Some(Phase::Running));
    }

    #[test]
    fn first_actor_follows_the_dealer_with_wrap() {
        let mut t = Table::new(&[1000, 1000, 1000]);
        t.room.dealer_index = 5;
        t.start();
        assert_eq!(t.turn(), Some(0));
        assert_eq!(t.phase(), Some(Phase::Running));
        assert!(t.room.players.iter().all(|p| p.in_round && !p.folded));
        assert_eq!(t.room.log().collect::<Vec<_>>(), vec!["Round started."]);
    }

    #[test]
    fn heads_up_check_bet_call_then_pay() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        assert_eq!(t.turn(), Some(1));

        t.act(1, Action::Check).unwrap();
        assert_eq!(t.turn(), Some(0));

        t.act(0, Action::Bet(Some(100))).unwrap();
        let round = t.room.round.as_ref().unwrap();
        assert_eq!(round.current_bet, 100);
        assert_eq!(t.room.players[0].street_put, 100);
        assert_eq!(t.turn(), Some(1));

        t.act(1, Action::Call).unwrap();
        assert_eq!(t.room.players[1].street_put, 100);
        assert_eq!(t.phase(), Some(Phase::Pay));
        assert_eq!(t.turn(), None);
        assert_eq!(t.room.pot(), 200);

        t.pay(&[(0, 100), (1, 100)]).unwrap();
        assert_eq!(t.phase(), Some(Phase::Ended));
        assert_eq!(t.stacks(), vec![1000, 1000]);
        assert_eq!(t.room.pot(), 0);
        assert!(t.room.players.iter().all(|p| !p.in_round));
    }

    #[test]
    fn two_folds_hand_the_pot_to_the_last_player() {
        let mut t = Table::new(&[1000, 1000, 1000]);
        t.start();
        assert_eq!(t.turn(), Some(1));
        t.act(1, Action::Bet(Some(200))).unwrap();
        t.act(2, Action::Fold).unwrap();
        assert_eq!(t.turn(), Some(0));
        t.act(0, Action::Fold).unwrap();

        assert_eq!(t.phase(), Some(Phase::Ended));
        assert_eq!(t.stacks(), vec![1000, 1000, 1000]);
        let log: Vec<_> = t.room.log().collect();
        assert_eq!(log.last(), Some(&"P1 won (everyone else folded)."));
    }

    #[test]
    fn fold_to_win_awards_exactly_the_pot() {
        let mut t = Table::new(&[1000, 1000, 1000]);
        t.start();
        t.act(1, Action::Bet(Some(100))).unwrap();
        t.act(2, Action::Call).unwrap();
        t.act(0, Action::Bet(Some(300))).unwrap();
        // pot is 500 when both others fold
        t.act(1, Action::Fold).unwrap();
        t.act(2, Action::Fold).unwrap();
        assert_eq!(t.phase(), Some(Phase::Ended));
        assert_eq!(t.stacks(), vec![1200, 900, 900]);
    }

    #[test]
    fn checking_around_closes_the_street() {
        let mut t = Table::new(&[500, 500, 500]);
        t.start();
        t.act(1, Action::Check).unwrap();
        t.act(2, Action::Check).unwrap();
        assert_eq!(t.turn(), Some(0));
        t.act(0, Action::Check).unwrap();
        assert_eq!(t.phase(), Some(Phase::Pay));

        // nothing was bet, so an empty payment settles it
        t.pay(&[]).unwrap();
        assert_eq!(t.phase(), Some(Phase::Ended));
    }

    #[test]
    fn a_bet_reopens_action_for_players_who_checked() {
        let mut t = Table::new(&[1000, 1000, 1000]);
        t.start();
        t.act(1, Action::Check).unwrap();
        t.act(2, Action::Check).unwrap();
        t.act(0, Action::Bet(Some(50))).unwrap();
        assert_eq!(t.turn(), Some(1));
        t.act(1, Action::Call).unwrap();
        assert_eq!(t.turn(), Some(2));
        t.act(2, Action::Call).unwrap();
        assert_eq!(t.phase(), Some(Phase::Pay));
        assert_eq!(t.room.pot(), 150);
    }

    #[test]
    fn out_of_turn_and_wrong_phase_are_ignored() {
        let mut t = Table::new(&[1000, 1000]);
        assert_eq!(t.act(0, Action::Fold), Err(Rejection::NoRound));

        t.start();
        assert_eq!(t.act(0, Action::Bet(Some(100))), Err(Rejection::NotYourTurn));
        assert_eq!(t.room.pot(), 0);

        let stranger = Uuid::new_v4();
        assert_eq!(
            t.engine.act(&mut t.room, stranger, Action::Check),
            Err(Rejection::NotYourTurn)
        );

        t.engine.go_to_pay(&mut t.room).unwrap();
        assert_eq!(
            t.act(1, Action::Check),
            Err(Rejection::WrongPhase(Phase::Pay))
        );
    }

    #[test]
    fn check_and_call_depend_on_what_is_owed() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        assert_eq!(t.act(1, Action::Call), Err(Rejection::NothingOwed));
        t.act(1, Action::Bet(Some(40))).unwrap();
        assert_eq!(t.act(0, Action::Check), Err(Rejection::OwesChips));
        assert_eq!(t.turn(), Some(0));
    }

    #[test]
    fn bets_must_raise_own_commitment() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        assert_eq!(t.act(1, Action::Bet(None)), Err(Rejection::InvalidBet));
        assert_eq!(t.act(1, Action::Bet(Some(0))), Err(Rejection::InvalidBet));
        assert_eq!(t.act(1, Action::Bet(Some(-5))), Err(Rejection::InvalidBet));

        t.act(1, Action::Bet(Some(300))).unwrap();
        // below the current bet is still accepted as long as it adds chips
        t.act(0, Action::Bet(Some(100))).unwrap();
        let round = t.room.round.as_ref().unwrap();
        assert_eq!(round.current_bet, 300);
        assert_eq!(t.room.players[0].street_put, 100);
        // P0 is still short, so the street stays open for them
        assert_eq!(t.turn(), Some(0));
        assert_eq!(t.act(0, Action::Bet(Some(100))), Err(Rejection::InvalidBet));
    }

    #[test]
    fn bets_are_capped_at_the_stack() {
        let mut t = Table::new(&[1000, 250]);
        t.start();
        t.act(1, Action::Bet(Some(400))).unwrap();
        assert_eq!(t.room.players[1].stack, 0);
        assert_eq!(t.room.players[1].street_put, 250);
        assert_eq!(t.room.round.as_ref().unwrap().current_bet, 250);
    }

    #[test]
    fn all_in_is_gated_by_minimum_stack() {
        let mut t = Table::new(&[1500, 999]);
        t.start();
        assert_eq!(t.act(1, Action::AllIn), Err(Rejection::BelowAllInMinimum));
        t.act(1, Action::Call).unwrap_err();
        t.act(1, Action::Check).unwrap();

        t.act(0, Action::AllIn).unwrap();
        assert_eq!(t.room.players[0].stack, 0);
        assert_eq!(t.room.round.as_ref().unwrap().current_bet, 1500);

        // short call: P1 puts in what they have, no side pot
        t.act(1, Action::Call).unwrap();
        assert_eq!(t.room.players[1].stack, 0);
        assert_eq!(t.room.players[1].street_put, 999);
        assert_eq!(t.phase(), Some(Phase::Pay));
        assert_eq!(t.room.pot(), 2499);
    }

    #[test]
    fn busted_callers_are_skipped() {
        let mut t = Table::new(&[1000, 100, 1000]);
        t.start();
        t.act(1, Action::Bet(Some(100))).unwrap();
        t.act(2, Action::Bet(Some(400))).unwrap();
        t.act(0, Action::Call).unwrap();
        // P1 owes 300 but has nothing left, so the street is over
        assert_eq!(t.phase(), Some(Phase::Pay));
        assert_eq!(t.room.pot(), 900);
    }

    #[test]
    fn settlement_must_match_the_pot() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        t.act(1, Action::Bet(Some(100))).unwrap();
        t.act(0, Action::Call).unwrap();
        assert_eq!(t.phase(), Some(Phase::Pay));

        let before = t.stacks();
        assert_eq!(
            t.pay(&[(0, 150)]),
            Err(LedgerError::SettlementSumMismatch { pot: 200 }.into())
        );
        assert_eq!(t.stacks(), before);
        assert_eq!(t.phase(), Some(Phase::Pay));

        // duplicate entries for one seat add up
        t.pay(&[(0, 150), (0, 50)]).unwrap();
        assert_eq!(t.stacks(), vec![1100, 900]);
        let log: Vec<_> = t.room.log().collect();
        assert_eq!(log.last(), Some(&"Payment: P0 +200."));
    }

    #[test]
    fn settlement_ignores_unknown_players_and_bad_shapes() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        t.act(1, Action::Bet(Some(10))).unwrap();
        t.act(0, Action::Call).unwrap();

        let id = t.room.players[1].id.to_string();
        let ghost = Uuid::new_v4().to_string();
        let payments = json!([
            {"playerId": ghost, "amount": 20},
            {"playerId": id, "amount": 20},
        ]);
        t.engine.settle(&mut t.room, Some(&payments)).unwrap();
        assert_eq!(t.stacks(), vec![990, 1010]);

        let mut t = Table::new(&[1000, 1000]);
        t.start();
        t.engine.go_to_pay(&mut t.room).unwrap();
        assert_eq!(
            t.engine.settle(&mut t.room, Some(&json!({"oops": true}))),
            Err(LedgerError::MalformedPayment.into())
        );
    }

    #[test]
    fn huge_stacks_keep_the_pot_exact() {
        let huge = ledger::coerce_stack(Some(&json!(i64::MAX)), 1000);
        let mut t = Table::new(&[huge, huge, huge]);
        t.start();
        t.act(1, Action::AllIn).unwrap();
        t.act(2, Action::AllIn).unwrap();
        t.act(0, Action::Call).unwrap();

        assert_eq!(t.phase(), Some(Phase::Pay));
        assert_eq!(t.room.pot(), 3 * MAX_STACK);
        assert_eq!(t.room.snapshot().pot, 3 * MAX_STACK);

        t.pay(&[(0, 3 * MAX_STACK)]).unwrap();
        assert_eq!(t.stacks(), vec![3 * MAX_STACK, 0, 0]);
    }

    #[test]
    fn settlement_only_in_pay_phase() {
        let mut t = Table::new(&[1000, 1000]);
        assert_eq!(t.pay(&[]), Err(Rejection::NoRound.into()));
        t.start();
        assert_eq!(t.pay(&[]), Err(Rejection::WrongPhase(Phase::Running).into()));
    }

    #[test]
    fn phases_never_go_backwards() {
        let mut t = Table::new(&[1000, 1000]);
        assert_eq!(t.engine.go_to_pay(&mut t.room), Err(Rejection::NoRound));
        t.start();
        assert_eq!(
            t.engine.next_round(&mut t.room),
            Err(Rejection::WrongPhase(Phase::Running))
        );
        t.engine.go_to_pay(&mut t.room).unwrap();
        assert_eq!(
            t.engine.go_to_pay(&mut t.room),
            Err(Rejection::WrongPhase(Phase::Pay))
        );
        t.pay(&[]).unwrap();
        assert_eq!(
            t.engine.go_to_pay(&mut t.room),
            Err(Rejection::WrongPhase(Phase::Ended))
        );
    }

    #[test]
    fn next_round_moves_the_dealer() {
        let mut t = Table::new(&[1000, 1000, 1000]);
        t.start();
        t.engine.go_to_pay(&mut t.room).unwrap();
        t.pay(&[]).unwrap();
        t.engine.next_round(&mut t.room).unwrap();
        assert_eq!(t.room.dealer_index, 1);
        assert!(t.room.round.is_none());
        assert_eq!(t.room.log().count(), 0);

        t.start();
        assert_eq!(t.turn(), Some(2));
    }

    #[test]
    fn disconnected_actor_freezes_the_round() {
        let mut t = Table::new(&[1000, 1000]);
        t.start();
        let conn = t.conns[1];
        t.room.players[1].connection = None;
        assert_eq!(
            t.engine.act(&mut t.room, conn, Action::Check),
            Err(Rejection::NotYourTurn)
        );
        assert_eq!(t.turn(), Some(1));
    }

    #[test]
    fn chips_and_turns_stay_consistent_over_long_play() {
        // Deterministic pseudo-random walk through actions.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        let mut t = Table::new(&[1000, 1500, 800, 2000]);
        let total: u64 = t.stacks().iter().sum();

        for _ in 0..200 {
            t.start();
            let mut guard = 0;
            while t.phase() == Some(Phase::Running) {
                guard += 1;
                assert!(guard < 10_000, "round never closed");

                let seat = t.turn().expect("running round has an actor");
                let p = &t.room.players[seat];
                assert!(p.in_round && !p.folded);

                let action = match next() % 6 {
                    0 => Action::Fold,
                    1 => Action::Check,
                    2 => Action::Call,
                    3 => Action::AllIn,
                    _ => Action::Bet(Some((p.street_put + 1 + next() % 300) as i64)),
                };
                if t.act(seat, action).is_err() {
                    // fall back to something always legal
                    let current_bet = t.room.round.as_ref().unwrap().current_bet;
                    let owed = ledger::amount_owed(current_bet, t.room.players[seat].street_put);
                    let fallback = if owed > 0 { Action::Call } else { Action::Check };
                    t.act(seat, fallback).unwrap();
                }

                let committed: u64 = t.room.pot();
                let stacks: u64 = t.stacks().iter().sum();
                if t.phase() != Some(Phase::Ended) {
                    assert_eq!(committed + stacks, total);
                }
            }

            if t.phase() == Some(Phase::Pay) {
                let pot = t.room.pot();
                let winner = (next() % 4) as usize;
                let pairs = if pot > 0 { vec![(winner, pot)] } else { vec![] };
                t.pay(&pairs).unwrap();
            }
            assert_eq!(t.phase(), Some(Phase::Ended));
            assert_eq!(t.stacks().iter().sum::<u64>(), total);
            t.engine.next_round(&mut t.room).unwrap();
        }
    }
}
