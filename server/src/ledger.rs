//! Chip arithmetic and loose-number coercion.
//!
//! Everything here is floor-integer and never goes negative: a commit is
//! capped at the player's stack, and wire values that are not usable
//! numbers simply come back as `None`.

use chipledger_protocol::{PlayerId, MAX_STACK};
use serde_json::Value;

use crate::error::LedgerError;
use crate::room::Player;

/// Floor a loosely typed JSON value to an integer.
///
/// Numbers are floored, numeric strings are parsed (blank counts as 0),
/// booleans are 1/0 and `null` is 0. Anything else is unusable.
pub fn coerce_int(value: &Value) -> Option<i64> {
    let x = match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => return Some(i),
            None => n.as_f64()?,
        },
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        Value::Array(_) | Value::Object(_) => return None,
    };
    x.is_finite().then(|| x.floor() as i64)
}

/// Starting stack for a new seat: within `0..=MAX_STACK`, `default` when unusable or absent.
pub fn coerce_stack(value: Option<&Value>, default: u64) -> u64 {
    let stack = match value.map(coerce_int) {
        Some(Some(n)) => n.max(0) as u64,
        _ => default,
    };
    stack.min(MAX_STACK)
}

pub fn amount_owed(current_bet: u64, street_put: u64) -> u64 {
    current_bet.saturating_sub(street_put)
}

/// Move up to `amount` chips from the player's stack into their commitment.
/// Returns what was actually paid.
pub fn commit_chips(player: &mut Player, amount: u64) -> u64 {
    let pay = amount.min(player.stack);
    player.stack -= pay;
    player.street_put += pay;
    player.total_put += pay;
    pay
}

pub fn total_pot(players: &[Player]) -> u64 {
    players
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.total_put))
}

/// Validate a `host:pay` payment list.
///
/// The list itself must be an array (absent means empty). Entries without a
/// parsable `playerId` or with a non-positive `amount` are dropped.
pub fn parse_payments(value: Option<&Value>) -> Result<Vec<(PlayerId, u64)>, LedgerError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(LedgerError::MalformedPayment),
    };

    let parsed = items
        .iter()
        .filter_map(|item| {
            let id = item.get("playerId")?.as_str()?.trim().parse::<PlayerId>().ok()?;
            let amount = item.get("amount").and_then(coerce_int)?;
            (amount > 0).then_some((id, amount as u64))
        })
        .collect();
    Ok(parsed)
}
