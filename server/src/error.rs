use chipledger_protocol::Phase;
use thiserror::Error;

/// Failures reported back to the requesting connection as `errorMsg`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Room not found.")]
    RoomNotFound,
    #[error("Enter a name.")]
    InvalidName,
    #[error("Payments must add up to exactly {pot}.")]
    SettlementSumMismatch { pot: u64 },
    #[error("Invalid payment.")]
    MalformedPayment,
}

/// Requests that are dropped without telling the client. Logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no round in progress")]
    NoRound,
    #[error("round is in phase {0}")]
    WrongPhase(Phase),
    #[error("need at least two players")]
    TooFewPlayers,
    #[error("not this connection's turn")]
    NotYourTurn,
    #[error("chips are owed, cannot check")]
    OwesChips,
    #[error("nothing owed, cannot call")]
    NothingOwed,
    #[error("bet target does not raise the player's own commitment")]
    InvalidBet,
    #[error("stack below the all-in minimum")]
    BelowAllInMinimum,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("ignored: {0}")]
    Ignored(#[from] Rejection),
}

pub type RequestResult<T = ()> = Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(LedgerError::RoomNotFound.to_string(), "Room not found.");
        assert_eq!(
            LedgerError::SettlementSumMismatch { pot: 200 }.to_string(),
            "Payments must add up to exactly 200."
        );
        let wrapped: RequestError = Rejection::WrongPhase(Phase::Pay).into();
        assert_eq!(wrapped.to_string(), "ignored: round is in phase pay");
    }
}
