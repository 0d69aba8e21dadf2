use solana_program::{decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Amount tendered is below the entrance fee
    #[error("Not enough lamports sent to enter the raffle")]
    InsufficientPayment,

    /// Entries are closed while a draw is in flight
    #[error("Raffle not open")]
    RaffleNotOpen,

    /// The readiness predicate does not hold
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// The fulfillment does not match the outstanding randomness request
    #[error("Nonexistent request")]
    RequestNotFound,

    /// Player index is past the end of the players list
    #[error("Player index out of range")]
    IndexOutOfRange,

    /// The prize could not be delivered to the winner
    #[error("Transfer to winner failed")]
    TransferFailed,

    /// The raffle account cannot hold more players
    #[error("Raffle is full")]
    RaffleFull,

    /// Only the configured coordinator may deliver randomness
    #[error("Only the VRF coordinator can fulfill")]
    OnlyCoordinatorCanFulfill,

    #[error("Arithmetic overflow")]
    MathOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
