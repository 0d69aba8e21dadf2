use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Notifications observable by off-chain listeners
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player joined the current round
    RaffleEnter { player: Pubkey },
    /// A draw was committed and randomness requested
    RequestedRaffleWinner { request_id: u64 },
    /// The round closed and the pot went to `winner`
    WinnerPicked { winner: Pubkey },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match self {
            RaffleEvent::RaffleEnter { player } => msg!("RaffleEnter: {}", player),
            RaffleEvent::RequestedRaffleWinner { request_id } => {
                msg!("RequestedRaffleWinner: {}", request_id)
            }
            RaffleEvent::WinnerPicked { winner } => msg!("WinnerPicked: {}", winner),
        }
        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
