// Lottery program - account helpers
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, pubkey::Pubkey,
};

use crate::{
    raffle_error::RaffleError,
    raffle_state::{PrizeTransfer, RAFFLE_SEED},
};

/// Find the program derived address of the raffle
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

/// Pays the prize straight out of the program-owned raffle account into
/// whichever supplied account matches the winner.
pub struct LamportPayout<'a, 'b> {
    pub vault: &'b AccountInfo<'a>,
    pub recipients: &'b [AccountInfo<'a>],
}

impl<'a, 'b> PrizeTransfer for LamportPayout<'a, 'b> {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> ProgramResult {
        let recipient = self
            .recipients
            .iter()
            .find(|account| account.key == winner)
            .ok_or_else(|| {
                msg!("Winner account {} was not supplied", winner);
                RaffleError::TransferFailed
            })?;

        if !recipient.is_writable {
            msg!("Winner account {} is not writable", winner);
            return Err(RaffleError::TransferFailed.into());
        }

        let vault_lamports = self
            .vault
            .lamports()
            .checked_sub(amount)
            .ok_or(RaffleError::TransferFailed)?;
        let recipient_lamports = recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::TransferFailed)?;

        **self.vault.try_borrow_mut_lamports()? = vault_lamports;
        **recipient.try_borrow_mut_lamports()? = recipient_lamports;

        msg!("Paid {} SOL to {}", lamports_to_sol(amount), winner);
        Ok(())
    }
}
