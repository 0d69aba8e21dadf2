use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{raffle_state::RaffleConfig, utils::find_raffle_address, vrf::find_fulfillment_authority};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle account and fix its parameters
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding the raffle account
    /// 1. `[writable]` The raffle account (PDA, seed "raffle")
    /// 2. `[]` The system program
    Initialize(RaffleConfig),

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports tendered, at least the entrance fee
        amount: u64,
    },

    /// Evaluate whether a draw is due. Sets `UpkeepResponse` as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close entries and request randomness from the VRF coordinator
    ///
    /// Accounts expected:
    /// 0. `[writable]` The raffle account
    /// 1. `[]` The VRF coordinator program
    /// Remaining accounts are passed through to the coordinator
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver randomness for the outstanding request (coordinator only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator's fulfillment authority
    /// 1. `[writable]` The raffle account
    /// Remaining `[writable]` accounts are candidate prize recipients
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Create initialize instruction
pub fn initialize(program_id: &Pubkey, payer: &Pubkey, config: RaffleConfig) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::Initialize(config),
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, player: &Pubkey, amount: u64) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::EnterRaffle { amount },
        vec![
            AccountMeta::new(*player, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, check_data: Vec<u8>) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::CheckUpkeep { check_data },
        vec![AccountMeta::new_readonly(raffle, false)],
    )
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    vrf_coordinator: &Pubkey,
    coordinator_accounts: &[AccountMeta],
    perform_data: Vec<u8>,
) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    let mut accounts = vec![
        AccountMeta::new(raffle, false),
        AccountMeta::new_readonly(*vrf_coordinator, false),
    ];
    accounts.extend_from_slice(coordinator_accounts);

    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::PerformUpkeep { perform_data },
        accounts,
    )
}

/// Create fulfill_random_words instruction, as sent by the coordinator
pub fn fulfill_random_words(
    program_id: &Pubkey,
    vrf_coordinator: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
    recipients: &[Pubkey],
) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id);
    let (authority, _) = find_fulfillment_authority(vrf_coordinator);
    let mut accounts = vec![
        AccountMeta::new_readonly(authority, true),
        AccountMeta::new(raffle, false),
    ];
    accounts.extend(recipients.iter().map(|recipient| AccountMeta::new(*recipient, false)));

    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::FulfillRandomWords {
            request_id,
            random_words,
        },
        accounts,
    )
}
