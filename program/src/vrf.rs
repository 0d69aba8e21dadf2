// VRF coordinator integration for the lottery program
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
};

/// Seed of the coordinator-owned PDA that signs every fulfillment callback
pub const FULFILLMENT_SEED: &[u8] = b"fulfillment";

/// Parameters of one randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    /// Gas lane (key hash) selecting the oracle's price tier
    pub gas_lane: [u8; 32],
    /// Subscription the request is billed to
    pub subscription_id: u64,
    /// Confirmations the oracle waits before answering
    pub request_confirmations: u16,
    /// Compute budget reserved for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Number of random words to deliver
    pub num_words: u32,
}

/// Instructions understood by a VRF coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Request random words. The coordinator answers with the request id
    /// (u64, little endian) as return data.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The consumer issuing the request
    /// Remaining accounts are coordinator specific and passed through untouched
    RequestRandomWords(RandomWordsRequest),
}

/// Source of randomness requests. The fulfillment comes back later as a
/// separate `FulfillRandomWords` instruction.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, ProgramError>;
}

/// Issues requests to an on-chain coordinator through CPI, signing as the consumer PDA
pub struct CoordinatorCpi<'a, 'b> {
    pub coordinator_program: &'b AccountInfo<'a>,
    pub consumer: &'b AccountInfo<'a>,
    pub consumer_seeds: &'b [&'b [u8]],
    pub coordinator_accounts: &'b [AccountInfo<'a>],
}

impl<'a, 'b> RandomnessOracle for CoordinatorCpi<'a, 'b> {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, ProgramError> {
        let mut accounts = vec![AccountMeta::new_readonly(*self.consumer.key, true)];
        accounts.extend(self.coordinator_accounts.iter().map(|acc| AccountMeta {
            pubkey: *acc.key,
            is_signer: acc.is_signer,
            is_writable: acc.is_writable,
        }));

        let instruction = Instruction::new_with_borsh(
            *self.coordinator_program.key,
            &CoordinatorInstruction::RequestRandomWords(request.clone()),
            accounts,
        );

        let mut account_infos = Vec::with_capacity(self.coordinator_accounts.len() + 2);
        account_infos.push(self.consumer.clone());
        account_infos.extend_from_slice(self.coordinator_accounts);
        account_infos.push(self.coordinator_program.clone());

        invoke_signed(&instruction, &account_infos, &[self.consumer_seeds])?;

        decode_request_id(self.coordinator_program.key, get_return_data())
    }
}

/// Reads the request id the coordinator left in the return data buffer
pub fn decode_request_id(
    coordinator: &Pubkey,
    return_data: Option<(Pubkey, Vec<u8>)>,
) -> Result<u64, ProgramError> {
    let (program_id, data) = return_data.ok_or_else(|| {
        msg!("VRF coordinator did not return a request id");
        ProgramError::InvalidAccountData
    })?;

    if program_id != *coordinator {
        msg!("Return data was set by {}, expected coordinator {}", program_id, coordinator);
        return Err(ProgramError::IncorrectProgramId);
    }

    if data.len() < 8 {
        msg!("Request id must be 8 bytes, got {}", data.len());
        return Err(ProgramError::InvalidAccountData);
    }

    Ok(u64::from_le_bytes(*array_ref![data, 0, 8]))
}

/// Address of the PDA a coordinator signs fulfillments with
pub fn find_fulfillment_authority(coordinator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[FULFILLMENT_SEED], coordinator)
}

/// Maps a random word onto a player slot. `None` when there is nobody to pick.
pub fn winner_index(random_word: u64, player_count: usize) -> Option<usize> {
    if player_count == 0 {
        return None;
    }
    Some((random_word % player_count as u64) as usize)
}
