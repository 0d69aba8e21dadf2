use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};
use std::fmt;

use crate::raffle_error::RaffleError;
use crate::vrf::{self, RandomWordsRequest, RandomnessOracle};

/// Seed of the raffle PDA
pub const RAFFLE_SEED: &[u8] = b"raffle";
/// Confirmations the oracle waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;
/// Entries one raffle account has room for
pub const MAX_PLAYERS: usize = 128;

/// Status of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness requested, waiting for the coordinator to fulfill
    Calculating,
}

/// Parameters fixed at initialization
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Program id of the VRF coordinator serving this raffle
    pub vrf_coordinator: Pubkey,
    /// Coordinator subscription billed for requests
    pub subscription_id: u64,
    /// Gas lane (key hash) used for requests
    pub gas_lane: [u8; 32],
    /// Compute budget the coordinator reserves for the callback
    pub callback_gas_limit: u32,
    /// Minimum lamports to enter
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: i64,
}

impl RaffleConfig {
    pub fn validate(&self) -> ProgramResult {
        if self.interval < 0 {
            msg!("Interval cannot be negative: {}", self.interval);
            return Err(ProgramError::InvalidArgument);
        }
        Ok(())
    }
}

/// Context kept for the single in-flight randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub requested_at: UnixTimestamp,
    pub player_count: u32,
}

/// First unmet condition of the readiness predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpkeepBlocker {
    NotOpen,
    IntervalNotElapsed { elapsed: i64, interval: i64 },
    NoPlayers,
    NoBalance,
}

impl fmt::Display for UpkeepBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpkeepBlocker::NotOpen => write!(f, "raffle is not open"),
            UpkeepBlocker::IntervalNotElapsed { elapsed, interval } => {
                write!(f, "only {}s of {}s elapsed", elapsed, interval)
            }
            UpkeepBlocker::NoPlayers => write!(f, "no players"),
            UpkeepBlocker::NoBalance => write!(f, "no balance"),
        }
    }
}

/// Return data of `CheckUpkeep`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpkeepResponse {
    pub upkeep_needed: bool,
    pub perform_data: Vec<u8>,
}

/// Outcome of a fulfillment, computed before anything is committed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub request_id: u64,
    pub winner_index: usize,
    pub winner: Pubkey,
    pub prize: u64,
}

/// Moves the pot to the winner. An error aborts the whole fulfillment.
pub trait PrizeTransfer {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> ProgramResult;
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump of the raffle PDA
    pub bump: u8,
    /// VRF coordinator program
    pub vrf_coordinator: Pubkey,
    /// Coordinator PDA allowed to deliver randomness
    pub fulfillment_authority: Pubkey,
    pub subscription_id: u64,
    pub gas_lane: [u8; 32],
    pub callback_gas_limit: u32,
    /// Minimum lamports to enter
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: i64,
    pub state: RaffleState,
    /// Time of the last draw, or of initialization
    pub last_timestamp: UnixTimestamp,
    /// Last paid out player
    pub recent_winner: Option<Pubkey>,
    /// In-flight randomness request
    pub pending_request: Option<PendingRequest>,
    /// Lamports held for the current round
    pub pot: u64,
    /// Entries in order, one slot per entry
    pub players: Vec<Pubkey>,
}

impl Raffle {
    /// Serialized size of everything but the players list
    pub const FIXED_LEN: usize = 1 + 1 + 32 + 32 + 8 + 32 + 4 + 8 + 8 + 1 + 8 + 33 + 21 + 8;
    /// Account size with room for `MAX_PLAYERS` entries
    pub const LEN: usize = Self::FIXED_LEN + 4 + MAX_PLAYERS * 32;

    pub fn new(
        config: &RaffleConfig,
        fulfillment_authority: Pubkey,
        bump: u8,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            vrf_coordinator: config.vrf_coordinator,
            fulfillment_authority,
            subscription_id: config.subscription_id,
            gas_lane: config.gas_lane,
            callback_gas_limit: config.callback_gas_limit,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: None,
            pending_request: None,
            pot: 0,
            players: Vec::new(),
        }
    }

    /// Decodes account data. Bytes past the players list are ignored.
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = src;
        Raffle::deserialize(&mut buf).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn save(&self, dst: &mut [u8]) -> ProgramResult {
        let mut writer = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Records an entry of `amount` lamports by `player`
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> ProgramResult {
        if amount < self.entrance_fee {
            msg!("Sent {} lamports, entrance fee is {}", amount, self.entrance_fee);
            return Err(RaffleError::InsufficientPayment.into());
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen.into());
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull.into());
        }

        self.pot = self
            .pot
            .checked_add(amount)
            .ok_or(RaffleError::MathOverflow)?;
        self.players.push(player);
        Ok(())
    }

    /// Readiness predicate, reporting the first unmet condition
    pub fn upkeep_status(&self, now: UnixTimestamp) -> Result<(), UpkeepBlocker> {
        if self.state != RaffleState::Open {
            return Err(UpkeepBlocker::NotOpen);
        }
        let elapsed = now.saturating_sub(self.last_timestamp);
        if elapsed < self.interval {
            return Err(UpkeepBlocker::IntervalNotElapsed {
                elapsed,
                interval: self.interval,
            });
        }
        if self.players.is_empty() {
            return Err(UpkeepBlocker::NoPlayers);
        }
        if self.pot == 0 {
            return Err(UpkeepBlocker::NoBalance);
        }
        Ok(())
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> bool {
        self.upkeep_status(now).is_ok()
    }

    pub fn randomness_request(&self) -> RandomWordsRequest {
        RandomWordsRequest {
            gas_lane: self.gas_lane,
            subscription_id: self.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }

    /// Closes entries and asks the oracle for randomness. Nothing changes
    /// unless the oracle accepted the request.
    pub fn request_winner<O: RandomnessOracle>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<u64, ProgramError> {
        if let Err(blocker) = self.upkeep_status(now) {
            msg!(
                "Upkeep not needed: {} (balance={}, players={}, state={:?})",
                blocker,
                self.pot,
                self.players.len(),
                self.state
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let request_id = oracle.request_random_words(&self.randomness_request())?;

        self.state = RaffleState::Calculating;
        self.pending_request = Some(PendingRequest {
            request_id,
            requested_at: now,
            player_count: self.players.len() as u32,
        });
        Ok(request_id)
    }

    /// Works out who wins `request_id` without touching state
    pub fn settle(&self, request_id: u64, random_words: &[u64]) -> Result<Settlement, ProgramError> {
        let pending = match self.pending_request {
            Some(pending) if pending.request_id == request_id => pending,
            _ => {
                msg!("No outstanding request with id {}", request_id);
                return Err(RaffleError::RequestNotFound.into());
            }
        };

        // Entries are closed while calculating, so the roster must match the request
        if pending.player_count as usize != self.players.len() {
            msg!(
                "Request {} was issued for {} players, found {}",
                request_id,
                pending.player_count,
                self.players.len()
            );
            return Err(ProgramError::InvalidAccountData);
        }

        let random_word = *random_words.first().ok_or_else(|| {
            msg!("Fulfillment carried no random words");
            ProgramError::InvalidInstructionData
        })?;

        let winner_index = vrf::winner_index(random_word, self.players.len()).ok_or_else(|| {
            msg!("Pending request {} has no players to draw from", request_id);
            ProgramError::InvalidAccountData
        })?;

        Ok(Settlement {
            request_id,
            winner_index,
            winner: self.players[winner_index],
            prize: self.pot,
        })
    }

    /// Applies a settlement whose prize has already been delivered
    pub fn commit_settlement(&mut self, settlement: &Settlement, now: UnixTimestamp) {
        self.recent_winner = Some(settlement.winner);
        self.players.clear();
        self.state = RaffleState::Open;
        self.last_timestamp = now;
        self.pot = self.pot.saturating_sub(settlement.prize);
        self.pending_request = None;
    }

    /// Consumes the randomness for `request_id`: pick, pay, then reset the round
    pub fn fulfill_random_words<P: PrizeTransfer>(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<Pubkey, ProgramError> {
        let settlement = self.settle(request_id, random_words)?;
        let waited = self
            .pending_request
            .map_or(0, |pending| now.saturating_sub(pending.requested_at));
        msg!(
            "Random word {} picks index {} of {} after {}s",
            random_words[0],
            settlement.winner_index,
            self.players.len(),
            waited
        );

        payout.transfer_prize(&settlement.winner, settlement.prize)?;
        self.commit_settlement(&settlement, now);
        Ok(settlement.winner)
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Player at `index`; out of range means no such entry this round
    pub fn player(&self, index: usize) -> Result<Pubkey, RaffleError> {
        self.players
            .get(index)
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request.map(|pending| pending.request_id)
    }

    pub fn balance(&self) -> u64 {
        self.pot
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}
