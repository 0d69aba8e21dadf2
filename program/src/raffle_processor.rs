use crate::events::RaffleEvent;
use crate::raffle_error::RaffleError;
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{Raffle, RaffleConfig, UpkeepResponse, RAFFLE_SEED};
use crate::utils::{find_raffle_address, lamports_to_sol, LamportPayout};
use crate::vrf::{self, CoordinatorCpi};

use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize(config) => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Creates the raffle PDA and stores its immutable parameters.
    /// Only succeeds once per program.
    fn process_initialize(
        accounts: &[AccountInfo],
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        config.validate()?;

        let (expected_raffle_pubkey, bump_seed) = find_raffle_address(program_id);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        let bump = [bump_seed];
        let raffle_seeds: &[&[u8]] = &[RAFFLE_SEED, &bump];
        let required_lamports = rent.minimum_balance(Raffle::LEN);

        if raffle_info.lamports() == 0 {
            invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    raffle_info.key,
                    required_lamports,
                    Raffle::LEN as u64,
                    program_id,
                ),
                &[payer_info.clone(), raffle_info.clone(), system_program_info.clone()],
                &[raffle_seeds],
            )?;
        } else {
            // The address already holds lamports, so create_account would fail.
            // Top up to rent exemption, then allocate and assign in place.
            let top_up = required_lamports.saturating_sub(raffle_info.lamports());
            if top_up > 0 {
                invoke(
                    &system_instruction::transfer(payer_info.key, raffle_info.key, top_up),
                    &[payer_info.clone(), raffle_info.clone(), system_program_info.clone()],
                )?;
            }
            invoke_signed(
                &system_instruction::allocate(raffle_info.key, Raffle::LEN as u64),
                &[raffle_info.clone(), system_program_info.clone()],
                &[raffle_seeds],
            )?;
            invoke_signed(
                &system_instruction::assign(raffle_info.key, program_id),
                &[raffle_info.clone(), system_program_info.clone()],
                &[raffle_seeds],
            )?;
        }

        let clock = Clock::get()?;
        let (fulfillment_authority, _) = vrf::find_fulfillment_authority(&config.vrf_coordinator);
        let raffle = Raffle::new(&config, fulfillment_authority, bump_seed, clock.unix_timestamp);
        raffle.save(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: Fee={} SOL, Interval={}s, Coordinator={}, Subscription={}",
            lamports_to_sol(config.entrance_fee),
            config.interval,
            config.vrf_coordinator,
            config.subscription_id
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        raffle.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[player_info.clone(), raffle_info.clone(), system_program_info.clone()],
        )?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RaffleEnter {
            player: *player_info.key,
        }
        .emit();
        msg!(
            "Entered with {} lamports. Players: {}, Pot: {} SOL",
            amount,
            raffle.num_players(),
            lamports_to_sol(raffle.balance())
        );
        Ok(())
    }

    /// Read-only readiness check for keepers
    fn process_check_upkeep(
        accounts: &[AccountInfo],
        _check_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;

        let upkeep_needed = match raffle.upkeep_status(clock.unix_timestamp) {
            Ok(()) => true,
            Err(blocker) => {
                msg!("Upkeep not needed: {}", blocker);
                false
            }
        };

        let response = UpkeepResponse {
            upkeep_needed,
            perform_data: Vec::new(),
        };
        set_return_data(&response.try_to_vec()?);

        msg!("Upkeep needed: {}", upkeep_needed);
        Ok(())
    }

    /// Closes entries and requests randomness. Anyone may call it once
    /// the readiness predicate holds.
    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        _perform_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let coordinator_accounts = account_info_iter.as_slice();

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if *coordinator_info.key != raffle.vrf_coordinator {
            msg!("VRF coordinator does not match the one configured for this raffle");
            return Err(ProgramError::IncorrectProgramId);
        }

        let clock = Clock::get()?;
        let bump = [raffle.bump];
        let consumer_seeds: &[&[u8]] = &[RAFFLE_SEED, &bump];
        let mut coordinator = CoordinatorCpi {
            coordinator_program: coordinator_info,
            consumer: raffle_info,
            consumer_seeds,
            coordinator_accounts,
        };

        let request_id = raffle.request_winner(clock.unix_timestamp, &mut coordinator)?;
        raffle.save(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RequestedRaffleWinner { request_id }.emit();
        msg!(
            "Randomness requested for {} players, Pot: {} SOL",
            raffle.num_players(),
            lamports_to_sol(raffle.balance())
        );
        Ok(())
    }

    /// Coordinator callback: picks the winner, pays the pot and reopens
    /// entries, all or nothing.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let recipients = account_info_iter.as_slice();

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if !authority_info.is_signer || *authority_info.key != raffle.fulfillment_authority {
            msg!(
                "Fulfillment must be signed by the coordinator authority {}",
                raffle.fulfillment_authority
            );
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }

        let clock = Clock::get()?;
        let mut payout = LamportPayout {
            vault: raffle_info,
            recipients,
        };

        let winner = raffle.fulfill_random_words(
            request_id,
            random_words,
            clock.unix_timestamp,
            &mut payout,
        )?;
        raffle.save(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::WinnerPicked { winner }.emit();
        Ok(())
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(&raffle_info.data.borrow())?;
        if !raffle.is_initialized {
            msg!("Raffle account is not initialized");
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }
}
