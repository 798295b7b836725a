use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::{field, Discriminator, Fields, InstructionSpec, Layout};
use crate::protocol::marinade::accounts::{
    liq_pool_msol_leg_authority, liq_pool_sol_leg, msol_mint_authority, reserve_address,
};
use crate::protocol::marinade::types::State;
use crate::utils::token::associated_token_address;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

pub const DEPOSIT: InstructionSpec = InstructionSpec::new(
    "deposit",
    Discriminator::Anchor([0xf2, 0x23, 0xc6, 0x89, 0x52, 0xe1, 0xf2, 0xb6]),
    &[field("lamports", Layout::U64)],
);
pub const LIQUID_UNSTAKE: InstructionSpec = InstructionSpec::new(
    "liquid_unstake",
    Discriminator::Anchor([0x1e, 0x1e, 0x77, 0xf0, 0xbf, 0xe3, 0x0c, 0x10]),
    &[field("msol_amount", Layout::U64)],
);

pub const INSTRUCTIONS: &[InstructionSpec] = &[DEPOSIT, LIQUID_UNSTAKE];

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositArgs {
    pub lamports: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidUnstakeArgs {
    pub msol_amount: u64,
}

/// Stakes `lamports` from `payer` and mints mSOL to `msol_destination`,
/// which defaults to the payer's associated mSOL account.
pub fn deposit(
    programs: &ProgramRegistry,
    state: &State,
    payer: &Pubkey,
    msol_destination: Option<&Pubkey>,
    lamports: u64,
) -> Result<Instruction> {
    let mint_to = msol_destination
        .copied()
        .unwrap_or_else(|| associated_token_address(payer, &state.msol_mint));
    let sol_leg = liq_pool_sol_leg(programs, state)?;
    let msol_leg_authority = liq_pool_msol_leg_authority(programs, state)?;
    let reserve = reserve_address(programs, state)?;
    let mint_authority = msol_mint_authority(programs, state)?;
    let accounts = vec![
        AccountMeta::new(state.address, false),                 // 1. state
        AccountMeta::new(state.msol_mint, false),               // 2. msolMint
        AccountMeta::new(sol_leg, false),                       // 3. liqPoolSolLegPda
        AccountMeta::new(state.liq_pool.msol_leg, false),       // 4. liqPoolMsolLeg
        AccountMeta::new_readonly(msol_leg_authority, false),   // 5. liqPoolMsolLegAuthority
        AccountMeta::new(reserve, false),                       // 6. reservePda
        AccountMeta::new(*payer, true),                         // 7. transferFrom (signer)
        AccountMeta::new(mint_to, false),                       // 8. mintTo
        AccountMeta::new_readonly(mint_authority, false),       // 9. msolMintAuthority
        AccountMeta::new_readonly(system_program::id(), false), // 10. systemProgram
        AccountMeta::new_readonly(spl_token::id(), false),      // 11. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.marinade,
        accounts,
        data: DEPOSIT.encode(&Fields::new().with("lamports", lamports))?,
    })
}

/// Swaps `msol_amount` of the owner's mSOL for SOL through the liquidity pool.
pub fn liquid_unstake(
    programs: &ProgramRegistry,
    state: &State,
    owner: &Pubkey,
    msol_source: Option<&Pubkey>,
    sol_destination: &Pubkey,
    msol_amount: u64,
) -> Result<Instruction> {
    let get_msol_from = msol_source
        .copied()
        .unwrap_or_else(|| associated_token_address(owner, &state.msol_mint));
    let accounts = vec![
        AccountMeta::new(state.address, false),                      // 1. state
        AccountMeta::new(state.msol_mint, false),                    // 2. msolMint
        AccountMeta::new(liq_pool_sol_leg(programs, state)?, false), // 3. liqPoolSolLegPda
        AccountMeta::new(state.liq_pool.msol_leg, false),            // 4. liqPoolMsolLeg
        AccountMeta::new(state.treasury_msol_account, false),        // 5. treasuryMsolAccount
        AccountMeta::new(get_msol_from, false),                      // 6. getMsolFrom
        AccountMeta::new_readonly(*owner, true),                     // 7. getMsolFromAuthority (signer)
        AccountMeta::new(*sol_destination, false),                   // 8. transferSolTo
        AccountMeta::new_readonly(system_program::id(), false),      // 9. systemProgram
        AccountMeta::new_readonly(spl_token::id(), false),           // 10. tokenProgram
    ];
    log::debug!("Liquid unstake of {} mSOL to {}", msol_amount, sol_destination);
    Ok(Instruction {
        program_id: programs.marinade,
        accounts,
        data: LIQUID_UNSTAKE.encode(&Fields::new().with("msol_amount", msol_amount))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::decode_args;
    use crate::layout::discriminator::anchor_instruction;
    use crate::protocol::marinade::accounts::{
        LIQ_MSOL_LEG_AUTHORITY_SEED, LIQ_SOL_LEG_SEED, MSOL_MINT_AUTHORITY_SEED, RESERVE_SEED,
    };
    use proptest::prelude::*;

    fn state(programs: &ProgramRegistry) -> State {
        let address = Pubkey::new_unique();
        let bump = |seed: &[u8]| {
            Pubkey::find_program_address(&[address.as_ref(), seed], &programs.marinade).1
        };
        let mut state = State {
            address,
            msol_mint: Pubkey::new_unique(),
            treasury_msol_account: Pubkey::new_unique(),
            reserve_bump_seed: bump(RESERVE_SEED),
            msol_mint_authority_bump_seed: bump(MSOL_MINT_AUTHORITY_SEED),
            ..State::default()
        };
        state.liq_pool.msol_leg = Pubkey::new_unique();
        state.liq_pool.sol_leg_bump_seed = bump(LIQ_SOL_LEG_SEED);
        state.liq_pool.msol_leg_authority_bump_seed = bump(LIQ_MSOL_LEG_AUTHORITY_SEED);
        state
    }

    #[test]
    fn test_discriminators() {
        for spec in INSTRUCTIONS {
            assert_eq!(
                spec.discriminator,
                Discriminator::Anchor(anchor_instruction(spec.name)),
                "{}",
                spec.name
            );
        }
    }

    #[test]
    fn test_deposit_defaults_to_payer_ata() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let state = state(&programs);
        let payer = Pubkey::new_unique();
        let ix = deposit(&programs, &state, &payer, None, 1_000_000_000).unwrap();
        assert_eq!(ix.accounts.len(), 11);
        assert_eq!(ix.accounts[6], AccountMeta::new(payer, true));
        assert_eq!(ix.accounts[7].pubkey, associated_token_address(&payer, &state.msol_mint));
        assert_eq!(ix.accounts[5].pubkey, reserve_address(&programs, &state).unwrap());

        let explicit = Pubkey::new_unique();
        let ix = deposit(&programs, &state, &payer, Some(&explicit), 1).unwrap();
        assert_eq!(ix.accounts[7].pubkey, explicit);
    }

    #[test]
    fn test_liquid_unstake_accounts() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let state = state(&programs);
        let owner = Pubkey::new_unique();
        let to = Pubkey::new_unique();
        let ix = liquid_unstake(&programs, &state, &owner, None, &to, 42).unwrap();
        assert_eq!(ix.accounts.len(), 10);
        assert_eq!(ix.accounts[4].pubkey, state.treasury_msol_account);
        assert_eq!(ix.accounts[6], AccountMeta::new_readonly(owner, true));
        assert_eq!(ix.accounts[7], AccountMeta::new(to, false));
        assert_eq!(
            LIQUID_UNSTAKE.decode(&ix.data).unwrap().u64("msol_amount").unwrap(),
            42
        );
    }

    proptest! {
        #[test]
        fn deposit_lamports_survive_encoding(lamports in any::<u64>()) {
            let data = DEPOSIT.encode(&Fields::new().with("lamports", lamports)).unwrap();
            prop_assert_eq!(
                decode_args::<DepositArgs>(&DEPOSIT, &data).unwrap(),
                DepositArgs { lamports }
            );
            let data = LIQUID_UNSTAKE.encode(&Fields::new().with("msol_amount", lamports)).unwrap();
            prop_assert_eq!(
                decode_args::<LiquidUnstakeArgs>(&LIQUID_UNSTAKE, &data).unwrap(),
                LiquidUnstakeArgs { msol_amount: lamports }
            );
        }
    }
}
