use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::{field, Discriminator, Fields, InstructionSpec, Layout};
use crate::protocol::solend::accounts::derive_lending_market_authority;
use crate::protocol::solend::types::{Obligation, Reserve};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};

const LIQUIDITY_AMOUNT: &[crate::layout::Field] = &[field("liquidity_amount", Layout::U64)];
const COLLATERAL_AMOUNT: &[crate::layout::Field] = &[field("collateral_amount", Layout::U64)];

pub const REFRESH_RESERVE: InstructionSpec =
    InstructionSpec::new("refresh_reserve", Discriminator::Tag(3), &[]);
pub const DEPOSIT_RESERVE_LIQUIDITY: InstructionSpec =
    InstructionSpec::new("deposit_reserve_liquidity", Discriminator::Tag(4), LIQUIDITY_AMOUNT);
pub const REDEEM_RESERVE_COLLATERAL: InstructionSpec =
    InstructionSpec::new("redeem_reserve_collateral", Discriminator::Tag(5), COLLATERAL_AMOUNT);
pub const INIT_OBLIGATION: InstructionSpec =
    InstructionSpec::new("init_obligation", Discriminator::Tag(6), &[]);
pub const REFRESH_OBLIGATION: InstructionSpec =
    InstructionSpec::new("refresh_obligation", Discriminator::Tag(7), &[]);
pub const DEPOSIT_OBLIGATION_COLLATERAL: InstructionSpec =
    InstructionSpec::new("deposit_obligation_collateral", Discriminator::Tag(8), COLLATERAL_AMOUNT);
pub const WITHDRAW_OBLIGATION_COLLATERAL: InstructionSpec = InstructionSpec::new(
    "withdraw_obligation_collateral",
    Discriminator::Tag(9),
    COLLATERAL_AMOUNT,
);
pub const BORROW_OBLIGATION_LIQUIDITY: InstructionSpec =
    InstructionSpec::new("borrow_obligation_liquidity", Discriminator::Tag(10), LIQUIDITY_AMOUNT);
pub const REPAY_OBLIGATION_LIQUIDITY: InstructionSpec =
    InstructionSpec::new("repay_obligation_liquidity", Discriminator::Tag(11), LIQUIDITY_AMOUNT);
pub const LIQUIDATE_OBLIGATION: InstructionSpec =
    InstructionSpec::new("liquidate_obligation", Discriminator::Tag(12), LIQUIDITY_AMOUNT);
pub const DEPOSIT_RESERVE_LIQUIDITY_AND_OBLIGATION_COLLATERAL: InstructionSpec =
    InstructionSpec::new(
        "deposit_reserve_liquidity_and_obligation_collateral",
        Discriminator::Tag(14),
        LIQUIDITY_AMOUNT,
    );
pub const WITHDRAW_OBLIGATION_COLLATERAL_AND_REDEEM_RESERVE_COLLATERAL: InstructionSpec =
    InstructionSpec::new(
        "withdraw_obligation_collateral_and_redeem_reserve_collateral",
        Discriminator::Tag(15),
        COLLATERAL_AMOUNT,
    );

pub const INSTRUCTIONS: &[InstructionSpec] = &[
    REFRESH_RESERVE,
    DEPOSIT_RESERVE_LIQUIDITY,
    REDEEM_RESERVE_COLLATERAL,
    INIT_OBLIGATION,
    REFRESH_OBLIGATION,
    DEPOSIT_OBLIGATION_COLLATERAL,
    WITHDRAW_OBLIGATION_COLLATERAL,
    BORROW_OBLIGATION_LIQUIDITY,
    REPAY_OBLIGATION_LIQUIDITY,
    LIQUIDATE_OBLIGATION,
    DEPOSIT_RESERVE_LIQUIDITY_AND_OBLIGATION_COLLATERAL,
    WITHDRAW_OBLIGATION_COLLATERAL_AND_REDEEM_RESERVE_COLLATERAL,
];

/// Argument shape shared by every amount-taking instruction.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountArgs {
    pub amount: u64,
}

fn liquidity_amount(amount: u64) -> Fields {
    Fields::new().with("liquidity_amount", amount)
}

fn collateral_amount(amount: u64) -> Fields {
    Fields::new().with("collateral_amount", amount)
}

/// Accrues interest and refreshes the price. The extra oracle is appended
/// only for reserves that have one.
pub fn refresh_reserve(programs: &ProgramRegistry, reserve: &Reserve) -> Result<Instruction> {
    let mut accounts = vec![
        AccountMeta::new(reserve.address, false),                               // 1. reserve
        AccountMeta::new_readonly(reserve.liquidity.pyth_oracle, false),        // 2. pythPrice
        AccountMeta::new_readonly(reserve.liquidity.switchboard_oracle, false), // 3. switchboardFeed
    ];
    if let Some(extra_oracle) = reserve.extra_oracle {
        accounts.push(AccountMeta::new_readonly(extra_oracle, false)); // 4. extraOracle (optional)
    }
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: REFRESH_RESERVE.encode(&Fields::new())?,
    })
}

pub fn deposit_reserve_liquidity(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    liquidity_amount_in: u64,
    source_liquidity: &Pubkey,
    destination_collateral: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(*source_liquidity, false),                // 1. sourceLiquidity
        AccountMeta::new(*destination_collateral, false),          // 2. destinationCollateral
        AccountMeta::new(reserve.address, false),                  // 3. reserve
        AccountMeta::new(reserve.liquidity.supply_pubkey, false),  // 4. reserveLiquiditySupply
        AccountMeta::new(reserve.collateral.mint_pubkey, false),   // 5. reserveCollateralMint
        AccountMeta::new_readonly(reserve.lending_market, false),  // 6. lendingMarket
        AccountMeta::new_readonly(authority, false),               // 7. lendingMarketAuthority
        AccountMeta::new_readonly(*user_transfer_authority, true), // 8. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 9. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: DEPOSIT_RESERVE_LIQUIDITY.encode(&liquidity_amount(liquidity_amount_in))?,
    })
}

pub fn redeem_reserve_collateral(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    collateral_amount_in: u64,
    source_collateral: &Pubkey,
    destination_liquidity: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(*source_collateral, false),               // 1. sourceCollateral
        AccountMeta::new(*destination_liquidity, false),           // 2. destinationLiquidity
        AccountMeta::new(reserve.address, false),                  // 3. reserve
        AccountMeta::new(reserve.collateral.mint_pubkey, false),   // 4. reserveCollateralMint
        AccountMeta::new(reserve.liquidity.supply_pubkey, false),  // 5. reserveLiquiditySupply
        AccountMeta::new_readonly(reserve.lending_market, false),  // 6. lendingMarket
        AccountMeta::new_readonly(authority, false),               // 7. lendingMarketAuthority
        AccountMeta::new_readonly(*user_transfer_authority, true), // 8. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 9. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: REDEEM_RESERVE_COLLATERAL.encode(&collateral_amount(collateral_amount_in))?,
    })
}

/// `obligation` must already be created with `create_with_seed` and sized
/// to `OBLIGATION_LEN`.
pub fn init_obligation(
    programs: &ProgramRegistry,
    obligation: &Pubkey,
    lending_market: &Pubkey,
    obligation_owner: &Pubkey,
) -> Result<Instruction> {
    let accounts = vec![
        AccountMeta::new(*obligation, false),                 // 1. obligation
        AccountMeta::new_readonly(*lending_market, false),    // 2. lendingMarket
        AccountMeta::new_readonly(*obligation_owner, true),   // 3. obligationOwner (signer)
        AccountMeta::new_readonly(sysvar::rent::id(), false), // 4. rentSysvar
        AccountMeta::new_readonly(spl_token::id(), false),    // 5. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: INIT_OBLIGATION.encode(&Fields::new())?,
    })
}

/// Deposit reserves then borrow reserves, in the obligation's own order.
pub fn refresh_obligation(
    programs: &ProgramRegistry,
    obligation: &Obligation,
) -> Result<Instruction> {
    let mut accounts = vec![AccountMeta::new(obligation.address, false)]; // 1. obligation
    accounts.extend(
        obligation
            .deposit_reserves()
            .into_iter()
            .chain(obligation.borrow_reserves())
            .map(|reserve| AccountMeta::new_readonly(reserve, false)),
    );
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: REFRESH_OBLIGATION.encode(&Fields::new())?,
    })
}

pub fn deposit_obligation_collateral(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    collateral_amount_in: u64,
    source_collateral: &Pubkey,
    obligation_owner: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let accounts = vec![
        AccountMeta::new(*source_collateral, false),               // 1. sourceCollateral
        AccountMeta::new(reserve.collateral.supply_pubkey, false), // 2. destinationCollateral
        AccountMeta::new(reserve.address, false),                  // 3. depositReserve
        AccountMeta::new(*obligation, false),                      // 4. obligation
        AccountMeta::new_readonly(reserve.lending_market, false),  // 5. lendingMarket
        AccountMeta::new_readonly(*obligation_owner, true),        // 6. obligationOwner (signer)
        AccountMeta::new_readonly(*user_transfer_authority, true), // 7. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 8. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: DEPOSIT_OBLIGATION_COLLATERAL.encode(&collateral_amount(collateral_amount_in))?,
    })
}

pub fn withdraw_obligation_collateral(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    collateral_amount_in: u64,
    destination_collateral: &Pubkey,
    obligation_owner: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(reserve.collateral.supply_pubkey, false), // 1. sourceCollateral
        AccountMeta::new(*destination_collateral, false),          // 2. destinationCollateral
        AccountMeta::new_readonly(reserve.address, false),         // 3. withdrawReserve
        AccountMeta::new(*obligation, false),                      // 4. obligation
        AccountMeta::new_readonly(reserve.lending_market, false),  // 5. lendingMarket
        AccountMeta::new_readonly(authority, false),               // 6. lendingMarketAuthority
        AccountMeta::new_readonly(*obligation_owner, true),        // 7. obligationOwner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 8. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: WITHDRAW_OBLIGATION_COLLATERAL.encode(&collateral_amount(collateral_amount_in))?,
    })
}

/// `host_fee_receiver`, when given, is appended after the token program.
#[allow(clippy::too_many_arguments)]
pub fn borrow_obligation_liquidity(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    liquidity_amount_out: u64,
    destination_liquidity: &Pubkey,
    obligation_owner: &Pubkey,
    host_fee_receiver: Option<&Pubkey>,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let mut accounts = vec![
        AccountMeta::new(reserve.liquidity.supply_pubkey, false), // 1. sourceLiquidity
        AccountMeta::new(*destination_liquidity, false),          // 2. destinationLiquidity
        AccountMeta::new(reserve.address, false),                 // 3. borrowReserve
        AccountMeta::new(reserve.config.fee_receiver, false),     // 4. borrowReserveLiquidityFeeReceiver
        AccountMeta::new(*obligation, false),                     // 5. obligation
        AccountMeta::new_readonly(reserve.lending_market, false), // 6. lendingMarket
        AccountMeta::new_readonly(authority, false),              // 7. lendingMarketAuthority
        AccountMeta::new_readonly(*obligation_owner, true),       // 8. obligationOwner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),        // 9. tokenProgram
    ];
    if let Some(host) = host_fee_receiver {
        accounts.push(AccountMeta::new(*host, false)); // 10. hostFeeReceiver (optional)
    }
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: BORROW_OBLIGATION_LIQUIDITY.encode(&liquidity_amount(liquidity_amount_out))?,
    })
}

pub fn repay_obligation_liquidity(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    liquidity_amount_in: u64,
    source_liquidity: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let accounts = vec![
        AccountMeta::new(*source_liquidity, false),                // 1. sourceLiquidity
        AccountMeta::new(reserve.liquidity.supply_pubkey, false),  // 2. destinationLiquidity
        AccountMeta::new(reserve.address, false),                  // 3. repayReserve
        AccountMeta::new(*obligation, false),                      // 4. obligation
        AccountMeta::new_readonly(reserve.lending_market, false),  // 5. lendingMarket
        AccountMeta::new_readonly(*user_transfer_authority, true), // 6. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 7. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: REPAY_OBLIGATION_LIQUIDITY.encode(&liquidity_amount(liquidity_amount_in))?,
    })
}

/// Repays `repay_reserve` debt of `obligation` and seizes collateral from
/// `withdraw_reserve`.
#[allow(clippy::too_many_arguments)]
pub fn liquidate_obligation(
    programs: &ProgramRegistry,
    repay_reserve: &Reserve,
    withdraw_reserve: &Reserve,
    obligation: &Pubkey,
    liquidity_amount_in: u64,
    source_liquidity: &Pubkey,
    destination_collateral: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &repay_reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(*source_liquidity, false),                         // 1. sourceLiquidity
        AccountMeta::new(*destination_collateral, false),                   // 2. destinationCollateral
        AccountMeta::new(repay_reserve.address, false),                     // 3. repayReserve
        AccountMeta::new(repay_reserve.liquidity.supply_pubkey, false),     // 4. repayReserveLiquiditySupply
        AccountMeta::new_readonly(withdraw_reserve.address, false),         // 5. withdrawReserve
        AccountMeta::new(withdraw_reserve.collateral.supply_pubkey, false), // 6. withdrawReserveCollateralSupply
        AccountMeta::new(*obligation, false),                               // 7. obligation
        AccountMeta::new_readonly(repay_reserve.lending_market, false),     // 8. lendingMarket
        AccountMeta::new_readonly(authority, false),                        // 9. lendingMarketAuthority
        AccountMeta::new_readonly(*user_transfer_authority, true),          // 10. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),                  // 11. tokenProgram
    ];
    log::info!(
        "LiquidateObligation: obligation={}, repay_reserve={}, withdraw_reserve={}, amount={}",
        obligation,
        repay_reserve.address,
        withdraw_reserve.address,
        liquidity_amount_in
    );
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: LIQUIDATE_OBLIGATION.encode(&liquidity_amount(liquidity_amount_in))?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn deposit_reserve_liquidity_and_obligation_collateral(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    liquidity_amount_in: u64,
    source_liquidity: &Pubkey,
    user_collateral: &Pubkey,
    obligation_owner: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(*source_liquidity, false),                             // 1. sourceLiquidity
        AccountMeta::new(*user_collateral, false),                              // 2. userCollateral
        AccountMeta::new(reserve.address, false),                               // 3. reserve
        AccountMeta::new(reserve.liquidity.supply_pubkey, false),               // 4. reserveLiquiditySupply
        AccountMeta::new(reserve.collateral.mint_pubkey, false),                // 5. reserveCollateralMint
        AccountMeta::new_readonly(reserve.lending_market, false),               // 6. lendingMarket
        AccountMeta::new_readonly(authority, false),                            // 7. lendingMarketAuthority
        AccountMeta::new(reserve.collateral.supply_pubkey, false),              // 8. destinationDepositCollateral
        AccountMeta::new(*obligation, false),                                   // 9. obligation
        AccountMeta::new_readonly(*obligation_owner, true),                     // 10. obligationOwner (signer)
        AccountMeta::new_readonly(reserve.liquidity.pyth_oracle, false),        // 11. pythPrice
        AccountMeta::new_readonly(reserve.liquidity.switchboard_oracle, false), // 12. switchboardFeed
        AccountMeta::new_readonly(*user_transfer_authority, true),              // 13. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),                      // 14. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: DEPOSIT_RESERVE_LIQUIDITY_AND_OBLIGATION_COLLATERAL
            .encode(&liquidity_amount(liquidity_amount_in))?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn withdraw_obligation_collateral_and_redeem_reserve_collateral(
    programs: &ProgramRegistry,
    reserve: &Reserve,
    obligation: &Pubkey,
    collateral_amount_in: u64,
    destination_collateral: &Pubkey,
    destination_liquidity: &Pubkey,
    obligation_owner: &Pubkey,
    user_transfer_authority: &Pubkey,
) -> Result<Instruction> {
    let authority = derive_lending_market_authority(programs, &reserve.lending_market)?;
    let accounts = vec![
        AccountMeta::new(reserve.collateral.supply_pubkey, false), // 1. reserveCollateralSupply
        AccountMeta::new(*destination_collateral, false),          // 2. destinationCollateral
        AccountMeta::new(reserve.address, false),                  // 3. withdrawReserve
        AccountMeta::new(*obligation, false),                      // 4. obligation
        AccountMeta::new_readonly(reserve.lending_market, false),  // 5. lendingMarket
        AccountMeta::new_readonly(authority, false),               // 6. lendingMarketAuthority
        AccountMeta::new(*destination_liquidity, false),           // 7. destinationLiquidity
        AccountMeta::new(reserve.collateral.mint_pubkey, false),   // 8. reserveCollateralMint
        AccountMeta::new(reserve.liquidity.supply_pubkey, false),  // 9. reserveLiquiditySupply
        AccountMeta::new_readonly(*obligation_owner, true),        // 10. obligationOwner (signer)
        AccountMeta::new_readonly(*user_transfer_authority, true), // 11. userTransferAuthority (signer)
        AccountMeta::new_readonly(spl_token::id(), false),         // 12. tokenProgram
    ];
    Ok(Instruction {
        program_id: programs.solend,
        accounts,
        data: WITHDRAW_OBLIGATION_COLLATERAL_AND_REDEEM_RESERVE_COLLATERAL
            .encode(&collateral_amount(collateral_amount_in))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{decode_args, AccountRecord};
    use proptest::prelude::*;

    fn reserve(extra_oracle: Option<Pubkey>) -> Reserve {
        let mut fields = Reserve::zeroed_fields().unwrap();
        fields.set("version", 1u8);
        fields.set("lending_market", Pubkey::new_unique());
        if let Some(oracle) = extra_oracle {
            fields.set("extra_oracle_pubkey", oracle);
        }
        let liquidity = fields.record_mut("liquidity").unwrap();
        liquidity.set("pyth_oracle", Pubkey::new_unique());
        liquidity.set("switchboard_oracle", Pubkey::new_unique());
        liquidity.set("supply_pubkey", Pubkey::new_unique());
        Reserve::decode(&Reserve::encode_fields(&fields).unwrap(), Pubkey::new_unique()).unwrap()
    }

    #[test]
    fn test_tags_are_unique() {
        let mut tags: Vec<u8> = INSTRUCTIONS
            .iter()
            .map(|ix| match ix.discriminator {
                Discriminator::Tag(t) => t,
                _ => panic!("{} is not a one-byte tag", ix.name),
            })
            .collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), INSTRUCTIONS.len());
    }

    #[test]
    fn test_refresh_reserve_extra_oracle_is_optional() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let plain = refresh_reserve(&programs, &reserve(None)).unwrap();
        assert_eq!(plain.accounts.len(), 3);
        assert_eq!(plain.data, vec![3]);

        let oracle = Pubkey::new_unique();
        let r = reserve(Some(oracle));
        let extended = refresh_reserve(&programs, &r).unwrap();
        assert_eq!(extended.accounts.len(), 4);
        let plain = Reserve { extra_oracle: None, ..r.clone() };
        let base = refresh_reserve(&programs, &plain).unwrap();
        assert_eq!(extended.accounts[..3], base.accounts[..]);
        assert_eq!(extended.accounts[3], AccountMeta::new_readonly(oracle, false));
    }

    #[test]
    fn test_deposit_payload_and_flags() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let r = reserve(None);
        let user = Pubkey::new_unique();
        let (source, destination) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = deposit_reserve_liquidity(&programs, &r, 1_000, &source, &destination, &user)
            .unwrap();
        assert_eq!(ix.program_id, programs.solend);
        assert_eq!(ix.data[0], 4);
        assert_eq!(&ix.data[1..], &1_000u64.to_le_bytes());
        assert_eq!(ix.accounts[7], AccountMeta::new_readonly(user, true));
        assert_eq!(
            ix.accounts[6].pubkey,
            derive_lending_market_authority(&programs, &r.lending_market).unwrap()
        );
        assert_eq!(ix.accounts.iter().filter(|a| a.is_signer).count(), 1);
    }

    #[test]
    fn test_refresh_obligation_order() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let (d1, d2, b1) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let mut header =
            crate::protocol::solend::types::OBLIGATION_HEADER_LAYOUT.zeroed_fields().unwrap();
        header.set("version", 1u8);
        let data = Obligation::pack(&header, &[], &[]).unwrap();
        let mut obligation = Obligation::decode(&data, Pubkey::new_unique()).unwrap();
        obligation.deposits = [d1, d2]
            .iter()
            .map(|r| crate::protocol::solend::types::ObligationCollateral {
                deposit_reserve: *r,
                deposited_amount: 1,
                market_value: Default::default(),
                attributed_borrow_value: Default::default(),
            })
            .collect();
        obligation.borrows = vec![crate::protocol::solend::types::ObligationLiquidity {
            borrow_reserve: b1,
            cumulative_borrow_rate_wads: Default::default(),
            borrowed_amount_wads: Default::default(),
            market_value: Default::default(),
        }];

        let ix = refresh_obligation(&programs, &obligation).unwrap();
        let keys: Vec<Pubkey> = ix.accounts.iter().map(|a| a.pubkey).collect();
        assert_eq!(keys, vec![obligation.address, d1, d2, b1]);
        assert!(ix.accounts[0].is_writable && !ix.accounts[1].is_writable);
        assert_eq!(ix.data, vec![7]);
    }

    #[test]
    fn test_borrow_host_fee_receiver_appended() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let r = reserve(None);
        let host = Pubkey::new_unique();
        let args = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let without =
            borrow_obligation_liquidity(&programs, &r, &args.0, 5, &args.1, &args.2, None).unwrap();
        let with =
            borrow_obligation_liquidity(&programs, &r, &args.0, 5, &args.1, &args.2, Some(&host))
                .unwrap();
        assert_eq!(without.accounts.len(), 9);
        assert_eq!(with.accounts[..9], without.accounts[..]);
        assert_eq!(with.accounts[9], AccountMeta::new(host, false));
    }

    proptest! {
        #[test]
        fn amount_args_survive_encoding(amount in any::<u64>()) {
            for spec in INSTRUCTIONS.iter().filter(|ix| !ix.args.is_empty()) {
                let data = spec.encode(&Fields::new().with(spec.args[0].name, amount)).unwrap();
                prop_assert_eq!(
                    decode_args::<AmountArgs>(spec, &data).unwrap(),
                    AmountArgs { amount }
                );
                prop_assert_eq!(
                    spec.decode(&data).unwrap().u64(spec.args[0].name).unwrap(),
                    amount
                );
            }
        }
    }
}
