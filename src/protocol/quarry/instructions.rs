use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::{field, Discriminator, Field, Fields, InstructionSpec, Layout};
use crate::protocol::quarry::accounts::{
    derive_minter_address, miner_vault_address, quarry_miner_address,
};
use crate::protocol::quarry::types::{Miner, Quarry, Rewarder};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

const AMOUNT: &[Field] = &[field("amount", Layout::U64)];

pub const CREATE_MINER: InstructionSpec = InstructionSpec::new(
    "create_miner",
    Discriminator::Anchor([0x7e, 0x17, 0x9d, 0x01, 0x93, 0x5e, 0xf5, 0x45]),
    &[field("bump", Layout::U8)],
);
pub const CREATE_MINER_V2: InstructionSpec = InstructionSpec::new(
    "create_miner_v2",
    Discriminator::Anchor([0xb1, 0xf2, 0x1d, 0xb0, 0x0d, 0xd9, 0x24, 0x47]),
    &[],
);
pub const STAKE_TOKENS: InstructionSpec = InstructionSpec::new(
    "stake_tokens",
    Discriminator::Anchor([0x88, 0x7e, 0x5b, 0xa2, 0x28, 0x83, 0x0d, 0x7f]),
    AMOUNT,
);
pub const WITHDRAW_TOKENS: InstructionSpec = InstructionSpec::new(
    "withdraw_tokens",
    Discriminator::Anchor([0x02, 0x04, 0xe1, 0x3d, 0x13, 0xb6, 0x6a, 0xaa]),
    AMOUNT,
);
pub const CLAIM_REWARDS: InstructionSpec = InstructionSpec::new(
    "claim_rewards",
    Discriminator::Anchor([0x04, 0x90, 0x84, 0x47, 0x74, 0x17, 0x97, 0x50]),
    &[],
);

pub const INSTRUCTIONS: &[InstructionSpec] =
    &[CREATE_MINER, CREATE_MINER_V2, STAKE_TOKENS, WITHDRAW_TOKENS, CLAIM_REWARDS];

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateMinerArgs {
    pub bump: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeArgs {
    pub amount: u64,
}

fn create_miner_accounts(
    miner: Pubkey,
    quarry: &Quarry,
    authority: &Pubkey,
    payer: &Pubkey,
) -> Vec<AccountMeta> {
    let miner_vault = miner_vault_address(&miner, &quarry.token_mint_key);
    vec![
        AccountMeta::new_readonly(*authority, true),             // 1. authority (signer)
        AccountMeta::new(miner, false),                          // 2. miner
        AccountMeta::new(quarry.address, false),                 // 3. quarry
        AccountMeta::new_readonly(quarry.rewarder, false),       // 4. rewarder
        AccountMeta::new_readonly(system_program::id(), false),  // 5. systemProgram
        AccountMeta::new(*payer, true),                          // 6. payer (signer)
        AccountMeta::new_readonly(quarry.token_mint_key, false), // 7. tokenMint
        AccountMeta::new_readonly(miner_vault, false),           // 8. minerVault
        AccountMeta::new_readonly(spl_token::id(), false),       // 9. tokenProgram
    ]
}

/// Legacy variant carrying the miner bump. The miner vault must exist.
pub fn create_miner(
    programs: &ProgramRegistry,
    quarry: &Quarry,
    authority: &Pubkey,
    payer: &Pubkey,
) -> Result<Instruction> {
    let (miner, bump) = quarry_miner_address(programs, quarry, authority)?;
    Ok(Instruction {
        program_id: programs.quarry_mine,
        accounts: create_miner_accounts(miner, quarry, authority, payer),
        data: CREATE_MINER.encode(&Fields::new().with("bump", bump))?,
    })
}

pub fn create_miner_v2(
    programs: &ProgramRegistry,
    quarry: &Quarry,
    authority: &Pubkey,
    payer: &Pubkey,
) -> Result<Instruction> {
    let (miner, _) = quarry_miner_address(programs, quarry, authority)?;
    Ok(Instruction {
        program_id: programs.quarry_mine,
        accounts: create_miner_accounts(miner, quarry, authority, payer),
        data: CREATE_MINER_V2.encode(&Fields::new())?,
    })
}

fn stake_accounts(miner: &Miner, quarry: &Quarry, token_account: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(miner.authority, true),  // 1. authority (signer)
        AccountMeta::new(miner.address, false),            // 2. miner
        AccountMeta::new(quarry.address, false),           // 3. quarry
        AccountMeta::new(miner.token_vault_key, false),    // 4. minerVault
        AccountMeta::new(*token_account, false),           // 5. tokenAccount
        AccountMeta::new_readonly(spl_token::id(), false), // 6. tokenProgram
        AccountMeta::new_readonly(quarry.rewarder, false), // 7. rewarder
    ]
}

/// Moves `amount` from `token_account` into the miner vault.
pub fn stake_tokens(
    programs: &ProgramRegistry,
    miner: &Miner,
    quarry: &Quarry,
    token_account: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.quarry_mine,
        accounts: stake_accounts(miner, quarry, token_account),
        data: STAKE_TOKENS.encode(&Fields::new().with("amount", amount))?,
    })
}

pub fn withdraw_tokens(
    programs: &ProgramRegistry,
    miner: &Miner,
    quarry: &Quarry,
    token_account: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.quarry_mine,
        accounts: stake_accounts(miner, quarry, token_account),
        data: WITHDRAW_TOKENS.encode(&Fields::new().with("amount", amount))?,
    })
}

/// Mints accrued rewards to `rewards_token_account` through the rewarder's
/// mint wrapper minter.
pub fn claim_rewards(
    programs: &ProgramRegistry,
    rewarder: &Rewarder,
    quarry: &Quarry,
    miner: &Miner,
    rewards_token_account: &Pubkey,
) -> Result<Instruction> {
    let (minter, _) = derive_minter_address(programs, &rewarder.mint_wrapper, &rewarder.address)?;
    let accounts = vec![
        AccountMeta::new(rewarder.mint_wrapper, false),                 // 1. mintWrapper
        AccountMeta::new_readonly(programs.quarry_mint_wrapper, false), // 2. mintWrapperProgram
        AccountMeta::new(minter, false),                                // 3. minter
        AccountMeta::new(rewarder.rewards_token_mint, false),           // 4. rewardsTokenMint
        AccountMeta::new(*rewards_token_account, false),                // 5. rewardsTokenAccount
        AccountMeta::new(rewarder.claim_fee_token_account, false),      // 6. claimFeeTokenAccount
        AccountMeta::new_readonly(miner.authority, true),               // 7. authority (signer)
        AccountMeta::new(miner.address, false),                         // 8. miner
        AccountMeta::new(quarry.address, false),                        // 9. quarry
        AccountMeta::new_readonly(miner.token_vault_key, false),        // 10. unusedMinerVault
        AccountMeta::new_readonly(miner.token_vault_key, false),        // 11. unusedTokenAccount
        AccountMeta::new_readonly(spl_token::id(), false),              // 12. tokenProgram
        AccountMeta::new_readonly(rewarder.address, false),             // 13. rewarder
    ];
    Ok(Instruction {
        program_id: programs.quarry_mine,
        accounts,
        data: CLAIM_REWARDS.encode(&Fields::new())?,
    })
}
