use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::{field, Discriminator, Field, Fields, InstructionSpec, Layout};
use crate::protocol::saber::accounts::swap_authority;
use crate::protocol::saber::types::{SwapInfo, SwapTokenInfo, WrapInfo};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};

const SWAP_ARGS: &[Field] = &[
    field("amount_in", Layout::U64),
    field("minimum_amount_out", Layout::U64),
];
const DEPOSIT_ARGS: &[Field] = &[
    field("token_a_amount", Layout::U64),
    field("token_b_amount", Layout::U64),
    field("min_mint_amount", Layout::U64),
];
const WITHDRAW_ARGS: &[Field] = &[
    field("pool_token_amount", Layout::U64),
    field("minimum_token_a_amount", Layout::U64),
    field("minimum_token_b_amount", Layout::U64),
];
const WITHDRAW_ONE_ARGS: &[Field] = &[
    field("pool_token_amount", Layout::U64),
    field("minimum_token_amount", Layout::U64),
];

pub const SWAP: InstructionSpec = InstructionSpec::new("swap", Discriminator::Tag(1), SWAP_ARGS);
pub const DEPOSIT: InstructionSpec =
    InstructionSpec::new("deposit", Discriminator::Tag(2), DEPOSIT_ARGS);
pub const WITHDRAW: InstructionSpec =
    InstructionSpec::new("withdraw", Discriminator::Tag(3), WITHDRAW_ARGS);
pub const WITHDRAW_ONE: InstructionSpec =
    InstructionSpec::new("withdraw_one", Discriminator::Tag(4), WITHDRAW_ONE_ARGS);

/// Decimal wrapper program (Anchor).
pub const WRAPPER_DEPOSIT: InstructionSpec = InstructionSpec::new(
    "deposit",
    Discriminator::Anchor([0xf2, 0x23, 0xc6, 0x89, 0x52, 0xe1, 0xf2, 0xb6]),
    &[field("deposit_amount", Layout::U64)],
);
pub const WRAPPER_WITHDRAW: InstructionSpec = InstructionSpec::new(
    "withdraw",
    Discriminator::Anchor([0xb7, 0x12, 0x46, 0x9c, 0x94, 0x6d, 0xa1, 0x22]),
    &[field("max_burn_amount", Layout::U64)],
);

pub const SWAP_INSTRUCTIONS: &[InstructionSpec] = &[SWAP, DEPOSIT, WITHDRAW, WITHDRAW_ONE];
pub const WRAPPER_INSTRUCTIONS: &[InstructionSpec] = &[WRAPPER_DEPOSIT, WRAPPER_WITHDRAW];

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapArgs {
    pub amount_in: u64,
    pub minimum_amount_out: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositArgs {
    pub token_a_amount: u64,
    pub token_b_amount: u64,
    pub min_mint_amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawArgs {
    pub pool_token_amount: u64,
    pub minimum_token_a_amount: u64,
    pub minimum_token_b_amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOneArgs {
    pub pool_token_amount: u64,
    pub minimum_token_amount: u64,
}

/// Which reserve the input token goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    AtoB,
    BtoA,
}

impl SwapDirection {
    /// (input side, output side)
    fn sides(self, swap: &SwapInfo) -> (&SwapTokenInfo, &SwapTokenInfo) {
        match self {
            SwapDirection::AtoB => (&swap.token_a, &swap.token_b),
            SwapDirection::BtoA => (&swap.token_b, &swap.token_a),
        }
    }
}

/// Admin fees are taken in the output token.
pub fn swap(
    programs: &ProgramRegistry,
    pool: &SwapInfo,
    direction: SwapDirection,
    args: SwapArgs,
    user_authority: &Pubkey,
    user_source: &Pubkey,
    user_destination: &Pubkey,
) -> Result<Instruction> {
    let authority = swap_authority(programs, pool)?;
    let (input, output) = direction.sides(pool);
    let accounts = vec![
        AccountMeta::new_readonly(pool.address, false),        // 1. swap
        AccountMeta::new_readonly(authority, false),           // 2. swapAuthority
        AccountMeta::new_readonly(*user_authority, true),      // 3. userAuthority (signer)
        AccountMeta::new(*user_source, false),                 // 4. userSource
        AccountMeta::new(input.reserves, false),               // 5. poolSource
        AccountMeta::new(output.reserves, false),              // 6. poolDestination
        AccountMeta::new(*user_destination, false),            // 7. userDestination
        AccountMeta::new(output.admin_fees, false),            // 8. adminFeeDestination
        AccountMeta::new_readonly(spl_token::id(), false),     // 9. tokenProgram
        AccountMeta::new_readonly(sysvar::clock::id(), false), // 10. clock
    ];
    let data = SWAP.encode(
        &Fields::new()
            .with("amount_in", args.amount_in)
            .with("minimum_amount_out", args.minimum_amount_out),
    )?;
    Ok(Instruction { program_id: programs.saber_swap, accounts, data })
}

#[allow(clippy::too_many_arguments)]
pub fn deposit(
    programs: &ProgramRegistry,
    pool: &SwapInfo,
    args: DepositArgs,
    user_authority: &Pubkey,
    deposit_token_a: &Pubkey,
    deposit_token_b: &Pubkey,
    destination_pool_tokens: &Pubkey,
) -> Result<Instruction> {
    let authority = swap_authority(programs, pool)?;
    let accounts = vec![
        AccountMeta::new_readonly(pool.address, false),        // 1. swap
        AccountMeta::new_readonly(authority, false),           // 2. swapAuthority
        AccountMeta::new_readonly(*user_authority, true),      // 3. userAuthority (signer)
        AccountMeta::new(*deposit_token_a, false),             // 4. depositTokenA
        AccountMeta::new(*deposit_token_b, false),             // 5. depositTokenB
        AccountMeta::new(pool.token_a.reserves, false),        // 6. tokenA reserves
        AccountMeta::new(pool.token_b.reserves, false),        // 7. tokenB reserves
        AccountMeta::new(pool.pool_mint, false),               // 8. poolMint
        AccountMeta::new(*destination_pool_tokens, false),     // 9. outputLp
        AccountMeta::new_readonly(spl_token::id(), false),     // 10. tokenProgram
        AccountMeta::new_readonly(sysvar::clock::id(), false), // 11. clock
    ];
    let data = DEPOSIT.encode(
        &Fields::new()
            .with("token_a_amount", args.token_a_amount)
            .with("token_b_amount", args.token_b_amount)
            .with("min_mint_amount", args.min_mint_amount),
    )?;
    Ok(Instruction { program_id: programs.saber_swap, accounts, data })
}

#[allow(clippy::too_many_arguments)]
pub fn withdraw(
    programs: &ProgramRegistry,
    pool: &SwapInfo,
    args: WithdrawArgs,
    user_authority: &Pubkey,
    source_pool_tokens: &Pubkey,
    destination_token_a: &Pubkey,
    destination_token_b: &Pubkey,
) -> Result<Instruction> {
    let authority = swap_authority(programs, pool)?;
    let accounts = vec![
        AccountMeta::new_readonly(pool.address, false),    // 1. swap
        AccountMeta::new_readonly(authority, false),       // 2. swapAuthority
        AccountMeta::new_readonly(*user_authority, true),  // 3. userAuthority (signer)
        AccountMeta::new(pool.pool_mint, false),           // 4. poolMint
        AccountMeta::new(*source_pool_tokens, false),      // 5. inputLp
        AccountMeta::new(pool.token_a.reserves, false),    // 6. tokenA reserves
        AccountMeta::new(pool.token_b.reserves, false),    // 7. tokenB reserves
        AccountMeta::new(*destination_token_a, false),     // 8. userTokenA
        AccountMeta::new(*destination_token_b, false),     // 9. userTokenB
        AccountMeta::new(pool.token_a.admin_fees, false),  // 10. adminFeeA
        AccountMeta::new(pool.token_b.admin_fees, false),  // 11. adminFeeB
        AccountMeta::new_readonly(spl_token::id(), false), // 12. tokenProgram
    ];
    let data = WITHDRAW.encode(
        &Fields::new()
            .with("pool_token_amount", args.pool_token_amount)
            .with("minimum_token_a_amount", args.minimum_token_a_amount)
            .with("minimum_token_b_amount", args.minimum_token_b_amount),
    )?;
    Ok(Instruction { program_id: programs.saber_swap, accounts, data })
}

/// Withdraws liquidity as the single token `output_mint`.
#[allow(clippy::too_many_arguments)]
pub fn withdraw_one(
    programs: &ProgramRegistry,
    pool: &SwapInfo,
    output_mint: &Pubkey,
    args: WithdrawOneArgs,
    user_authority: &Pubkey,
    source_pool_tokens: &Pubkey,
    destination: &Pubkey,
) -> Result<Instruction> {
    let authority = swap_authority(programs, pool)?;
    let direction = if pool.token_a.mint == *output_mint {
        SwapDirection::BtoA
    } else if pool.token_b.mint == *output_mint {
        SwapDirection::AtoB
    } else {
        return Err(crate::core::error::Error::Config(format!(
            "mint {} is not a side of pool {}",
            output_mint, pool.address
        )));
    };
    let (quote, base) = direction.sides(pool);
    let accounts = vec![
        AccountMeta::new_readonly(pool.address, false),        // 1. swap
        AccountMeta::new_readonly(authority, false),           // 2. swapAuthority
        AccountMeta::new_readonly(*user_authority, true),      // 3. userAuthority (signer)
        AccountMeta::new(pool.pool_mint, false),               // 4. poolMint
        AccountMeta::new(*source_pool_tokens, false),          // 5. inputLp
        AccountMeta::new(base.reserves, false),                // 6. baseTokenAccount (output)
        AccountMeta::new(quote.reserves, false),               // 7. quoteTokenAccount
        AccountMeta::new(*destination, false),                 // 8. destination
        AccountMeta::new(base.admin_fees, false),              // 9. adminDestination
        AccountMeta::new_readonly(spl_token::id(), false),     // 10. tokenProgram
        AccountMeta::new_readonly(sysvar::clock::id(), false), // 11. clock
    ];
    let data = WITHDRAW_ONE.encode(
        &Fields::new()
            .with("pool_token_amount", args.pool_token_amount)
            .with("minimum_token_amount", args.minimum_token_amount),
    )?;
    Ok(Instruction { program_id: programs.saber_swap, accounts, data })
}

fn wrapper_accounts(
    wrap: &WrapInfo,
    owner: &Pubkey,
    user_underlying_tokens: &Pubkey,
    user_wrapped_tokens: &Pubkey,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(wrap.address, false),    // 1. wrapper
        AccountMeta::new(wrap.wrapper_mint, false),        // 2. wrapperMint
        AccountMeta::new(wrap.underlying_tokens, false),   // 3. wrapperUnderlyingTokens
        AccountMeta::new_readonly(*owner, true),           // 4. owner (signer)
        AccountMeta::new(*user_underlying_tokens, false),  // 5. userUnderlyingTokens
        AccountMeta::new(*user_wrapped_tokens, false),     // 6. userWrappedTokens
        AccountMeta::new_readonly(spl_token::id(), false), // 7. tokenProgram
    ]
}

pub fn wrapper_deposit(
    programs: &ProgramRegistry,
    wrap: &WrapInfo,
    deposit_amount: u64,
    owner: &Pubkey,
    user_underlying_tokens: &Pubkey,
    user_wrapped_tokens: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.saber_decimal_wrapper,
        accounts: wrapper_accounts(wrap, owner, user_underlying_tokens, user_wrapped_tokens),
        data: WRAPPER_DEPOSIT.encode(&Fields::new().with("deposit_amount", deposit_amount))?,
    })
}

pub fn wrapper_withdraw(
    programs: &ProgramRegistry,
    wrap: &WrapInfo,
    max_burn_amount: u64,
    owner: &Pubkey,
    user_underlying_tokens: &Pubkey,
    user_wrapped_tokens: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.saber_decimal_wrapper,
        accounts: wrapper_accounts(wrap, owner, user_underlying_tokens, user_wrapped_tokens),
        data: WRAPPER_WITHDRAW.encode(&Fields::new().with("max_burn_amount", max_burn_amount))?,
    })
}
