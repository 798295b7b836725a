use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::{field, Discriminator, Fields, InstructionSpec, Layout};
use crate::protocol::katana::accounts::{derive_price_per_share, derive_user_account};
use crate::protocol::katana::types::{UserAccount, Vault};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};

pub const INITIALIZE_USER_ACCOUNT: InstructionSpec = InstructionSpec::new(
    "initialize_user_account",
    Discriminator::Anchor([0x83, 0xf8, 0x3d, 0xd3, 0x98, 0xcd, 0x7a, 0xee]),
    &[field("bump", Layout::U8)],
);
pub const DEPOSIT: InstructionSpec = InstructionSpec::new(
    "deposit",
    Discriminator::Anchor([0xf2, 0x23, 0xc6, 0x89, 0x52, 0xe1, 0xf2, 0xb6]),
    &[field("amount", Layout::U64)],
);
pub const INITIATE_WITHDRAW: InstructionSpec = InstructionSpec::new(
    "initiate_withdraw",
    Discriminator::Anchor([0x9c, 0xac, 0x8c, 0xf5, 0xb6, 0xfa, 0xef, 0xa0]),
    &[field("shares", Layout::U64)],
);
pub const COMPLETE_WITHDRAW: InstructionSpec = InstructionSpec::new(
    "complete_withdraw",
    Discriminator::Anchor([0xac, 0x81, 0x8d, 0x11, 0x5f, 0xfd, 0xfb, 0x62]),
    &[],
);
pub const INSTANT_WITHDRAW: InstructionSpec = InstructionSpec::new(
    "instant_withdraw",
    Discriminator::Anchor([0xab, 0x31, 0x91, 0xb0, 0x30, 0x65, 0x70, 0xa2]),
    &[field("amount", Layout::U64)],
);
pub const CANCEL_PENDING_DEPOSIT: InstructionSpec = InstructionSpec::new(
    "cancel_pending_deposit",
    Discriminator::Anchor([0xa8, 0x2f, 0x8a, 0xc7, 0x78, 0x83, 0xb0, 0x13]),
    &[],
);

pub const INSTRUCTIONS: &[InstructionSpec] = &[
    INITIALIZE_USER_ACCOUNT,
    DEPOSIT,
    INITIATE_WITHDRAW,
    COMPLETE_WITHDRAW,
    INSTANT_WITHDRAW,
    CANCEL_PENDING_DEPOSIT,
];

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeUserAccountArgs {
    pub bump: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountArgs {
    pub amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiateWithdrawArgs {
    pub shares: u64,
}

pub fn initialize_user_account(
    programs: &ProgramRegistry,
    vault: &Vault,
    owner: &Pubkey,
) -> Result<Instruction> {
    let (user_account, bump) = derive_user_account(programs, owner, &vault.address)?;
    let accounts = vec![
        AccountMeta::new(user_account, false),                  // 1. userAccount
        AccountMeta::new_readonly(vault.address, false),        // 2. vault
        AccountMeta::new(*owner, true),                         // 3. owner (signer, payer)
        AccountMeta::new_readonly(system_program::id(), false), // 4. systemProgram
        AccountMeta::new_readonly(sysvar::rent::id(), false),   // 5. rent
    ];
    Ok(Instruction {
        program_id: programs.katana,
        accounts,
        data: INITIALIZE_USER_ACCOUNT.encode(&Fields::new().with("bump", bump))?,
    })
}

/// Accounts every depositor instruction opens with.
fn vault_prefix(vault: &Vault, user_account: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(vault.address, false),                        // 1. vault
        AccountMeta::new_readonly(vault.vault_authority, false),       // 2. vaultAuthority
        AccountMeta::new_readonly(vault.underlying_token_mint, false), // 3. underlyingTokenMint
        AccountMeta::new(*user_account, false),                        // 4. userAccount
    ]
}

/// Queues `amount` underlying for the next round.
pub fn deposit(
    programs: &ProgramRegistry,
    vault: &Vault,
    owner: &Pubkey,
    owner_underlying_account: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    let (user_account, _) = derive_user_account(programs, owner, &vault.address)?;
    let mut accounts = vault_prefix(vault, &user_account);
    accounts.extend([
        AccountMeta::new(*owner_underlying_account, false),    // 5. userUnderlyingTokenAccount
        AccountMeta::new(vault.underlying_token_vault, false), // 6. underlyingTokenVault
        AccountMeta::new_readonly(*owner, true),               // 7. owner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),     // 8. tokenProgram
    ]);
    Ok(Instruction {
        program_id: programs.katana,
        accounts,
        data: DEPOSIT.encode(&Fields::new().with("amount", amount))?,
    })
}

/// Queues `shares` for redemption at the close of the current round.
pub fn initiate_withdraw(
    programs: &ProgramRegistry,
    vault: &Vault,
    owner: &Pubkey,
    owner_share_account: &Pubkey,
    shares: u64,
) -> Result<Instruction> {
    let (user_account, _) = derive_user_account(programs, owner, &vault.address)?;
    let mut accounts = vault_prefix(vault, &user_account);
    accounts.extend([
        AccountMeta::new(vault.derivative_token_mint, false), // 5. derivativeTokenMint
        AccountMeta::new(*owner_share_account, false),        // 6. userDerivativeTokenAccount
        AccountMeta::new_readonly(*owner, true),              // 7. owner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),    // 8. tokenProgram
    ]);
    Ok(Instruction {
        program_id: programs.katana,
        accounts,
        data: INITIATE_WITHDRAW.encode(&Fields::new().with("shares", shares))?,
    })
}

/// Redeems the queued shares at the price of the round they were queued in.
pub fn complete_withdraw(
    programs: &ProgramRegistry,
    vault: &Vault,
    user: &UserAccount,
    owner_underlying_account: &Pubkey,
) -> Result<Instruction> {
    let (price_per_share, _) =
        derive_price_per_share(programs, &vault.address, user.pending_withdraw_round)?;
    let mut accounts = vault_prefix(vault, &user.address);
    accounts.extend([
        AccountMeta::new_readonly(price_per_share, false),     // 5. pricePerShare (withdraw round)
        AccountMeta::new(*owner_underlying_account, false),    // 6. userUnderlyingTokenAccount
        AccountMeta::new(vault.underlying_token_vault, false), // 7. underlyingTokenVault
        AccountMeta::new_readonly(user.owner, true),           // 8. owner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),     // 9. tokenProgram
    ]);
    Ok(Instruction {
        program_id: programs.katana,
        accounts,
        data: COMPLETE_WITHDRAW.encode(&Fields::new())?,
    })
}

fn pending_deposit_accounts(
    vault: &Vault,
    user: &UserAccount,
    owner_underlying_account: &Pubkey,
) -> Vec<AccountMeta> {
    let mut accounts = vault_prefix(vault, &user.address);
    accounts.extend([
        AccountMeta::new(*owner_underlying_account, false),    // 5. userUnderlyingTokenAccount
        AccountMeta::new(vault.underlying_token_vault, false), // 6. underlyingTokenVault
        AccountMeta::new_readonly(user.owner, true),           // 7. owner (signer)
        AccountMeta::new_readonly(spl_token::id(), false),     // 8. tokenProgram
    ]);
    accounts
}

/// Takes back part of a deposit still pending in the current round.
pub fn instant_withdraw(
    programs: &ProgramRegistry,
    vault: &Vault,
    user: &UserAccount,
    owner_underlying_account: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.katana,
        accounts: pending_deposit_accounts(vault, user, owner_underlying_account),
        data: INSTANT_WITHDRAW.encode(&Fields::new().with("amount", amount))?,
    })
}

pub fn cancel_pending_deposit(
    programs: &ProgramRegistry,
    vault: &Vault,
    user: &UserAccount,
    owner_underlying_account: &Pubkey,
) -> Result<Instruction> {
    Ok(Instruction {
        program_id: programs.katana,
        accounts: pending_deposit_accounts(vault, user, owner_underlying_account),
        data: CANCEL_PENDING_DEPOSIT.encode(&Fields::new())?,
    })
}
