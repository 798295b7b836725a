use crate::core::error::{Error, Result};
use serde::Serialize;
use solana_sdk::{program_pack::Pack, pubkey::Pubkey};
use spl_token::state::{Account as TokenAccount, AccountState};

/// The parts of an SPL token account the protocol modules read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

pub fn decode_token_account(address: Pubkey, data: &[u8]) -> Result<TokenBalance> {
    if data.len() < TokenAccount::LEN {
        return Err(Error::truncated(TokenAccount::LEN, data.len()));
    }
    let account = TokenAccount::unpack(&data[..TokenAccount::LEN])
        .map_err(|e| Error::malformed(format!("token account {}: {}", address, e)))?;
    Ok(TokenBalance {
        address,
        mint: account.mint,
        owner: account.owner,
        amount: account.amount,
    })
}

/// Packed initialized token account, for simulated pool balances.
pub fn encode_token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Result<Vec<u8>> {
    let account = TokenAccount {
        mint,
        owner,
        amount,
        state: AccountState::Initialized,
        ..TokenAccount::default()
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).map_err(|e| Error::malformed(e.to_string()))?;
    Ok(data)
}

pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(wallet, mint)
}
