use crate::blockchain::rpc_client::AccountSource;
use crate::core::error::{Error, Result};
use crate::core::registry::ProgramRegistry;
use crate::protocol::fetch_record;
use crate::protocol::saber::types::{SwapInfo, WrapInfo};
use crate::utils::pda;
use crate::utils::token::decode_token_account;
use solana_sdk::pubkey::Pubkey;

/// Pool authority: `[swap, nonce]` with the nonce stored in the pool.
pub fn swap_authority(programs: &ProgramRegistry, swap: &SwapInfo) -> Result<Pubkey> {
    pda::create_address(&[swap.address.as_ref(), &[swap.nonce]], &programs.saber_swap)
}

/// Wrapper account for `underlying_mint` re-denominated to `decimals`.
pub fn derive_wrapper_address(
    programs: &ProgramRegistry,
    underlying_mint: &Pubkey,
    decimals: u8,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(
        &[b"anchor", underlying_mint.as_ref(), &[decimals]],
        &programs.saber_decimal_wrapper,
    )
}

pub async fn fetch_swap_info(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<SwapInfo> {
    fetch_record(source, &programs.saber_swap, address).await
}

/// Pool plus the current balances of both reserve token accounts.
pub async fn fetch_swap_with_balances(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<SwapInfo> {
    let swap = fetch_swap_info(source, programs, address).await?;
    let reserves = [swap.token_a.reserves, swap.token_b.reserves];
    let mut balances = Vec::with_capacity(2);
    for (reserve, account) in reserves.iter().zip(source.get_multiple_accounts(&reserves).await?) {
        let account = account.ok_or_else(|| Error::NotFound(format!("Saber reserve {}", reserve)))?;
        balances.push(decode_token_account(*reserve, &account.data)?);
    }
    log::debug!(
        "Saber pool {}: reserves {} / {}",
        address,
        balances[0].amount,
        balances[1].amount
    );
    swap.with_balances(&balances[0], &balances[1])
}

pub async fn fetch_wrap_info(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<WrapInfo> {
    fetch_record(source, &programs.saber_decimal_wrapper, address).await
}

/// Looks the wrapper up by its seeds and checks the stored nonce.
pub async fn fetch_wrapper_for_mint(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    underlying_mint: &Pubkey,
    decimals: u8,
) -> Result<WrapInfo> {
    let (address, bump) = derive_wrapper_address(programs, underlying_mint, decimals)?;
    let wrap = fetch_wrap_info(source, programs, &address).await?;
    if wrap.nonce != bump || wrap.underlying_mint != *underlying_mint {
        return Err(Error::malformed(format!(
            "WrapInfo {}: stored nonce {} / mint {} do not match seeds (bump {}, mint {})",
            address, wrap.nonce, wrap.underlying_mint, bump, underlying_mint
        )));
    }
    Ok(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::MemorySource;
    use crate::layout::AccountRecord;
    use crate::utils::token::encode_token_account;

    fn pool_fields(nonce: u8) -> crate::layout::Fields {
        let mut fields = SwapInfo::zeroed_fields().unwrap();
        fields.set("is_initialized", true);
        fields.set("nonce", nonce);
        for name in ["token_a", "token_b", "token_a_mint", "token_b_mint"] {
            fields.set(name, Pubkey::new_unique());
        }
        fields
    }

    #[test]
    fn test_swap_authority_from_nonce() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let swap_address = Pubkey::new_unique();
        let (authority, nonce) =
            pda::derive_address(&[swap_address.as_ref()], &programs.saber_swap).unwrap();
        let data = SwapInfo::encode_fields(&pool_fields(nonce)).unwrap();
        let swap = SwapInfo::decode(&data, swap_address).unwrap();
        assert_eq!(swap_authority(&programs, &swap).unwrap(), authority);
    }

    #[tokio::test]
    async fn test_fetch_swap_with_balances() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let address = Pubkey::new_unique();
        let fields = pool_fields(255);
        let reserve_a = fields.pubkey("token_a").unwrap();
        let reserve_b = fields.pubkey("token_b").unwrap();
        let mint_a = fields.pubkey("token_a_mint").unwrap();
        let mint_b = fields.pubkey("token_b_mint").unwrap();
        let authority = Pubkey::new_unique();

        let source = MemorySource::new()
            .with_account(address, programs.saber_swap, SwapInfo::encode_fields(&fields).unwrap())
            .with_account(
                reserve_a,
                spl_token::id(),
                encode_token_account(mint_a, authority, 7).unwrap(),
            )
            .with_account(
                reserve_b,
                spl_token::id(),
                encode_token_account(mint_b, authority, 9).unwrap(),
            );

        let swap = fetch_swap_with_balances(&source, &programs, &address).await.unwrap();
        assert_eq!(swap.token_a.balance, Some(7));
        assert_eq!(swap.token_b.balance, Some(9));
    }

    #[tokio::test]
    async fn test_fetch_wrapper_checks_seeds() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let mint = Pubkey::new_unique();
        let (address, bump) = derive_wrapper_address(&programs, &mint, 9).unwrap();
        let mut fields = WrapInfo::zeroed_fields().unwrap();
        fields.set("decimals", 9u8);
        fields.set("multiplier", 1_000u64);
        fields.set("wrapper_underlying_mint", mint);
        fields.set("nonce", bump);
        let source = MemorySource::new().with_account(
            address,
            programs.saber_decimal_wrapper,
            WrapInfo::encode_fields(&fields).unwrap(),
        );

        let wrap = fetch_wrapper_for_mint(&source, &programs, &mint, 9).await.unwrap();
        assert_eq!(wrap.address, address);
        assert!(matches!(
            fetch_wrapper_for_mint(&source, &programs, &mint, 6).await,
            Err(Error::NotFound(_))
        ));
    }
}
