use crate::blockchain::rpc_client::{AccountFilter, AccountSource};
use crate::core::error::{Error, Result};
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::fetch_record;
use crate::protocol::solend::types::{
    LendingMarket, Obligation, Reserve, LENDING_MARKET_OFFSET, OBLIGATION_LEN,
    OBLIGATION_OWNER_OFFSET,
    RESERVE_LEN,
};
use crate::utils::pda;
use solana_sdk::pubkey::Pubkey;

/// Signer for the market's token supplies: PDA of `[lending_market]`.
pub fn derive_lending_market_authority(
    programs: &ProgramRegistry,
    lending_market: &Pubkey,
) -> Result<Pubkey> {
    pda::derive_address(&[lending_market.as_ref()], &programs.solend).map(|(address, _)| address)
}

/// Same address from the bump stored in the market account.
pub fn lending_market_authority(
    programs: &ProgramRegistry,
    market: &LendingMarket,
) -> Result<Pubkey> {
    pda::create_address(&[market.address.as_ref(), &[market.bump_seed]], &programs.solend)
}

/// Obligations are seed accounts of the wallet: seed is the first 32
/// characters of the market address in base58.
pub fn derive_obligation_address(
    programs: &ProgramRegistry,
    wallet: &Pubkey,
    lending_market: &Pubkey,
) -> Result<Pubkey> {
    let market = lending_market.to_string();
    let seed = market.get(..32).unwrap_or(market.as_str());
    pda::create_with_seed(wallet, seed, &programs.solend)
}

pub async fn fetch_lending_market(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<LendingMarket> {
    fetch_record(source, &programs.solend, address).await
}

pub async fn fetch_reserve(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Reserve> {
    fetch_record(source, &programs.solend, address).await
}

pub async fn fetch_obligation(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Obligation> {
    fetch_record(source, &programs.solend, address).await
}

/// Every reserve of `lending_market`.
pub async fn fetch_market_reserves(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    lending_market: &Pubkey,
) -> Result<Vec<Reserve>> {
    let filters = [
        AccountFilter::DataSize(RESERVE_LEN as u64),
        AccountFilter::memcmp_pubkey(LENDING_MARKET_OFFSET, lending_market),
    ];
    let accounts = source.get_program_accounts(&programs.solend, &filters).await?;
    log::debug!("Market {}: {} reserve accounts", lending_market, accounts.len());
    accounts
        .iter()
        .map(|(address, account)| Reserve::decode(&account.data, *address))
        .collect()
}

/// Every obligation whose owner is `owner`, across markets.
pub async fn fetch_owner_obligations(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    owner: &Pubkey,
) -> Result<Vec<Obligation>> {
    let filters = [
        AccountFilter::DataSize(OBLIGATION_LEN as u64),
        AccountFilter::memcmp_pubkey(OBLIGATION_OWNER_OFFSET, owner),
    ];
    let accounts = source.get_program_accounts(&programs.solend, &filters).await?;
    accounts
        .iter()
        .map(|(address, account)| Obligation::decode(&account.data, *address))
        .collect()
}

/// Reserves referenced by an obligation, in deposit-then-borrow order, deduplicated.
pub async fn fetch_obligation_reserves(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    obligation: &Obligation,
) -> Result<Vec<Reserve>> {
    let mut addresses: Vec<Pubkey> = Vec::new();
    for address in obligation.deposit_reserves().into_iter().chain(obligation.borrow_reserves()) {
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    let mut reserves = Vec::with_capacity(addresses.len());
    let accounts = source.get_multiple_accounts(&addresses).await?;
    for (address, account) in addresses.iter().zip(accounts) {
        let account = account.ok_or_else(|| Error::NotFound(format!("Reserve {}", address)))?;
        reserves.push(Reserve::decode(&account.data, *address)?);
    }
    Ok(reserves)
}
