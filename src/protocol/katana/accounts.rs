use crate::blockchain::rpc_client::{AccountFilter, AccountSource};
use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::fetch_record;
use crate::protocol::katana::types::{
    find_option_market, MissingPolicy, OptionMarket, OptionMarketQuery, OtcTerms, PricePerShare,
    UserAccount, Vault,
    OPTION_MARKET_UNDERLYING_OFFSET,
};
use crate::utils::pda;
use solana_sdk::pubkey::Pubkey;

pub const USER_ACCOUNT_SEED: &[u8] = b"user-account";
pub const PRICE_PER_SHARE_SEED: &[u8] = b"price-per-share";
pub const OTC_SEED: &[u8] = b"otc";

pub fn derive_user_account(
    programs: &ProgramRegistry,
    wallet: &Pubkey,
    vault: &Pubkey,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(&[USER_ACCOUNT_SEED, wallet.as_ref(), vault.as_ref()], &programs.katana)
}

/// Round number is seeded as a little-endian u64.
pub fn derive_price_per_share(
    programs: &ProgramRegistry,
    vault: &Pubkey,
    round: u64,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(
        &[PRICE_PER_SHARE_SEED, vault.as_ref(), &round.to_le_bytes()],
        &programs.katana,
    )
}

pub fn derive_otc_terms(
    programs: &ProgramRegistry,
    vault: &Pubkey,
    option_market: &Pubkey,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(&[OTC_SEED, vault.as_ref(), option_market.as_ref()], &programs.katana)
}

/// Whether `wallet` has initialized its depositor account for `vault`.
pub async fn user_account_exists(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    wallet: &Pubkey,
    vault: &Pubkey,
) -> Result<bool> {
    let (address, _) = derive_user_account(programs, wallet, vault)?;
    pda::account_exists(source, &address, &programs.katana).await
}

pub async fn fetch_vault(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Vault> {
    fetch_record(source, &programs.katana, address).await
}

pub async fn fetch_user_account(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    wallet: &Pubkey,
    vault: &Pubkey,
) -> Result<UserAccount> {
    let (address, _) = derive_user_account(programs, wallet, vault)?;
    fetch_record(source, &programs.katana, &address).await
}

pub async fn fetch_price_per_share(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    vault: &Pubkey,
    round: u64,
) -> Result<PricePerShare> {
    let (address, _) = derive_price_per_share(programs, vault, round)?;
    fetch_record(source, &programs.katana, &address).await
}

/// OTC terms of `vault` for `option_market`, which may not have been posted.
pub async fn fetch_otc_terms(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    vault: &Pubkey,
    option_market: &Pubkey,
    policy: MissingPolicy,
) -> Result<Option<OtcTerms>> {
    let (address, _) = derive_otc_terms(programs, vault, option_market)?;
    let account = source
        .get_account(&address)
        .await?
        .filter(|account| account.owner == programs.katana);
    OtcTerms::decode_optional(account.as_ref().map(|a| a.data.as_slice()), address, policy)
}

pub async fn fetch_option_market(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<OptionMarket> {
    fetch_record(source, &programs.psy_american, address).await
}

/// Every option market written on `underlying_mint`.
pub async fn fetch_option_markets(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    underlying_mint: &Pubkey,
) -> Result<Vec<OptionMarket>> {
    let filters = [
        AccountFilter::Memcmp {
            offset: 0,
            bytes: OptionMarket::DISCRIMINATOR.bytes().to_vec(),
        },
        AccountFilter::memcmp_pubkey(OPTION_MARKET_UNDERLYING_OFFSET, underlying_mint),
    ];
    let accounts = source.get_program_accounts(&programs.psy_american, &filters).await?;
    log::debug!("{} option markets on underlying {}", accounts.len(), underlying_mint);
    accounts
        .iter()
        .map(|(address, account)| OptionMarket::decode(&account.data, *address))
        .collect()
}

/// Option market for the vault's underlying matching `query`.
pub async fn search_option_market(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    vault: &Vault,
    query: &OptionMarketQuery,
    policy: MissingPolicy,
) -> Result<Option<OptionMarket>> {
    let markets = fetch_option_markets(source, programs, &vault.underlying_token_mint).await?;
    Ok(find_option_market(&markets, query, policy))
}
