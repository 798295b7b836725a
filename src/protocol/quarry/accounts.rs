use crate::blockchain::rpc_client::{AccountFilter, AccountSource};
use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::fetch_record;
use crate::protocol::quarry::types::{
    Miner, Quarry, Rewarder, MINER_AUTHORITY_OFFSET, QUARRY_REWARDER_OFFSET,
};
use crate::utils::{pda, token};
use solana_sdk::pubkey::Pubkey;

pub const MINER_SEED: &[u8] = b"Miner";
pub const QUARRY_SEED: &[u8] = b"Quarry";
pub const MINTER_SEED: &[u8] = b"MintWrapperMinter";

pub fn derive_quarry_address(
    programs: &ProgramRegistry,
    rewarder: &Pubkey,
    token_mint: &Pubkey,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(
        &[QUARRY_SEED, rewarder.as_ref(), token_mint.as_ref()],
        &programs.quarry_mine,
    )
}

pub fn derive_miner_address(
    programs: &ProgramRegistry,
    quarry: &Pubkey,
    authority: &Pubkey,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(&[MINER_SEED, quarry.as_ref(), authority.as_ref()], &programs.quarry_mine)
}

/// Miner of `authority` in an already decoded farm.
pub fn quarry_miner_address(
    programs: &ProgramRegistry,
    quarry: &Quarry,
    authority: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_miner_address(programs, &quarry.address, authority)
}

/// Token account holding a miner's stake: the miner's associated account
/// for the quarry mint.
pub fn miner_vault_address(miner: &Pubkey, token_mint: &Pubkey) -> Pubkey {
    token::associated_token_address(miner, token_mint)
}

/// Minter record of the rewarder under the mint wrapper program.
pub fn derive_minter_address(
    programs: &ProgramRegistry,
    mint_wrapper: &Pubkey,
    rewarder: &Pubkey,
) -> Result<(Pubkey, u8)> {
    pda::derive_address(
        &[MINTER_SEED, mint_wrapper.as_ref(), rewarder.as_ref()],
        &programs.quarry_mint_wrapper,
    )
}

pub async fn fetch_quarry(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Quarry> {
    fetch_record(source, &programs.quarry_mine, address).await
}

pub async fn fetch_miner(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Miner> {
    fetch_record(source, &programs.quarry_mine, address).await
}

pub async fn fetch_rewarder(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    address: &Pubkey,
) -> Result<Rewarder> {
    fetch_record(source, &programs.quarry_mine, address).await
}

/// The miner of `authority` in `quarry`, or `None` if it was never created.
pub async fn find_miner(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    quarry: &Quarry,
    authority: &Pubkey,
) -> Result<Option<Miner>> {
    let (address, _) = quarry_miner_address(programs, quarry, authority)?;
    if !pda::account_exists(source, &address, &programs.quarry_mine).await? {
        return Ok(None);
    }
    fetch_miner(source, programs, &address).await.map(Some)
}

fn discriminator_filter<T: AccountRecord>() -> AccountFilter {
    AccountFilter::Memcmp {
        offset: 0,
        bytes: T::DISCRIMINATOR.bytes().to_vec(),
    }
}

/// Every quarry of `rewarder`.
pub async fn fetch_rewarder_quarries(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    rewarder: &Pubkey,
) -> Result<Vec<Quarry>> {
    let filters = [
        discriminator_filter::<Quarry>(),
        AccountFilter::memcmp_pubkey(QUARRY_REWARDER_OFFSET, rewarder),
    ];
    let accounts = source.get_program_accounts(&programs.quarry_mine, &filters).await?;
    log::debug!("Rewarder {}: {} quarries", rewarder, accounts.len());
    accounts
        .iter()
        .map(|(address, account)| Quarry::decode(&account.data, *address))
        .collect()
}

/// Every miner owned by `authority`, across quarries.
pub async fn fetch_authority_miners(
    source: &dyn AccountSource,
    programs: &ProgramRegistry,
    authority: &Pubkey,
) -> Result<Vec<Miner>> {
    let filters = [
        discriminator_filter::<Miner>(),
        AccountFilter::memcmp_pubkey(MINER_AUTHORITY_OFFSET, authority),
    ];
    let accounts = source.get_program_accounts(&programs.quarry_mine, &filters).await?;
    accounts
        .iter()
        .map(|(address, account)| Miner::decode(&account.data, *address))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::MemorySource;

    #[test]
    fn test_miner_from_decoded_quarry() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let rewarder = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let (quarry_address, _) = derive_quarry_address(&programs, &rewarder, &mint).unwrap();

        let mut fields = Quarry::zeroed_fields().unwrap();
        fields.set("rewarder", rewarder);
        fields.set("token_mint_key", mint);
        let data = Quarry::encode_fields(&fields).unwrap();
        let quarry = Quarry::decode(&data, quarry_address).unwrap();

        let authority = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(
            &[b"Miner", quarry_address.as_ref(), authority.as_ref()],
            &programs.quarry_mine,
        );
        assert_eq!(quarry_miner_address(&programs, &quarry, &authority).unwrap(), expected);
    }

    fn miner_bytes(quarry: Pubkey, authority: Pubkey) -> Vec<u8> {
        let mut fields = Miner::zeroed_fields().unwrap();
        fields.set("quarry", quarry);
        fields.set("authority", authority);
        fields.set("balance", 77u64);
        Miner::encode_fields(&fields).unwrap()
    }

    #[tokio::test]
    async fn test_find_miner() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let mut fields = Quarry::zeroed_fields().unwrap();
        fields.set("rewarder", Pubkey::new_unique());
        let data = Quarry::encode_fields(&fields).unwrap();
        let quarry = Quarry::decode(&data, Pubkey::new_unique()).unwrap();
        let authority = Pubkey::new_unique();
        let (miner_address, _) = quarry_miner_address(&programs, &quarry, &authority).unwrap();

        let empty = MemorySource::new();
        assert_eq!(find_miner(&empty, &programs, &quarry, &authority).await.unwrap(), None);

        let source = MemorySource::new().with_account(
            miner_address,
            programs.quarry_mine,
            miner_bytes(quarry.address, authority),
        );
        let miner = find_miner(&source, &programs, &quarry, &authority).await.unwrap().unwrap();
        assert_eq!(miner.address, miner_address);
        assert_eq!(miner.balance, 77);
    }

    #[tokio::test]
    async fn test_fetch_authority_miners_filters() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let authority = Pubkey::new_unique();
        let source = MemorySource::new()
            .with_account(
                Pubkey::new_unique(),
                programs.quarry_mine,
                miner_bytes(Pubkey::new_unique(), authority),
            )
            .with_account(
                Pubkey::new_unique(),
                programs.quarry_mine,
                miner_bytes(Pubkey::new_unique(), Pubkey::new_unique()),
            )
            .with_account(
                Pubkey::new_unique(),
                programs.solend,
                miner_bytes(Pubkey::new_unique(), authority),
            );
        let miners = fetch_authority_miners(&source, &programs, &authority).await.unwrap();
        assert_eq!(miners.len(), 1);
        assert_eq!(miners[0].authority, authority);
    }
}
