use crate::blockchain::rpc_client::AccountSource;
use crate::core::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

/// Program-derived address and bump, searching bumps from 255 down.
pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    let (address, bump) = Pubkey::try_find_program_address(seeds, program_id)
        .ok_or(Error::AddressDerivationExhausted { program_id: *program_id })?;
    log::debug!("Derived {} (bump {}) under {}", address, bump, program_id);
    Ok((address, bump))
}

/// Address for seeds that already include the bump (stored nonce).
pub fn create_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey> {
    Pubkey::create_program_address(seeds, program_id).map_err(|e| {
        log::debug!("create_program_address under {} failed: {}", program_id, e);
        Error::AddressDerivationExhausted { program_id: *program_id }
    })
}

/// `Pubkey::create_with_seed` with the crate error type.
pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Result<Pubkey> {
    Pubkey::create_with_seed(base, seed, owner).map_err(|e| Error::SeedDerivation {
        base: *base,
        seed: seed.to_string(),
        reason: e.to_string(),
    })
}

/// True if `address` exists and is owned by `owner`. A derived account is
/// only considered initialized when its owner program matches.
pub async fn account_exists(
    source: &dyn AccountSource,
    address: &Pubkey,
    owner: &Pubkey,
) -> Result<bool> {
    let exists = match source.get_account(address).await? {
        Some(account) => account.owner == *owner,
        None => false,
    };
    log::debug!("account_exists({}, owner {}) = {}", address, owner, exists);
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::MemorySource;

    #[test]
    fn test_derive_is_deterministic() {
        let program = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let seeds: &[&[u8]] = &[b"user-account", wallet.as_ref(), vault.as_ref()];

        let first = derive_address(seeds, &program).unwrap();
        let second = derive_address(seeds, &program).unwrap();
        assert_eq!(first, second);
        assert!(!first.0.is_on_curve());
        assert_eq!(
            create_address(&[seeds[0], seeds[1], seeds[2], &[first.1]], &program).unwrap(),
            first.0
        );
    }

    #[test]
    fn test_invalid_seeds_are_exhausted() {
        let program = Pubkey::new_unique();
        let long = [0u8; 33];
        assert_eq!(
            derive_address(&[&long], &program),
            Err(Error::AddressDerivationExhausted { program_id: program })
        );
    }

    #[test]
    fn test_create_with_seed_rejects_long_seed() {
        let base = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        assert!(create_with_seed(&base, "lending", &owner).is_ok());

        let long = "x".repeat(33);
        assert!(matches!(
            create_with_seed(&base, &long, &owner),
            Err(Error::SeedDerivation { base: b, seed, .. }) if b == base && seed == long
        ));
    }

    #[tokio::test]
    async fn test_account_exists_compares_owner() {
        let owner = Pubkey::new_unique();
        let address = Pubkey::new_unique();
        let source = MemorySource::new().with_account(address, owner, vec![0; 8]);

        assert!(account_exists(&source, &address, &owner).await.unwrap());
        assert!(!account_exists(&source, &address, &Pubkey::new_unique()).await.unwrap());
        assert!(!account_exists(&source, &Pubkey::new_unique(), &owner).await.unwrap());
    }
}
