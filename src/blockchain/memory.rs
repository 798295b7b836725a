use crate::blockchain::rpc_client::{AccountData, AccountFilter, AccountSource};
use crate::core::error::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;

/// Fixed set of accounts served from memory. Used for offline decoding of
/// dumped accounts and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    accounts: BTreeMap<Pubkey, AccountData>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.accounts.insert(
            address,
            AccountData {
                owner,
                lamports: 1,
                data,
            },
        );
    }

    pub fn with_account(mut self, address: Pubkey, owner: Pubkey, data: Vec<u8>) -> Self {
        self.insert(address, owner, data);
        self
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountSource for MemorySource {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>> {
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, AccountData)>> {
        Ok(self
            .accounts
            .iter()
            .filter(|(_, account)| account.owner == *program_id)
            .filter(|(_, account)| filters.iter().all(|f| f.matches(&account.data)))
            .map(|(address, account)| (*address, account.clone()))
            .collect())
    }
}
