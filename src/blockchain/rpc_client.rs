use crate::core::error::{Error, Result};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::rpc_client::RpcClient as SolanaRpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

/// Owner program, balance and raw data of a fetched account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl From<Account> for AccountData {
    fn from(account: Account) -> Self {
        AccountData {
            owner: account.owner,
            lamports: account.lamports,
            data: account.data,
        }
    }
}

/// getProgramAccounts filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    /// Exact bytes at `offset`.
    Memcmp { offset: usize, bytes: Vec<u8> },
    /// Exact account data length.
    DataSize(u64),
}

impl AccountFilter {
    pub fn memcmp_pubkey(offset: usize, key: &Pubkey) -> Self {
        AccountFilter::Memcmp {
            offset,
            bytes: key.to_bytes().to_vec(),
        }
    }

    /// Same predicate the RPC node applies, for in-memory sources.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::DataSize(n) => data.len() as u64 == *n,
            AccountFilter::Memcmp { offset, bytes } => offset
                .checked_add(bytes.len())
                .and_then(|end| data.get(*offset..end))
                .map_or(false, |window| window == bytes.as_slice()),
        }
    }
}

impl From<&AccountFilter> for RpcFilterType {
    fn from(filter: &AccountFilter) -> Self {
        match filter {
            AccountFilter::DataSize(n) => RpcFilterType::DataSize(*n),
            AccountFilter::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(*offset, bytes.clone()))
            }
        }
    }
}

/// Where account bytes come from. Decoders never fetch; callers go through this.
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// `None` when the account does not exist.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>>;

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, AccountData)>>;

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<AccountData>>> {
        let mut out = Vec::with_capacity(addresses.len());
        for address in addresses {
            out.push(self.get_account(address).await?);
        }
        Ok(out)
    }
}

/// JSON-RPC backed source. The blocking client runs on the blocking pool and
/// each call is bounded by `request_timeout`. No retries.
pub struct RpcClient {
    client: Arc<SolanaRpcClient>,
    rpc_url: String,
    commitment: CommitmentConfig,
    request_timeout: Duration,
}

impl RpcClient {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, request_timeout: Duration) -> Self {
        log::info!(
            "RpcClient: Initialized for {} with request_timeout={:?}, commitment={:?}",
            rpc_url,
            request_timeout,
            commitment.commitment
        );
        RpcClient {
            client: Arc::new(SolanaRpcClient::new_with_timeout_and_commitment(
                rpc_url.clone(),
                request_timeout,
                commitment,
            )),
            rpc_url,
            commitment,
            request_timeout,
        }
    }

    pub fn from_config(config: &crate::core::config::Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.rpc_http_url.clone(),
            config.commitment_config()?,
            config.request_timeout(),
        ))
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn run_blocking<T, F>(&self, what: String, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SolanaRpcClient) -> std::result::Result<T, String> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let rpc_url = self.rpc_url.clone();
        let timeout_duration = self.request_timeout;

        timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || call(&client)),
        )
        .await
        .map_err(|_| {
            Error::Rpc(format!("RPC request timeout after {:?} for {}", timeout_duration, what))
        })?
        .map_err(|e| Error::Rpc(format!("Failed to spawn blocking task: {}", e)))?
        .map_err(|e| Error::Rpc(format!("RPC error ({}): {}", rpc_url, e)))
    }
}

#[async_trait]
impl AccountSource for RpcClient {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountData>> {
        let pubkey = *address;
        let commitment = self.commitment;
        let account = self
            .run_blocking(format!("get_account({})", pubkey), move |client| {
                client
                    .get_account_with_commitment(&pubkey, commitment)
                    .map(|response| response.value)
                    .map_err(|e| e.to_string())
            })
            .await?;
        if account.is_none() {
            log::debug!("Account {} not found", pubkey);
        }
        Ok(account.map(AccountData::from))
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, AccountData)>> {
        let program_id = *program_id;
        let config = RpcProgramAccountsConfig {
            filters: Some(filters.iter().map(RpcFilterType::from).collect()),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };

        let accounts = self
            .run_blocking(
                format!("get_program_accounts_with_config({})", program_id),
                move |client| {
                    client
                        .get_program_accounts_with_config(&program_id, config)
                        .map_err(|e| e.to_string())
                },
            )
            .await?;
        log::debug!("get_program_accounts({}): {} accounts", program_id, accounts.len());
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, AccountData::from(account)))
            .collect())
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<AccountData>>> {
        let keys = addresses.to_vec();
        let commitment = self.commitment;
        let accounts = self
            .run_blocking(format!("get_multiple_accounts({} keys)", keys.len()), move |client| {
                client
                    .get_multiple_accounts_with_commitment(&keys, commitment)
                    .map(|response| response.value)
                    .map_err(|e| e.to_string())
            })
            .await?;
        Ok(accounts.into_iter().map(|a| a.map(AccountData::from)).collect())
    }
}
