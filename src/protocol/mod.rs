pub mod katana;
pub mod marinade;
pub mod quarry;
pub mod saber;
pub mod solend;

use crate::blockchain::rpc_client::AccountSource;
use crate::core::error::{Error, Result};
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// A program family this crate knows the account layouts of.
pub trait Protocol: Send + Sync {
    fn id(&self) -> &str;

    /// Primary program of the family.
    fn program_id(&self) -> Pubkey;

    /// Every program whose accounts `decode_account` understands.
    fn program_ids(&self) -> Vec<Pubkey> {
        vec![self.program_id()]
    }

    /// Account kind name for `data` owned by `owner`, without decoding it.
    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str>;

    fn decode_account(
        &self,
        owner: &Pubkey,
        address: Pubkey,
        data: &[u8],
    ) -> Result<DecodedAccount>;
}

/// Any record a registered protocol can produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "account")]
pub enum DecodedAccount {
    LendingMarket(solend::LendingMarket),
    Reserve(solend::Reserve),
    Obligation(solend::Obligation),
    SwapInfo(saber::SwapInfo),
    WrapInfo(saber::WrapInfo),
    Quarry(quarry::Quarry),
    Miner(quarry::Miner),
    Rewarder(quarry::Rewarder),
    Vault(katana::Vault),
    UserAccount(katana::UserAccount),
    PricePerShare(katana::PricePerShare),
    OtcTerms(katana::OtcTerms),
    OptionMarket(katana::OptionMarket),
    MarinadeState(marinade::State),
}

impl DecodedAccount {
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedAccount::LendingMarket(_) => "LendingMarket",
            DecodedAccount::Reserve(_) => "Reserve",
            DecodedAccount::Obligation(_) => "Obligation",
            DecodedAccount::SwapInfo(_) => "SwapInfo",
            DecodedAccount::WrapInfo(_) => "WrapInfo",
            DecodedAccount::Quarry(_) => "Quarry",
            DecodedAccount::Miner(_) => "Miner",
            DecodedAccount::Rewarder(_) => "Rewarder",
            DecodedAccount::Vault(_) => "Vault",
            DecodedAccount::UserAccount(_) => "UserAccount",
            DecodedAccount::PricePerShare(_) => "PricePerShare",
            DecodedAccount::OtcTerms(_) => "OtcTerms",
            DecodedAccount::OptionMarket(_) => "OptionMarket",
            DecodedAccount::MarinadeState(_) => "MarinadeState",
        }
    }
}

pub(crate) fn unknown_kind(protocol: &str, address: &Pubkey, len: usize) -> Error {
    Error::malformed(format!(
        "{}: account {} ({} bytes) does not match any known layout",
        protocol, address, len
    ))
}

/// Fetches `address` and decodes it as `T`, requiring `owner` as its program.
pub(crate) async fn fetch_record<T: AccountRecord>(
    source: &dyn AccountSource,
    owner: &Pubkey,
    address: &Pubkey,
) -> Result<T> {
    let account = source
        .get_account(address)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", T::NAME, address)))?;
    if account.owner != *owner {
        return Err(Error::malformed(format!(
            "{} {} is owned by {}, expected {}",
            T::NAME,
            address,
            account.owner,
            owner
        )));
    }
    T::decode(&account.data, *address)
}

pub struct ProtocolRegistry {
    protocols: Vec<Box<dyn Protocol>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        ProtocolRegistry {
            protocols: Vec::new(),
        }
    }

    /// All built-in protocol families against the given deployment.
    pub fn with_programs(programs: &ProgramRegistry) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(solend::SolendProtocol::new(programs)));
        registry.register(Box::new(saber::SaberProtocol::new(programs)));
        registry.register(Box::new(quarry::QuarryProtocol::new(programs)));
        registry.register(Box::new(katana::KatanaProtocol::new(programs)));
        registry.register(Box::new(marinade::MarinadeProtocol::new(programs)));
        registry
    }

    pub fn register(&mut self, protocol: Box<dyn Protocol>) {
        let protocol_id = protocol.id().to_string();
        self.protocols.push(protocol);
        log::debug!("Protocol '{}' registered in registry", protocol_id);
    }

    pub fn find(&self, protocol_id: &str) -> Option<&dyn Protocol> {
        self.protocols
            .iter()
            .find(|p| p.id() == protocol_id)
            .map(|p| p.as_ref())
    }

    pub fn find_by_program(&self, program_id: &Pubkey) -> Option<&dyn Protocol> {
        self.protocols
            .iter()
            .find(|p| p.program_ids().contains(program_id))
            .map(|p| p.as_ref())
    }

    pub fn all(&self) -> &[Box<dyn Protocol>] {
        &self.protocols
    }

    pub fn count(&self) -> usize {
        self.protocols.len()
    }

    /// Decodes an account by its owner program.
    pub fn decode(&self, owner: &Pubkey, address: Pubkey, data: &[u8]) -> Result<DecodedAccount> {
        let protocol = self
            .find_by_program(owner)
            .ok_or_else(|| {
                Error::NotFound(format!("no registered protocol owns program {}", owner))
            })?;
        protocol.decode_account(owner, address, data)
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let registry = ProtocolRegistry::with_programs(&programs);
        assert_eq!(registry.count(), 5);
        assert_eq!(registry.find("solend").unwrap().program_id(), programs.solend);
        assert_eq!(registry.find_by_program(&programs.psy_american).unwrap().id(), "katana");
        assert_eq!(
            registry.find_by_program(&programs.saber_decimal_wrapper).unwrap().id(),
            "saber"
        );
        assert!(registry.find("kamino").is_none());
    }

    #[test]
    fn test_unknown_owner() {
        let registry = ProtocolRegistry::with_programs(&ProgramRegistry::mainnet().unwrap());
        assert!(matches!(
            registry.decode(&Pubkey::new_unique(), Pubkey::new_unique(), &[]),
            Err(Error::NotFound(_))
        ));
    }
}
