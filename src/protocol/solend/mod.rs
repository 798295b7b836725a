pub mod accounts;
pub mod instructions;
pub mod types;

pub use types::*;

use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::{unknown_kind, DecodedAccount, Protocol};
use solana_sdk::pubkey::Pubkey;

/// Solend accounts carry no discriminator: the kind is told by size
/// and the leading version byte.
pub struct SolendProtocol {
    program_id: Pubkey,
}

impl SolendProtocol {
    pub fn new(programs: &ProgramRegistry) -> Self {
        SolendProtocol {
            program_id: programs.solend,
        }
    }
}

impl Protocol for SolendProtocol {
    fn id(&self) -> &str {
        "solend"
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str> {
        if *owner != self.program_id || data.first() != Some(&PROGRAM_VERSION) {
            return None;
        }
        match data.len() {
            LENDING_MARKET_LEN => Some(LendingMarket::NAME),
            RESERVE_LEN => Some(Reserve::NAME),
            len if len >= OBLIGATION_HEADER_LEN => Some(Obligation::NAME),
            _ => None,
        }
    }

    fn decode_account(
        &self,
        owner: &Pubkey,
        address: Pubkey,
        data: &[u8],
    ) -> Result<DecodedAccount> {
        match self.detect(owner, data) {
            Some(LendingMarket::NAME) => {
                Ok(DecodedAccount::LendingMarket(LendingMarket::decode(data, address)?))
            }
            Some(Reserve::NAME) => Ok(DecodedAccount::Reserve(Reserve::decode(data, address)?)),
            Some(Obligation::NAME) => {
                Ok(DecodedAccount::Obligation(Obligation::decode(data, address)?))
            }
            _ => Err(unknown_kind(self.id(), &address, data.len())),
        }
    }
}
