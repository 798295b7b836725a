pub mod accounts;
pub mod instructions;
pub mod types;

pub use types::*;

use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::{unknown_kind, DecodedAccount, Protocol};
use solana_sdk::pubkey::Pubkey;

pub struct QuarryProtocol {
    program_id: Pubkey,
}

impl QuarryProtocol {
    pub fn new(programs: &ProgramRegistry) -> Self {
        QuarryProtocol {
            program_id: programs.quarry_mine,
        }
    }
}

impl Protocol for QuarryProtocol {
    fn id(&self) -> &str {
        "quarry"
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str> {
        if *owner != self.program_id {
            return None;
        }
        if Quarry::DISCRIMINATOR.matches(data) {
            Some(Quarry::NAME)
        } else if Miner::DISCRIMINATOR.matches(data) {
            Some(Miner::NAME)
        } else if Rewarder::DISCRIMINATOR.matches(data) {
            Some(Rewarder::NAME)
        } else {
            None
        }
    }

    fn decode_account(
        &self,
        owner: &Pubkey,
        address: Pubkey,
        data: &[u8],
    ) -> Result<DecodedAccount> {
        match self.detect(owner, data) {
            Some(Quarry::NAME) => Ok(DecodedAccount::Quarry(Quarry::decode(data, address)?)),
            Some(Miner::NAME) => Ok(DecodedAccount::Miner(Miner::decode(data, address)?)),
            Some(Rewarder::NAME) => Ok(DecodedAccount::Rewarder(Rewarder::decode(data, address)?)),
            _ => Err(unknown_kind(self.id(), &address, data.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_discriminator() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let protocol = QuarryProtocol::new(&programs);
        let miner = Miner::encode_fields(&Miner::zeroed_fields().unwrap()).unwrap();
        let rewarder = Rewarder::encode_fields(&Rewarder::zeroed_fields().unwrap()).unwrap();
        assert_eq!(protocol.detect(&programs.quarry_mine, &miner), Some("Miner"));
        assert_eq!(protocol.detect(&programs.quarry_mine, &rewarder), Some("Rewarder"));
        assert_eq!(protocol.detect(&programs.quarry_mine, &[0u8; 16]), None);
        assert!(protocol
            .decode_account(&programs.quarry_mine, Pubkey::new_unique(), &[0u8; 16])
            .is_err());
    }
}
