pub mod accounts;
pub mod instructions;
pub mod types;

pub use types::*;

use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::{unknown_kind, DecodedAccount, Protocol};
use solana_sdk::pubkey::Pubkey;

pub struct MarinadeProtocol {
    program_id: Pubkey,
}

impl MarinadeProtocol {
    pub fn new(programs: &ProgramRegistry) -> Self {
        MarinadeProtocol {
            program_id: programs.marinade,
        }
    }
}

impl Protocol for MarinadeProtocol {
    fn id(&self) -> &str {
        "marinade"
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str> {
        (*owner == self.program_id && State::DISCRIMINATOR.matches(data)).then_some(State::NAME)
    }

    fn decode_account(
        &self,
        owner: &Pubkey,
        address: Pubkey,
        data: &[u8],
    ) -> Result<DecodedAccount> {
        match self.detect(owner, data) {
            Some(State::NAME) => Ok(DecodedAccount::MarinadeState(State::decode(data, address)?)),
            _ => Err(unknown_kind(self.id(), &address, data.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_state() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let protocol = MarinadeProtocol::new(&programs);
        let data = State::encode_fields(&State::zeroed_fields().unwrap()).unwrap();
        assert_eq!(protocol.detect(&programs.marinade, &data), Some("State"));
        assert_eq!(protocol.detect(&programs.katana, &data), None);
        let decoded = protocol
            .decode_account(&programs.marinade, programs.marinade_state, &data)
            .unwrap();
        assert_eq!(decoded.kind(), "MarinadeState");
    }
}
