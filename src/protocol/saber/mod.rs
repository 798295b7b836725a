pub mod accounts;
pub mod instructions;
pub mod types;

pub use types::*;

use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::{unknown_kind, DecodedAccount, Protocol};
use solana_sdk::pubkey::Pubkey;

/// Stable-swap pools plus the decimal wrapper program.
pub struct SaberProtocol {
    swap_program: Pubkey,
    wrapper_program: Pubkey,
}

impl SaberProtocol {
    pub fn new(programs: &ProgramRegistry) -> Self {
        SaberProtocol {
            swap_program: programs.saber_swap,
            wrapper_program: programs.saber_decimal_wrapper,
        }
    }
}

impl Protocol for SaberProtocol {
    fn id(&self) -> &str {
        "saber"
    }

    fn program_id(&self) -> Pubkey {
        self.swap_program
    }

    fn program_ids(&self) -> Vec<Pubkey> {
        vec![self.swap_program, self.wrapper_program]
    }

    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str> {
        if *owner == self.swap_program && data.len() == SWAP_INFO_LEN {
            Some(SwapInfo::NAME)
        } else if *owner == self.wrapper_program && WrapInfo::DISCRIMINATOR.matches(data) {
            Some(WrapInfo::NAME)
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
            Some(SwapInfo::NAME) => Ok(DecodedAccount::SwapInfo(SwapInfo::decode(data, address)?)),
            Some(WrapInfo::NAME) => Ok(DecodedAccount::WrapInfo(WrapInfo::decode(data, address)?)),
            _ => Err(unknown_kind(self.id(), &address, data.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_wrapper_by_discriminator() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let protocol = SaberProtocol::new(&programs);
        let data = WrapInfo::encode_fields(&WrapInfo::zeroed_fields().unwrap()).unwrap();
        assert_eq!(protocol.detect(&programs.saber_decimal_wrapper, &data), Some("WrapInfo"));
        assert_eq!(protocol.detect(&programs.saber_swap, &data), None);
        let decoded = protocol
            .decode_account(&programs.saber_decimal_wrapper, Pubkey::new_unique(), &data)
            .unwrap();
        assert_eq!(decoded.kind(), "WrapInfo");
    }
}
