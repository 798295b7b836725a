pub mod accounts;
pub mod instructions;
pub mod types;

pub use types::*;

use crate::core::error::Result;
use crate::core::registry::ProgramRegistry;
use crate::layout::AccountRecord;
use crate::protocol::{unknown_kind, DecodedAccount, Protocol};
use solana_sdk::pubkey::Pubkey;

/// Covered-call vaults and the PsyOptions markets they write on.
pub struct KatanaProtocol {
    program_id: Pubkey,
    options_program: Pubkey,
}

impl KatanaProtocol {
    pub fn new(programs: &ProgramRegistry) -> Self {
        KatanaProtocol {
            program_id: programs.katana,
            options_program: programs.psy_american,
        }
    }
}

impl Protocol for KatanaProtocol {
    fn id(&self) -> &str {
        "katana"
    }

    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn program_ids(&self) -> Vec<Pubkey> {
        vec![self.program_id, self.options_program]
    }

    fn detect(&self, owner: &Pubkey, data: &[u8]) -> Option<&'static str> {
        if *owner == self.options_program {
            return OptionMarket::DISCRIMINATOR.matches(data).then_some(OptionMarket::NAME);
        }
        if *owner != self.program_id {
            return None;
        }
        [
            (Vault::DISCRIMINATOR, Vault::NAME),
            (UserAccount::DISCRIMINATOR, UserAccount::NAME),
            (PricePerShare::DISCRIMINATOR, PricePerShare::NAME),
            (OtcTerms::DISCRIMINATOR, OtcTerms::NAME),
        ]
        .into_iter()
        .find(|(discriminator, _)| discriminator.matches(data))
        .map(|(_, name)| name)
    }

    fn decode_account(
        &self,
        owner: &Pubkey,
        address: Pubkey,
        data: &[u8],
    ) -> Result<DecodedAccount> {
        match self.detect(owner, data) {
            Some(Vault::NAME) => Ok(DecodedAccount::Vault(Vault::decode(data, address)?)),
            Some(UserAccount::NAME) => {
                Ok(DecodedAccount::UserAccount(UserAccount::decode(data, address)?))
            }
            Some(PricePerShare::NAME) => {
                Ok(DecodedAccount::PricePerShare(PricePerShare::decode(data, address)?))
            }
            Some(OtcTerms::NAME) => Ok(DecodedAccount::OtcTerms(OtcTerms::decode(data, address)?)),
            Some(OptionMarket::NAME) => {
                Ok(DecodedAccount::OptionMarket(OptionMarket::decode(data, address)?))
            }
            _ => Err(unknown_kind(self.id(), &address, data.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_markets_decode_under_psy_program() {
        let programs = ProgramRegistry::mainnet().unwrap();
        let protocol = KatanaProtocol::new(&programs);
        let data = OptionMarket::encode_fields(&OptionMarket::zeroed_fields().unwrap()).unwrap();
        assert_eq!(protocol.detect(&programs.psy_american, &data), Some("OptionMarket"));
        assert_eq!(protocol.detect(&programs.katana, &data), None);

        let pps = PricePerShare::encode_fields(&PricePerShare::zeroed_fields().unwrap()).unwrap();
        let decoded =
            protocol.decode_account(&programs.katana, Pubkey::new_unique(), &pps).unwrap();
        assert_eq!(decoded.kind(), "PricePerShare");
    }
}
