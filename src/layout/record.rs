use super::{Discriminator, Fields, Layout, Value};
use crate::core::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

/// A typed on-chain account with a static layout.
///
/// Implementors supply the schema and the mapping from decoded [`Fields`];
/// discriminator handling and length checks are shared.
pub trait AccountRecord: Sized {
    const NAME: &'static str;
    const DISCRIMINATOR: Discriminator;
    const LAYOUT: Layout;

    /// `address` is the account the bytes were read from and becomes the
    /// record's identity.
    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self>;

    /// Minimum account size including the discriminator.
    fn span() -> Result<usize> {
        Ok(Self::DISCRIMINATOR.width() + Self::LAYOUT.span()?)
    }

    fn decode(data: &[u8], address: Pubkey) -> Result<Self> {
        let needed = Self::span()?;
        if data.len() < needed {
            return Err(Error::truncated(needed, data.len()));
        }
        let body = Self::DISCRIMINATOR.strip(data, Self::NAME)?;
        let (value, consumed) = Self::LAYOUT.decode(body)?;
        log::debug!(
            "Decoded {} {} ({} of {} bytes)",
            Self::NAME,
            address,
            consumed + Self::DISCRIMINATOR.width(),
            data.len()
        );
        let fields = value.into_struct(Self::NAME)?;
        Self::from_fields(address, &fields)
    }

    /// Discriminator followed by the encoded fields; used to build fixtures
    /// and simulated accounts.
    fn encode_fields(fields: &Fields) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::span()?);
        Self::DISCRIMINATOR.write(&mut out);
        Self::LAYOUT.encode(&Value::Struct(fields.clone()), &mut out)?;
        Ok(out)
    }

    /// All-zero field set for this record's layout.
    fn zeroed_fields() -> Result<Fields> {
        Self::LAYOUT.zeroed_fields()
    }
}
