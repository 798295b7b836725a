use crate::core::error::{Error, Result};
use sha2::{Digest, Sha256};

/// Account / instruction type tag at the start of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    /// Legacy layouts that start directly with their fields.
    None,
    /// Single-byte enum tag (SPL-style instruction sets).
    Tag(u8),
    /// `sha256("<namespace>:<name>")[..8]`.
    Anchor([u8; 8]),
}

impl Discriminator {
    pub const fn width(&self) -> usize {
        match self {
            Discriminator::None => 0,
            Discriminator::Tag(_) => 1,
            Discriminator::Anchor(_) => 8,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Discriminator::None => &[],
            Discriminator::Tag(tag) => std::slice::from_ref(tag),
            Discriminator::Anchor(bytes) => bytes,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.bytes());
    }

    /// Returns the bytes after the tag, failing if the tag is absent or different.
    pub fn strip<'a>(&self, data: &'a [u8], what: &str) -> Result<&'a [u8]> {
        let width = self.width();
        if data.len() < width {
            return Err(Error::truncated(width, data.len()));
        }
        let (tag, rest) = data.split_at(width);
        if tag != self.bytes() {
            return Err(Error::malformed(format!(
                "{}: discriminator mismatch, expected {:02x?}, got {:02x?}",
                what,
                self.bytes(),
                tag
            )));
        }
        Ok(rest)
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() >= self.width() && &data[..self.width()] == self.bytes()
    }
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Anchor account discriminator for `name` (struct name, CamelCase).
pub fn anchor_account(name: &str) -> [u8; 8] {
    sighash("account", name)
}

/// Anchor instruction discriminator for `name` (handler name, snake_case).
pub fn anchor_instruction(name: &str) -> [u8; 8] {
    sighash("global", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sighashes() {
        assert_eq!(
            anchor_instruction("stake_tokens"),
            [0x88, 0x7e, 0x5b, 0xa2, 0x28, 0x83, 0x0d, 0x7f]
        );
        assert_eq!(
            anchor_account("Miner"),
            [0xdf, 0x71, 0x0f, 0x36, 0x7b, 0x7a, 0x8c, 0x64]
        );
    }

    #[test]
    fn test_strip() {
        let disc = Discriminator::Anchor(anchor_account("Miner"));
        let mut data = disc.bytes().to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        assert_eq!(disc.strip(&data, "Miner").unwrap(), &[1, 2, 3]);
        assert!(disc.matches(&data));

        data[0] ^= 0xff;
        assert!(matches!(disc.strip(&data, "Miner"), Err(Error::MalformedAccount(_))));
        assert!(matches!(disc.strip(&data[..4], "Miner"), Err(Error::TruncatedBuffer { .. })));
    }

    #[test]
    fn test_legacy_has_no_prefix() {
        assert_eq!(Discriminator::None.strip(&[9, 9], "x").unwrap(), &[9, 9]);
        assert_eq!(Discriminator::Tag(12).bytes(), &[12]);
        assert_eq!(Discriminator::Tag(12).width(), 1);
    }
}
