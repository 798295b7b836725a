use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Truncated buffer: needed {needed} bytes, got {available}")]
    TruncatedBuffer { needed: usize, available: usize },

    #[error("Malformed account: {0}")]
    MalformedAccount(String),

    #[error("Field overflow: '{field}' value {value} does not fit in {width} bytes")]
    FieldOverflow {
        field: String,
        value: String,
        width: usize,
    },

    #[error("Type mismatch on field '{field}': expected {expected}")]
    TypeMismatch { field: String, expected: &'static str },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Math overflow: {0}")]
    MathOverflow(&'static str),

    #[error("No valid bump seed found for program {program_id}")]
    AddressDerivationExhausted { program_id: Pubkey },

    #[error("Seeded address derivation from {base} with seed {seed:?} failed: {reason}")]
    SeedDerivation {
        base: Pubkey,
        seed: String,
        reason: String,
    },

    #[error("Obligation references reserve {0} which is not in the supplied reserve set")]
    UnknownReserveReference(Pubkey),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl Error {
    pub fn truncated(needed: usize, available: usize) -> Self {
        Error::TruncatedBuffer { needed, available }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedAccount(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
