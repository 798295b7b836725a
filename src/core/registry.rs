//! Program and well-known account addresses.
//!
//! `ProgramIds` holds the mainnet strings; `ProgramRegistry` is the parsed value
//! that decoders, builders and fetch helpers take as a parameter, so a fork or
//! devnet deployment only needs a different registry.

use crate::core::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Program IDs (Mainnet)
pub struct ProgramIds;

impl ProgramIds {
    pub const SOLEND: &'static str = "So1endDq2YkqhipRh3WViPa8hdiSpxWy6z3Z6tMCpAo";

    /// Saber StableSwap
    pub const SABER_SWAP: &'static str = "SSwpkEEcbUqx4vtoEByFjSkhKdCT862DNVb52nZg1UZ";

    /// Saber decimal wrapper
    pub const SABER_DECIMAL_WRAPPER: &'static str = "DecZY86MU5Gj7kppfUCEmd4LbXXuyZH1yHaP2NTqdiZB";

    pub const QUARRY_MINE: &'static str = "QMNeHCGYnLVDn1icRAfQZpjPLBNkfGbSKRB83G5d8KB";
    pub const QUARRY_MINT_WRAPPER: &'static str = "QMWoBmAyJLAsA1Lh9ugMTw2gciTihncciphzdNzdZYV";

    /// Katana covered-call vaults
    pub const KATANA: &'static str = "1349iiGjWC7ZTbu6otFmJwFjZmiqLTzH32FYZsxcDaHr";

    /// PsyOptions American, owner of the option markets Katana writes into
    pub const PSY_AMERICAN: &'static str = "R2y9ip6mxmWUj4pt54jP2hz2dgvMozy9VTSwMWE7evs";

    pub const MARINADE: &'static str = "MarBmsSgKXdrN1egZf5sqe1TMai9K1rChYNDJgjq7aD";

    pub fn solend() -> Result<Pubkey> { Self::parse(Self::SOLEND, "Solend program ID") }
    pub fn saber_swap() -> Result<Pubkey> { Self::parse(Self::SABER_SWAP, "Saber swap program ID") }
    pub fn saber_decimal_wrapper() -> Result<Pubkey> {
        Self::parse(Self::SABER_DECIMAL_WRAPPER, "Saber decimal wrapper program ID")
    }
    pub fn quarry_mine() -> Result<Pubkey> {
        Self::parse(Self::QUARRY_MINE, "Quarry mine program ID")
    }
    pub fn quarry_mint_wrapper() -> Result<Pubkey> {
        Self::parse(Self::QUARRY_MINT_WRAPPER, "Quarry mint wrapper program ID")
    }
    pub fn katana() -> Result<Pubkey> { Self::parse(Self::KATANA, "Katana program ID") }
    pub fn psy_american() -> Result<Pubkey> {
        Self::parse(Self::PSY_AMERICAN, "PsyOptions program ID")
    }
    pub fn marinade() -> Result<Pubkey> { Self::parse(Self::MARINADE, "Marinade program ID") }

    fn parse(addr: &str, name: &str) -> Result<Pubkey> {
        parse_pubkey(addr, name)
    }
}

/// Singleton accounts owned by the programs above (Mainnet)
pub struct AccountAddresses;

impl AccountAddresses {
    pub const MARINADE_STATE: &'static str = "8szGkuLTAux9XMgZ2vtY39jVSowEcpBfFfD8hXSEqdGC";
    pub const MSOL_MINT: &'static str = "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So";

    /// Solend main lending market
    pub const SOLEND_MAIN_MARKET: &'static str = "4UpD2fh7xH3VP9QQaXtsS1YY3bxzWhtfpks7FatyKvdY";
    /// Solend main market USDC reserve
    pub const SOLEND_USDC_RESERVE: &'static str = "BgxfHJDzm44T7XG68MYKx7YisTjZu73tVovyZSjJMpmw";

    pub fn marinade_state() -> Result<Pubkey> {
        parse_pubkey(Self::MARINADE_STATE, "Marinade state")
    }
    pub fn msol_mint() -> Result<Pubkey> { parse_pubkey(Self::MSOL_MINT, "mSOL mint") }
    pub fn solend_main_market() -> Result<Pubkey> {
        parse_pubkey(Self::SOLEND_MAIN_MARKET, "Solend main market")
    }
    pub fn solend_usdc_reserve() -> Result<Pubkey> {
        parse_pubkey(Self::SOLEND_USDC_RESERVE, "Solend USDC reserve")
    }
}

pub fn parse_pubkey(addr: &str, name: &str) -> Result<Pubkey> {
    Pubkey::from_str(addr)
        .map_err(|e| Error::Config(format!("Failed to parse {} '{}': {}", name, addr, e)))
}

/// Addresses every protocol module is parameterized over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRegistry {
    pub solend: Pubkey,
    pub saber_swap: Pubkey,
    pub saber_decimal_wrapper: Pubkey,
    pub quarry_mine: Pubkey,
    pub quarry_mint_wrapper: Pubkey,
    pub katana: Pubkey,
    pub psy_american: Pubkey,
    pub marinade: Pubkey,
    pub marinade_state: Pubkey,
    pub msol_mint: Pubkey,
}

/// Environment variable -> registry entry, used by `Config::from_env`.
pub const REGISTRY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SOLEND_PROGRAM_ID", "solend"),
    ("SABER_SWAP_PROGRAM_ID", "saber_swap"),
    ("SABER_DECIMAL_WRAPPER_PROGRAM_ID", "saber_decimal_wrapper"),
    ("QUARRY_MINE_PROGRAM_ID", "quarry_mine"),
    ("QUARRY_MINT_WRAPPER_PROGRAM_ID", "quarry_mint_wrapper"),
    ("KATANA_PROGRAM_ID", "katana"),
    ("PSY_AMERICAN_PROGRAM_ID", "psy_american"),
    ("MARINADE_PROGRAM_ID", "marinade"),
    ("MARINADE_STATE_ADDRESS", "marinade_state"),
    ("MSOL_MINT_ADDRESS", "msol_mint"),
];

static MAINNET: Lazy<Result<ProgramRegistry>> = Lazy::new(|| {
    Ok(ProgramRegistry {
        solend: ProgramIds::solend()?,
        saber_swap: ProgramIds::saber_swap()?,
        saber_decimal_wrapper: ProgramIds::saber_decimal_wrapper()?,
        quarry_mine: ProgramIds::quarry_mine()?,
        quarry_mint_wrapper: ProgramIds::quarry_mint_wrapper()?,
        katana: ProgramIds::katana()?,
        psy_american: ProgramIds::psy_american()?,
        marinade: ProgramIds::marinade()?,
        marinade_state: AccountAddresses::marinade_state()?,
        msol_mint: AccountAddresses::msol_mint()?,
    })
});

impl ProgramRegistry {
    /// Mainnet deployment, parsed once.
    pub fn mainnet() -> Result<Self> {
        MAINNET.clone()
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut Pubkey> {
        let slot = match name {
            "solend" => &mut self.solend,
            "saber_swap" => &mut self.saber_swap,
            "saber_decimal_wrapper" => &mut self.saber_decimal_wrapper,
            "quarry_mine" => &mut self.quarry_mine,
            "quarry_mint_wrapper" => &mut self.quarry_mint_wrapper,
            "katana" => &mut self.katana,
            "psy_american" => &mut self.psy_american,
            "marinade" => &mut self.marinade,
            "marinade_state" => &mut self.marinade_state,
            "msol_mint" => &mut self.msol_mint,
            _ => return None,
        };
        Some(slot)
    }

    /// Replaces one entry by name.
    pub fn with_override(mut self, name: &str, address: Pubkey) -> Result<Self> {
        let slot = self
            .entry_mut(name)
            .ok_or_else(|| Error::Config(format!("Unknown registry entry '{}'", name)))?;
        if *slot != address {
            log::info!("Registry override: {} = {} (default {})", name, address, slot);
        }
        *slot = address;
        Ok(self)
    }

    /// Programs whose accounts `ProtocolRegistry` can decode, as (name, address).
    pub fn programs(&self) -> Vec<(&'static str, Pubkey)> {
        vec![
            ("solend", self.solend),
            ("saber_swap", self.saber_swap),
            ("saber_decimal_wrapper", self.saber_decimal_wrapper),
            ("quarry_mine", self.quarry_mine),
            ("katana", self.katana),
            ("psy_american", self.psy_american),
            ("marinade", self.marinade),
        ]
    }
}
