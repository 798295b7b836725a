use crate::core::error::{Error, Result};
use crate::core::types::U256;
use crate::layout::{field, AccountRecord, Discriminator, Fields, Layout};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

pub const QUARRY_DISCRIMINATOR: [u8; 8] = [0xf3, 0xf8, 0x36, 0xb6, 0xf0, 0x55, 0x09, 0x4d];
pub const MINER_DISCRIMINATOR: [u8; 8] = [0xdf, 0x71, 0x0f, 0x36, 0x7b, 0x7a, 0x8c, 0x64];
pub const REWARDER_DISCRIMINATOR: [u8; 8] = [0x53, 0x03, 0xcb, 0xae, 0xf4, 0x1e, 0xac, 0xc6];

/// Fixed-point scale of `rewards_per_token_*`.
pub const PRECISION_MULTIPLIER: u128 = u64::MAX as u128;
pub const SECONDS_PER_YEAR: u128 = 86_400 * 365;

/// Offset of `rewarder` in a quarry account (after the discriminator).
pub const QUARRY_REWARDER_OFFSET: usize = 8;
/// Offset of `authority` in a miner account.
pub const MINER_AUTHORITY_OFFSET: usize = 40;

pub const QUARRY_LAYOUT: Layout = Layout::Struct(&[
    field("rewarder", Layout::Pubkey),
    field("token_mint_key", Layout::Pubkey),
    field("bump", Layout::U8),
    field("index", Layout::U16),
    field("token_mint_decimals", Layout::U8),
    field("famine_ts", Layout::I64),
    field("last_update_ts", Layout::I64),
    field("rewards_per_token_stored", Layout::U128),
    field("annual_rewards_rate", Layout::U64),
    field("rewards_share", Layout::U64),
    field("total_tokens_deposited", Layout::U64),
    field("num_miners", Layout::U64),
]);

pub const MINER_LAYOUT: Layout = Layout::Struct(&[
    field("quarry", Layout::Pubkey),
    field("authority", Layout::Pubkey),
    field("bump", Layout::U8),
    field("token_vault_key", Layout::Pubkey),
    field("rewards_earned", Layout::U64),
    field("rewards_per_token_paid", Layout::U128),
    field("balance", Layout::U64),
    field("index", Layout::U64),
]);

pub const REWARDER_LAYOUT: Layout = Layout::Struct(&[
    field("base", Layout::Pubkey),
    field("bump", Layout::U8),
    field("authority", Layout::Pubkey),
    field("pending_authority", Layout::Pubkey),
    field("num_quarries", Layout::U16),
    field("annual_rewards_rate", Layout::U64),
    field("total_rewards_shares", Layout::U64),
    field("mint_wrapper", Layout::Pubkey),
    field("rewards_token_mint", Layout::Pubkey),
    field("claim_fee_token_account", Layout::Pubkey),
    field("max_claim_fee_millibps", Layout::U64),
    field("pause_authority", Layout::Pubkey),
    field("is_paused", Layout::Bool),
]);

/// A staking farm for one token under a rewarder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quarry {
    pub address: Pubkey,
    pub rewarder: Pubkey,
    pub token_mint_key: Pubkey,
    pub bump: u8,
    pub index: u16,
    pub token_mint_decimals: u8,
    pub famine_ts: i64,
    pub last_update_ts: i64,
    pub rewards_per_token_stored: u128,
    pub annual_rewards_rate: u64,
    pub rewards_share: u64,
    pub total_tokens_deposited: u64,
    pub num_miners: u64,
}

impl AccountRecord for Quarry {
    const NAME: &'static str = "Quarry";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(QUARRY_DISCRIMINATOR);
    const LAYOUT: Layout = QUARRY_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(Quarry {
            address,
            rewarder: fields.pubkey("rewarder")?,
            token_mint_key: fields.pubkey("token_mint_key")?,
            bump: fields.u8("bump")?,
            index: fields.u16("index")?,
            token_mint_decimals: fields.u8("token_mint_decimals")?,
            famine_ts: fields.i64("famine_ts")?,
            last_update_ts: fields.i64("last_update_ts")?,
            rewards_per_token_stored: fields.u128("rewards_per_token_stored")?,
            annual_rewards_rate: fields.u64("annual_rewards_rate")?,
            rewards_share: fields.u64("rewards_share")?,
            total_tokens_deposited: fields.u64("total_tokens_deposited")?,
            num_miners: fields.u64("num_miners")?,
        })
    }
}

impl Quarry {
    /// Accumulated rewards per staked token at `now`, stopping at the famine.
    pub fn rewards_per_token(&self, now: i64) -> Result<u128> {
        let until = now.min(self.famine_ts);
        if self.total_tokens_deposited == 0 || until <= self.last_update_ts {
            return Ok(self.rewards_per_token_stored);
        }
        let elapsed = U256::from((until - self.last_update_ts) as u64);
        let accrued = elapsed
            .checked_mul(U256::from(self.annual_rewards_rate))
            .and_then(|v| v.checked_mul(U256::from(PRECISION_MULTIPLIER)))
            .ok_or(Error::MathOverflow("quarry rewards per token"))?
            / U256::from(SECONDS_PER_YEAR)
            / U256::from(self.total_tokens_deposited);
        if accrued > U256::from(u128::MAX) {
            return Err(Error::MathOverflow("quarry rewards per token"));
        }
        self.rewards_per_token_stored
            .checked_add(accrued.as_u128())
            .ok_or(Error::MathOverflow("quarry rewards per token"))
    }
}

/// A user's stake in one quarry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Miner {
    pub address: Pubkey,
    pub quarry: Pubkey,
    pub authority: Pubkey,
    pub bump: u8,
    pub token_vault_key: Pubkey,
    pub rewards_earned: u64,
    pub rewards_per_token_paid: u128,
    pub balance: u64,
    pub index: u64,
}

impl AccountRecord for Miner {
    const NAME: &'static str = "Miner";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(MINER_DISCRIMINATOR);
    const LAYOUT: Layout = MINER_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(Miner {
            address,
            quarry: fields.pubkey("quarry")?,
            authority: fields.pubkey("authority")?,
            bump: fields.u8("bump")?,
            token_vault_key: fields.pubkey("token_vault_key")?,
            rewards_earned: fields.u64("rewards_earned")?,
            rewards_per_token_paid: fields.u128("rewards_per_token_paid")?,
            balance: fields.u64("balance")?,
            index: fields.u64("index")?,
        })
    }
}

impl Miner {
    /// Rewards claimable at `now`, before the claim fee.
    pub fn claimable_rewards(&self, quarry: &Quarry, now: i64) -> Result<u64> {
        if quarry.address != self.quarry {
            return Err(Error::Config(format!(
                "miner {} belongs to quarry {}, not {}",
                self.address, self.quarry, quarry.address
            )));
        }
        let per_token = quarry
            .rewards_per_token(now)?
            .saturating_sub(self.rewards_per_token_paid);
        let pending = U256::from(self.balance)
            .checked_mul(U256::from(per_token))
            .ok_or(Error::MathOverflow("miner rewards"))?
            / U256::from(PRECISION_MULTIPLIER);
        let total = pending
            .checked_add(U256::from(self.rewards_earned))
            .filter(|v| *v <= U256::from(u64::MAX))
            .ok_or(Error::MathOverflow("miner rewards"))?;
        Ok(total.as_u64())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewarder {
    pub address: Pubkey,
    pub base: Pubkey,
    pub bump: u8,
    pub authority: Pubkey,
    pub pending_authority: Pubkey,
    pub num_quarries: u16,
    pub annual_rewards_rate: u64,
    pub total_rewards_shares: u64,
    pub mint_wrapper: Pubkey,
    pub rewards_token_mint: Pubkey,
    pub claim_fee_token_account: Pubkey,
    pub max_claim_fee_millibps: u64,
    pub pause_authority: Pubkey,
    pub is_paused: bool,
}

impl AccountRecord for Rewarder {
    const NAME: &'static str = "Rewarder";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(REWARDER_DISCRIMINATOR);
    const LAYOUT: Layout = REWARDER_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(Rewarder {
            address,
            base: fields.pubkey("base")?,
            bump: fields.u8("bump")?,
            authority: fields.pubkey("authority")?,
            pending_authority: fields.pubkey("pending_authority")?,
            num_quarries: fields.u16("num_quarries")?,
            annual_rewards_rate: fields.u64("annual_rewards_rate")?,
            total_rewards_shares: fields.u64("total_rewards_shares")?,
            mint_wrapper: fields.pubkey("mint_wrapper")?,
            rewards_token_mint: fields.pubkey("rewards_token_mint")?,
            claim_fee_token_account: fields.pubkey("claim_fee_token_account")?,
            max_claim_fee_millibps: fields.u64("max_claim_fee_millibps")?,
            pause_authority: fields.pubkey("pause_authority")?,
            is_paused: fields.bool("is_paused")?,
        })
    }
}

impl Rewarder {
    /// Annual rewards a quarry receives for its share of the rewarder.
    pub fn quarry_rewards_rate(&self, quarry: &Quarry) -> Result<u64> {
        if self.total_rewards_shares == 0 {
            return Ok(0);
        }
        let rate = self.annual_rewards_rate as u128 * quarry.rewards_share as u128
            / self.total_rewards_shares as u128;
        u64::try_from(rate).map_err(|_| Error::MathOverflow("quarry rewards rate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::discriminator::anchor_account;

    pub(crate) fn quarry(address: Pubkey) -> Quarry {
        let mut fields = Quarry::zeroed_fields().unwrap();
        fields.set("rewarder", Pubkey::new_unique());
        fields.set("token_mint_key", Pubkey::new_unique());
        fields.set("famine_ts", i64::MAX);
        fields.set("annual_rewards_rate", SECONDS_PER_YEAR as u64);
        fields.set("total_tokens_deposited", 1_000u64);
        Quarry::decode(&Quarry::encode_fields(&fields).unwrap(), address).unwrap()
    }

    #[test]
    fn test_discriminators() {
        assert_eq!(anchor_account("Quarry"), QUARRY_DISCRIMINATOR);
        assert_eq!(anchor_account("Miner"), MINER_DISCRIMINATOR);
        assert_eq!(anchor_account("Rewarder"), REWARDER_DISCRIMINATOR);
    }

    #[test]
    fn test_offsets() {
        let rewarder = Pubkey::new_unique();
        let mut fields = Quarry::zeroed_fields().unwrap();
        fields.set("rewarder", rewarder);
        let data = Quarry::encode_fields(&fields).unwrap();
        assert_eq!(&data[QUARRY_REWARDER_OFFSET..QUARRY_REWARDER_OFFSET + 32], rewarder.as_ref());

        let authority = Pubkey::new_unique();
        let mut fields = Miner::zeroed_fields().unwrap();
        fields.set("authority", authority);
        let data = Miner::encode_fields(&fields).unwrap();
        assert_eq!(&data[MINER_AUTHORITY_OFFSET..MINER_AUTHORITY_OFFSET + 32], authority.as_ref());
    }

    #[test]
    fn test_wrong_discriminator_is_malformed() {
        let data = Quarry::encode_fields(&Quarry::zeroed_fields().unwrap()).unwrap();
        let mut as_miner = data.clone();
        as_miner.resize(Miner::span().unwrap(), 0);
        assert!(matches!(
            Miner::decode(&as_miner, Pubkey::new_unique()),
            Err(Error::MalformedAccount(_))
        ));
    }

    #[test]
    fn test_rewards_accrue_until_famine() {
        let mut farm = quarry(Pubkey::new_unique());
        farm.last_update_ts = 100;
        // one token unit per second across 1_000 staked
        assert_eq!(farm.rewards_per_token(100).unwrap(), 0);
        assert_eq!(farm.rewards_per_token(1_100).unwrap(), PRECISION_MULTIPLIER);

        farm.famine_ts = 600;
        assert_eq!(farm.rewards_per_token(1_100).unwrap(), PRECISION_MULTIPLIER / 2);
    }

    #[test]
    fn test_miner_claimable_rewards() {
        let farm_address = Pubkey::new_unique();
        let mut farm = quarry(farm_address);
        farm.last_update_ts = 0;
        let miner = Miner {
            address: Pubkey::new_unique(),
            quarry: farm_address,
            authority: Pubkey::new_unique(),
            bump: 255,
            token_vault_key: Pubkey::new_unique(),
            rewards_earned: 3,
            rewards_per_token_paid: 0,
            balance: 500,
            index: 0,
        };
        // half the stake over 1_000 seconds earns half of 1_000 units
        assert_eq!(miner.claimable_rewards(&farm, 1_000).unwrap(), 503);

        let other = quarry(Pubkey::new_unique());
        assert!(matches!(miner.claimable_rewards(&other, 1_000), Err(Error::Config(_))));
    }

    #[test]
    fn test_quarry_share_of_rewarder() {
        let mut fields = Rewarder::zeroed_fields().unwrap();
        fields.set("annual_rewards_rate", 1_000_000u64);
        fields.set("total_rewards_shares", 4u64);
        let data = Rewarder::encode_fields(&fields).unwrap();
        let rewarder = Rewarder::decode(&data, Pubkey::new_unique()).unwrap();
        let mut farm = quarry(Pubkey::new_unique());
        farm.rewards_share = 1;
        assert_eq!(rewarder.quarry_rewards_rate(&farm).unwrap(), 250_000);
    }
}
