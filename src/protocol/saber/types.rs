use crate::core::error::{Error, Result};
use crate::layout::{field, AccountRecord, Discriminator, Fields, Layout};
use crate::utils::token::TokenBalance;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

pub const SWAP_INFO_LEN: usize = 395;

/// `sha256("account:WrappedToken")[..8]`
pub const WRAPPED_TOKEN_DISCRIMINATOR: [u8; 8] = [0x1c, 0x29, 0xc6, 0xa3, 0xbd, 0x95, 0xaf, 0x8e];

const SWAP_FEES: Layout = Layout::Struct(&[
    field("admin_trade_fee_numerator", Layout::U64),
    field("admin_trade_fee_denominator", Layout::U64),
    field("admin_withdraw_fee_numerator", Layout::U64),
    field("admin_withdraw_fee_denominator", Layout::U64),
    field("trade_fee_numerator", Layout::U64),
    field("trade_fee_denominator", Layout::U64),
    field("withdraw_fee_numerator", Layout::U64),
    field("withdraw_fee_denominator", Layout::U64),
]);

pub const SWAP_INFO_LAYOUT: Layout = Layout::Struct(&[
    field("is_initialized", Layout::Bool),
    field("is_paused", Layout::Bool),
    field("nonce", Layout::U8),
    field("initial_amp_factor", Layout::U64),
    field("target_amp_factor", Layout::U64),
    field("start_ramp_ts", Layout::I64),
    field("stop_ramp_ts", Layout::I64),
    field("future_admin_deadline", Layout::I64),
    field("future_admin_key", Layout::Pubkey),
    field("admin_key", Layout::Pubkey),
    field("token_a", Layout::Pubkey),
    field("token_b", Layout::Pubkey),
    field("pool_mint", Layout::Pubkey),
    field("token_a_mint", Layout::Pubkey),
    field("token_b_mint", Layout::Pubkey),
    field("admin_fee_account_a", Layout::Pubkey),
    field("admin_fee_account_b", Layout::Pubkey),
    field("fees", SWAP_FEES),
]);

pub const WRAP_INFO_LAYOUT: Layout = Layout::Struct(&[
    field("decimals", Layout::U8),
    field("multiplier", Layout::U64),
    field("wrapper_underlying_mint", Layout::Pubkey),
    field("wrapper_underlying_tokens", Layout::Pubkey),
    field("wrapper_mint", Layout::Pubkey),
    field("nonce", Layout::U8),
]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwapFees {
    pub admin_trade_fee_numerator: u64,
    pub admin_trade_fee_denominator: u64,
    pub admin_withdraw_fee_numerator: u64,
    pub admin_withdraw_fee_denominator: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub withdraw_fee_numerator: u64,
    pub withdraw_fee_denominator: u64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

impl SwapFees {
    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(SwapFees {
            admin_trade_fee_numerator: fields.u64("admin_trade_fee_numerator")?,
            admin_trade_fee_denominator: fields.u64("admin_trade_fee_denominator")?,
            admin_withdraw_fee_numerator: fields.u64("admin_withdraw_fee_numerator")?,
            admin_withdraw_fee_denominator: fields.u64("admin_withdraw_fee_denominator")?,
            trade_fee_numerator: fields.u64("trade_fee_numerator")?,
            trade_fee_denominator: fields.u64("trade_fee_denominator")?,
            withdraw_fee_numerator: fields.u64("withdraw_fee_numerator")?,
            withdraw_fee_denominator: fields.u64("withdraw_fee_denominator")?,
        })
    }

    /// Fraction of the output kept as trade fee. A zero denominator means no fee.
    pub fn trade_fee(&self) -> f64 {
        ratio(self.trade_fee_numerator, self.trade_fee_denominator)
    }

    pub fn withdraw_fee(&self) -> f64 {
        ratio(self.withdraw_fee_numerator, self.withdraw_fee_denominator)
    }
}

/// One side of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapTokenInfo {
    /// Token account holding the pool's reserves.
    pub reserves: Pubkey,
    pub mint: Pubkey,
    pub admin_fees: Pubkey,
    /// Reserve balance, present once refreshed with `SwapInfo::with_balances`.
    pub balance: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapInfo {
    pub address: Pubkey,
    pub is_initialized: bool,
    pub is_paused: bool,
    pub nonce: u8,
    pub initial_amp_factor: u64,
    pub target_amp_factor: u64,
    pub start_ramp_ts: i64,
    pub stop_ramp_ts: i64,
    pub future_admin_deadline: i64,
    pub future_admin_key: Pubkey,
    pub admin_key: Pubkey,
    pub token_a: SwapTokenInfo,
    pub token_b: SwapTokenInfo,
    pub pool_mint: Pubkey,
    pub fees: SwapFees,
}

impl AccountRecord for SwapInfo {
    const NAME: &'static str = "SwapInfo";
    const DISCRIMINATOR: Discriminator = Discriminator::None;
    const LAYOUT: Layout = SWAP_INFO_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        if !fields.bool("is_initialized")? {
            return Err(Error::malformed(format!("SwapInfo {} is not initialized", address)));
        }
        Ok(SwapInfo {
            address,
            is_initialized: true,
            is_paused: fields.bool("is_paused")?,
            nonce: fields.u8("nonce")?,
            initial_amp_factor: fields.u64("initial_amp_factor")?,
            target_amp_factor: fields.u64("target_amp_factor")?,
            start_ramp_ts: fields.i64("start_ramp_ts")?,
            stop_ramp_ts: fields.i64("stop_ramp_ts")?,
            future_admin_deadline: fields.i64("future_admin_deadline")?,
            future_admin_key: fields.pubkey("future_admin_key")?,
            admin_key: fields.pubkey("admin_key")?,
            token_a: SwapTokenInfo {
                reserves: fields.pubkey("token_a")?,
                mint: fields.pubkey("token_a_mint")?,
                admin_fees: fields.pubkey("admin_fee_account_a")?,
                balance: None,
            },
            token_b: SwapTokenInfo {
                reserves: fields.pubkey("token_b")?,
                mint: fields.pubkey("token_b_mint")?,
                admin_fees: fields.pubkey("admin_fee_account_b")?,
                balance: None,
            },
            pool_mint: fields.pubkey("pool_mint")?,
            fees: SwapFees::from_fields(fields.record("fees")?)?,
        })
    }
}

impl SwapInfo {
    /// Copy of the pool carrying the reserve balances read from its two
    /// token accounts. Each balance must belong to the matching reserve.
    pub fn with_balances(
        &self,
        token_a: &TokenBalance,
        token_b: &TokenBalance,
    ) -> Result<SwapInfo> {
        let sides = [("A", &self.token_a, token_a), ("B", &self.token_b, token_b)];
        for (side, info, balance) in sides {
            if balance.address != info.reserves || balance.mint != info.mint {
                return Err(Error::malformed(format!(
                    "SwapInfo {}: token {} balance is for {} (mint {}), \
                     expected reserves {} (mint {})",
                    self.address, side, balance.address, balance.mint, info.reserves, info.mint
                )));
            }
        }
        let mut refreshed = self.clone();
        refreshed.token_a.balance = Some(token_a.amount);
        refreshed.token_b.balance = Some(token_b.amount);
        Ok(refreshed)
    }

    /// Amplification coefficient at `now`, linearly ramped between
    /// `start_ramp_ts` and `stop_ramp_ts`.
    pub fn amp_factor(&self, now: i64) -> u64 {
        if now >= self.stop_ramp_ts || self.stop_ramp_ts <= self.start_ramp_ts {
            return self.target_amp_factor;
        }
        if now <= self.start_ramp_ts {
            return self.initial_amp_factor;
        }
        // widened: the timestamps are untrusted and can span the whole i64 range
        let elapsed = (now as i128 - self.start_ramp_ts as i128) as u128;
        let range = (self.stop_ramp_ts as i128 - self.start_ramp_ts as i128) as u128;
        let (initial, target) = (self.initial_amp_factor as u128, self.target_amp_factor as u128);
        let amp = if target >= initial {
            initial + (target - initial) * elapsed / range
        } else {
            initial - (initial - target) * elapsed / range
        };
        amp as u64
    }

    /// The side whose reserves hold `mint`.
    pub fn side_for_mint(&self, mint: &Pubkey) -> Option<&SwapTokenInfo> {
        [&self.token_a, &self.token_b].into_iter().find(|side| side.mint == *mint)
    }
}

/// Saber decimal wrapper: re-denominates an underlying token into a mint
/// with more decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapInfo {
    pub address: Pubkey,
    pub decimals: u8,
    pub multiplier: u64,
    pub underlying_mint: Pubkey,
    pub underlying_tokens: Pubkey,
    pub wrapper_mint: Pubkey,
    pub nonce: u8,
}

impl AccountRecord for WrapInfo {
    const NAME: &'static str = "WrapInfo";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(WRAPPED_TOKEN_DISCRIMINATOR);
    const LAYOUT: Layout = WRAP_INFO_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(WrapInfo {
            address,
            decimals: fields.u8("decimals")?,
            multiplier: fields.u64("multiplier")?,
            underlying_mint: fields.pubkey("wrapper_underlying_mint")?,
            underlying_tokens: fields.pubkey("wrapper_underlying_tokens")?,
            wrapper_mint: fields.pubkey("wrapper_mint")?,
            nonce: fields.u8("nonce")?,
        })
    }
}

impl WrapInfo {
    pub fn to_wrapped(&self, underlying_amount: u64) -> Result<u64> {
        underlying_amount
            .checked_mul(self.multiplier)
            .ok_or(Error::MathOverflow("wrapped amount"))
    }

    /// Rounds down; dust below one underlying unit stays wrapped.
    pub fn to_underlying(&self, wrapped_amount: u64) -> Result<u64> {
        wrapped_amount
            .checked_div(self.multiplier)
            .ok_or(Error::MathOverflow("underlying amount"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::discriminator::anchor_account;

    pub(crate) fn swap_fields() -> Fields {
        let mut fields = SwapInfo::zeroed_fields().unwrap();
        fields.set("is_initialized", true);
        fields.set("nonce", 254u8);
        fields.set("token_a", Pubkey::new_unique());
        fields.set("token_b", Pubkey::new_unique());
        fields.set("token_a_mint", Pubkey::new_unique());
        fields.set("token_b_mint", Pubkey::new_unique());
        let fees = fields.record_mut("fees").unwrap();
        fees.set("trade_fee_numerator", 4u64);
        fees.set("trade_fee_denominator", 10_000u64);
        fields
    }

    #[test]
    fn test_swap_info_size() {
        assert_eq!(SwapInfo::span().unwrap(), SWAP_INFO_LEN);
        let data = SwapInfo::encode_fields(&swap_fields()).unwrap();
        assert_eq!(data.len(), SWAP_INFO_LEN);
    }

    #[test]
    fn test_swap_info_decode() {
        let fields = swap_fields();
        let address = Pubkey::new_unique();
        let swap = SwapInfo::decode(&SwapInfo::encode_fields(&fields).unwrap(), address).unwrap();
        assert_eq!(swap.address, address);
        assert_eq!(swap.nonce, 254);
        assert_eq!(swap.token_a.reserves, fields.pubkey("token_a").unwrap());
        assert_eq!(swap.token_b.mint, fields.pubkey("token_b_mint").unwrap());
        assert_eq!(swap.token_a.balance, None);
        assert!((swap.fees.trade_fee() - 0.0004).abs() < 1e-12);
        assert_eq!(swap.fees.withdraw_fee(), 0.0);
    }

    #[test]
    fn test_uninitialized_swap_rejected() {
        let mut fields = swap_fields();
        fields.set("is_initialized", false);
        let data = SwapInfo::encode_fields(&fields).unwrap();
        assert!(matches!(
            SwapInfo::decode(&data, Pubkey::new_unique()),
            Err(Error::MalformedAccount(_))
        ));
    }

    #[test]
    fn test_with_balances() {
        let data = SwapInfo::encode_fields(&swap_fields()).unwrap();
        let swap = SwapInfo::decode(&data, Pubkey::new_unique()).unwrap();
        let balance = |side: &SwapTokenInfo, amount| TokenBalance {
            address: side.reserves,
            mint: side.mint,
            owner: Pubkey::new_unique(),
            amount,
        };
        let a = balance(&swap.token_a, 1_000);
        let b = balance(&swap.token_b, 2_000);

        let refreshed = swap.with_balances(&a, &b).unwrap();
        assert_eq!(refreshed.token_a.balance, Some(1_000));
        assert_eq!(refreshed.token_b.balance, Some(2_000));
        assert_eq!(swap.token_a.balance, None);

        assert!(matches!(swap.with_balances(&b, &a), Err(Error::MalformedAccount(_))));
    }

    #[test]
    fn test_amp_ramp() {
        let data = SwapInfo::encode_fields(&swap_fields()).unwrap();
        let mut swap = SwapInfo::decode(&data, Pubkey::new_unique()).unwrap();
        swap.initial_amp_factor = 100;
        swap.target_amp_factor = 200;
        swap.start_ramp_ts = 1_000;
        swap.stop_ramp_ts = 2_000;
        assert_eq!(swap.amp_factor(500), 100);
        assert_eq!(swap.amp_factor(1_500), 150);
        assert_eq!(swap.amp_factor(3_000), 200);

        swap.initial_amp_factor = 200;
        swap.target_amp_factor = 100;
        assert_eq!(swap.amp_factor(1_250), 175);
    }

    #[test]
    fn test_amp_ramp_extreme_timestamps() {
        let data = SwapInfo::encode_fields(&swap_fields()).unwrap();
        let mut swap = SwapInfo::decode(&data, Pubkey::new_unique()).unwrap();
        swap.initial_amp_factor = 100;
        swap.target_amp_factor = 200;
        swap.start_ramp_ts = i64::MIN;
        swap.stop_ramp_ts = i64::MAX;
        assert_eq!(swap.amp_factor(0), 150);
        assert_eq!(swap.amp_factor(i64::MIN + 1), 100);
        assert_eq!(swap.amp_factor(i64::MAX), 200);
    }

    #[test]
    fn test_wrapped_token_discriminator() {
        assert_eq!(anchor_account("WrappedToken"), WRAPPED_TOKEN_DISCRIMINATOR);
    }

    #[test]
    fn test_wrap_info_decode_and_scale() {
        let underlying = Pubkey::new_unique();
        let mut fields = WrapInfo::zeroed_fields().unwrap();
        fields.set("decimals", 9u8);
        fields.set("multiplier", 1_000u64);
        fields.set("wrapper_underlying_mint", underlying);
        let data = WrapInfo::encode_fields(&fields).unwrap();
        assert_eq!(&data[..8], &WRAPPED_TOKEN_DISCRIMINATOR);

        let wrap = WrapInfo::decode(&data, Pubkey::new_unique()).unwrap();
        assert_eq!(wrap.underlying_mint, underlying);
        assert_eq!(wrap.to_wrapped(5).unwrap(), 5_000);
        assert_eq!(wrap.to_underlying(5_999).unwrap(), 5);
        assert!(matches!(wrap.to_wrapped(u64::MAX), Err(Error::MathOverflow(_))));

        let mut other = data.clone();
        other[0] ^= 0xff;
        assert!(matches!(
            WrapInfo::decode(&other, Pubkey::new_unique()),
            Err(Error::MalformedAccount(_))
        ));
    }
}
