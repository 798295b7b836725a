use crate::core::error::{Error, Result};
use crate::core::types::{Decimal, WAD};
use crate::layout::{field, AccountRecord, Discriminator, Fields, Layout, Value};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

pub const PROGRAM_VERSION: u8 = 1;

pub const LENDING_MARKET_LEN: usize = 290;
pub const RESERVE_LEN: usize = 619;
pub const OBLIGATION_LEN: usize = 1300;
pub const OBLIGATION_HEADER_LEN: usize = 204;
pub const OBLIGATION_COLLATERAL_LEN: usize = 88;
pub const OBLIGATION_LIQUIDITY_LEN: usize = 112;
pub const MAX_OBLIGATION_RESERVES: usize = 10;

/// Offset of `lending_market` in reserves and obligations.
pub const LENDING_MARKET_OFFSET: usize = 10;
/// Offset of `owner` in obligations.
pub const OBLIGATION_OWNER_OFFSET: usize = 42;

const LAST_UPDATE: Layout =
    Layout::Struct(&[field("slot", Layout::U64), field("stale", Layout::Bool)]);

pub const LENDING_MARKET_LAYOUT: Layout = Layout::Struct(&[
    field("version", Layout::U8),
    field("bump_seed", Layout::U8),
    field("owner", Layout::Pubkey),
    field("quote_currency", Layout::Blob(32)),
    field("token_program_id", Layout::Pubkey),
    field("oracle_program_id", Layout::Pubkey),
    field("switchboard_oracle_program_id", Layout::Pubkey),
    field("padding", Layout::Blob(128)),
]);

const RESERVE_LIQUIDITY: Layout = Layout::Struct(&[
    field("mint_pubkey", Layout::Pubkey),
    field("mint_decimals", Layout::U8),
    field("supply_pubkey", Layout::Pubkey),
    field("pyth_oracle", Layout::Pubkey),
    field("switchboard_oracle", Layout::Pubkey),
    field("available_amount", Layout::U64),
    field("borrowed_amount_wads", Layout::U128),
    field("cumulative_borrow_rate_wads", Layout::U128),
    field("market_price", Layout::U128),
]);

const RESERVE_COLLATERAL: Layout = Layout::Struct(&[
    field("mint_pubkey", Layout::Pubkey),
    field("mint_total_supply", Layout::U64),
    field("supply_pubkey", Layout::Pubkey),
]);

const RESERVE_FEES: Layout = Layout::Struct(&[
    field("borrow_fee_wad", Layout::U64),
    field("flash_loan_fee_wad", Layout::U64),
    field("host_fee_percentage", Layout::U8),
]);

const RESERVE_CONFIG: Layout = Layout::Struct(&[
    field("optimal_utilization_rate", Layout::U8),
    field("loan_to_value_ratio", Layout::U8),
    field("liquidation_bonus", Layout::U8),
    field("liquidation_threshold", Layout::U8),
    field("min_borrow_rate", Layout::U8),
    field("optimal_borrow_rate", Layout::U8),
    field("max_borrow_rate", Layout::U8),
    field("fees", RESERVE_FEES),
    field("deposit_limit", Layout::U64),
    field("borrow_limit", Layout::U64),
    field("fee_receiver", Layout::Pubkey),
    field("protocol_liquidation_fee", Layout::U8),
    field("protocol_take_rate", Layout::U8),
]);

const RATE_LIMITER: Layout = Layout::Struct(&[
    field("window_duration", Layout::U64),
    field("max_outflow", Layout::U64),
    field("previous_quantity", Layout::U128),
    field("window_start", Layout::U64),
    field("current_quantity", Layout::U128),
]);

pub const RESERVE_LAYOUT: Layout = Layout::Struct(&[
    field("version", Layout::U8),
    field("last_update", LAST_UPDATE),
    field("lending_market", Layout::Pubkey),
    field("liquidity", RESERVE_LIQUIDITY),
    field("collateral", RESERVE_COLLATERAL),
    field("config", RESERVE_CONFIG),
    field("accumulated_protocol_fees_wads", Layout::U128),
    field("rate_limiter", RATE_LIMITER),
    field("added_borrow_weight_bps", Layout::U64),
    field("liquidity_smoothed_market_price", Layout::U128),
    field("reserve_type", Layout::U8),
    field("max_utilization_rate", Layout::U8),
    field("super_max_borrow_rate", Layout::U64),
    field("max_liquidation_bonus", Layout::U8),
    field("max_liquidation_threshold", Layout::U8),
    field("scaled_price_offset_bps", Layout::I64),
    field("extra_oracle_pubkey", Layout::Pubkey),
    field("liquidity_extra_market_price_flag", Layout::Bool),
    field("liquidity_extra_market_price", Layout::U128),
    field("attributed_borrow_value", Layout::U128),
    field("attributed_borrow_limit_open", Layout::U64),
    field("attributed_borrow_limit_close", Layout::U64),
    field("padding", Layout::Blob(49)),
]);

pub const OBLIGATION_HEADER_LAYOUT: Layout = Layout::Struct(&[
    field("version", Layout::U8),
    field("last_update", LAST_UPDATE),
    field("lending_market", Layout::Pubkey),
    field("owner", Layout::Pubkey),
    field("deposited_value", Layout::U128),
    field("borrowed_value", Layout::U128),
    field("allowed_borrow_value", Layout::U128),
    field("unhealthy_borrow_value", Layout::U128),
    field("borrowed_value_upper_bound", Layout::U128),
    field("borrowing_isolated_asset", Layout::Bool),
    field("super_unhealthy_borrow_value", Layout::U128),
    field("unweighted_borrowed_value", Layout::U128),
    field("closeable", Layout::Bool),
    field("padding", Layout::Blob(14)),
    field("deposits_len", Layout::U8),
    field("borrows_len", Layout::U8),
]);

pub const OBLIGATION_COLLATERAL_LAYOUT: Layout = Layout::Struct(&[
    field("deposit_reserve", Layout::Pubkey),
    field("deposited_amount", Layout::U64),
    field("market_value", Layout::U128),
    field("attributed_borrow_value", Layout::U128),
    field("padding", Layout::Blob(16)),
]);

pub const OBLIGATION_LIQUIDITY_LAYOUT: Layout = Layout::Struct(&[
    field("borrow_reserve", Layout::Pubkey),
    field("cumulative_borrow_rate_wads", Layout::U128),
    field("borrowed_amount_wads", Layout::U128),
    field("market_value", Layout::U128),
    field("padding", Layout::Blob(32)),
]);

fn check_version(fields: &Fields, what: &str) -> Result<u8> {
    let version = fields.u8("version")?;
    if version != PROGRAM_VERSION {
        return Err(Error::malformed(format!(
            "{}: unsupported version {} (expected {})",
            what, version, PROGRAM_VERSION
        )));
    }
    Ok(version)
}

fn decimal(fields: &Fields, name: &str) -> Result<Decimal> {
    Ok(Decimal::from_wads(fields.u128(name)?))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LastUpdate {
    pub slot: u64,
    pub stale: bool,
}

impl LastUpdate {
    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(LastUpdate {
            slot: fields.u64("slot")?,
            stale: fields.bool("stale")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LendingMarket {
    pub address: Pubkey,
    pub version: u8,
    pub bump_seed: u8,
    pub owner: Pubkey,
    /// 32-byte quote currency code, "USD" padded with zeros on mainnet.
    pub quote_currency: [u8; 32],
    pub token_program_id: Pubkey,
    pub oracle_program_id: Pubkey,
    pub switchboard_oracle_program_id: Pubkey,
}

impl LendingMarket {
    pub fn quote_currency_symbol(&self) -> String {
        let end = self.quote_currency.iter().position(|b| *b == 0).unwrap_or(32);
        String::from_utf8_lossy(&self.quote_currency[..end]).into_owned()
    }
}

impl AccountRecord for LendingMarket {
    const NAME: &'static str = "LendingMarket";
    const DISCRIMINATOR: Discriminator = Discriminator::None;
    const LAYOUT: Layout = LENDING_MARKET_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        let quote_currency: [u8; 32] = fields
            .bytes("quote_currency")?
            .try_into()
            .map_err(|_| Error::malformed("LendingMarket: quote_currency is not 32 bytes"))?;
        Ok(LendingMarket {
            address,
            version: check_version(fields, Self::NAME)?,
            bump_seed: fields.u8("bump_seed")?,
            owner: fields.pubkey("owner")?,
            quote_currency,
            token_program_id: fields.pubkey("token_program_id")?,
            oracle_program_id: fields.pubkey("oracle_program_id")?,
            switchboard_oracle_program_id: fields.pubkey("switchboard_oracle_program_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveLiquidity {
    pub mint_pubkey: Pubkey,
    pub mint_decimals: u8,
    pub supply_pubkey: Pubkey,
    pub pyth_oracle: Pubkey,
    pub switchboard_oracle: Pubkey,
    pub available_amount: u64,
    pub borrowed_amount_wads: Decimal,
    pub cumulative_borrow_rate_wads: Decimal,
    /// Quote currency per whole token, wad scaled.
    pub market_price: Decimal,
}

impl ReserveLiquidity {
    fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(ReserveLiquidity {
            mint_pubkey: fields.pubkey("mint_pubkey")?,
            mint_decimals: fields.u8("mint_decimals")?,
            supply_pubkey: fields.pubkey("supply_pubkey")?,
            pyth_oracle: fields.pubkey("pyth_oracle")?,
            switchboard_oracle: fields.pubkey("switchboard_oracle")?,
            available_amount: fields.u64("available_amount")?,
            borrowed_amount_wads: decimal(fields, "borrowed_amount_wads")?,
            cumulative_borrow_rate_wads: decimal(fields, "cumulative_borrow_rate_wads")?,
            market_price: decimal(fields, "market_price")?,
        })
    }

    /// available + borrowed, in token base units.
    pub fn total_supply(&self) -> Result<Decimal> {
        Decimal::from_integer(self.available_amount).try_add(self.borrowed_amount_wads)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveCollateral {
    pub mint_pubkey: Pubkey,
    pub mint_total_supply: u64,
    pub supply_pubkey: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReserveFees {
    pub borrow_fee_wad: u64,
    pub flash_loan_fee_wad: u64,
    pub host_fee_percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveConfig {
    pub optimal_utilization_rate: u8,
    pub loan_to_value_ratio: u8,
    pub liquidation_bonus: u8,
    pub liquidation_threshold: u8,
    pub min_borrow_rate: u8,
    pub optimal_borrow_rate: u8,
    pub max_borrow_rate: u8,
    pub fees: ReserveFees,
    pub deposit_limit: u64,
    pub borrow_limit: u64,
    pub fee_receiver: Pubkey,
    pub protocol_liquidation_fee: u8,
    pub protocol_take_rate: u8,
}

impl ReserveConfig {
    fn from_fields(fields: &Fields) -> Result<Self> {
        let fees = fields.record("fees")?;
        Ok(ReserveConfig {
            optimal_utilization_rate: fields.u8("optimal_utilization_rate")?,
            loan_to_value_ratio: fields.u8("loan_to_value_ratio")?,
            liquidation_bonus: fields.u8("liquidation_bonus")?,
            liquidation_threshold: fields.u8("liquidation_threshold")?,
            min_borrow_rate: fields.u8("min_borrow_rate")?,
            optimal_borrow_rate: fields.u8("optimal_borrow_rate")?,
            max_borrow_rate: fields.u8("max_borrow_rate")?,
            fees: ReserveFees {
                borrow_fee_wad: fees.u64("borrow_fee_wad")?,
                flash_loan_fee_wad: fees.u64("flash_loan_fee_wad")?,
                host_fee_percentage: fees.u8("host_fee_percentage")?,
            },
            deposit_limit: fields.u64("deposit_limit")?,
            borrow_limit: fields.u64("borrow_limit")?,
            fee_receiver: fields.pubkey("fee_receiver")?,
            protocol_liquidation_fee: fields.u8("protocol_liquidation_fee")?,
            protocol_take_rate: fields.u8("protocol_take_rate")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimiter {
    pub window_duration: u64,
    pub max_outflow: u64,
    pub previous_quantity: Decimal,
    pub window_start: u64,
    pub current_quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reserve {
    pub address: Pubkey,
    pub version: u8,
    pub last_update: LastUpdate,
    pub lending_market: Pubkey,
    pub liquidity: ReserveLiquidity,
    pub collateral: ReserveCollateral,
    pub config: ReserveConfig,
    pub accumulated_protocol_fees: Decimal,
    pub rate_limiter: RateLimiter,
    pub added_borrow_weight_bps: u64,
    pub liquidity_smoothed_market_price: Decimal,
    pub reserve_type: u8,
    pub max_utilization_rate: u8,
    pub super_max_borrow_rate: u64,
    pub max_liquidation_bonus: u8,
    pub max_liquidation_threshold: u8,
    pub scaled_price_offset_bps: i64,
    /// Set only when the reserve has a secondary price feed.
    pub extra_oracle: Option<Pubkey>,
    pub liquidity_extra_market_price: Option<Decimal>,
    pub attributed_borrow_value: Decimal,
    pub attributed_borrow_limit_open: u64,
    pub attributed_borrow_limit_close: u64,
}

impl AccountRecord for Reserve {
    const NAME: &'static str = "Reserve";
    const DISCRIMINATOR: Discriminator = Discriminator::None;
    const LAYOUT: Layout = RESERVE_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        let last_update = LastUpdate::from_fields(fields.record("last_update")?)?;
        let collateral = fields.record("collateral")?;
        let limiter = fields.record("rate_limiter")?;
        let extra_oracle = fields.pubkey("extra_oracle_pubkey")?;
        let extra_price = if fields.bool("liquidity_extra_market_price_flag")? {
            Some(decimal(fields, "liquidity_extra_market_price")?)
        } else {
            None
        };

        Ok(Reserve {
            address,
            version: check_version(fields, Self::NAME)?,
            last_update,
            lending_market: fields.pubkey("lending_market")?,
            liquidity: ReserveLiquidity::from_fields(fields.record("liquidity")?)?,
            collateral: ReserveCollateral {
                mint_pubkey: collateral.pubkey("mint_pubkey")?,
                mint_total_supply: collateral.u64("mint_total_supply")?,
                supply_pubkey: collateral.pubkey("supply_pubkey")?,
            },
            config: ReserveConfig::from_fields(fields.record("config")?)?,
            accumulated_protocol_fees: decimal(fields, "accumulated_protocol_fees_wads")?,
            rate_limiter: RateLimiter {
                window_duration: limiter.u64("window_duration")?,
                max_outflow: limiter.u64("max_outflow")?,
                previous_quantity: decimal(limiter, "previous_quantity")?,
                window_start: limiter.u64("window_start")?,
                current_quantity: decimal(limiter, "current_quantity")?,
            },
            added_borrow_weight_bps: fields.u64("added_borrow_weight_bps")?,
            liquidity_smoothed_market_price: decimal(fields, "liquidity_smoothed_market_price")?,
            reserve_type: fields.u8("reserve_type")?,
            max_utilization_rate: fields.u8("max_utilization_rate")?,
            super_max_borrow_rate: fields.u64("super_max_borrow_rate")?,
            max_liquidation_bonus: fields.u8("max_liquidation_bonus")?,
            max_liquidation_threshold: fields.u8("max_liquidation_threshold")?,
            scaled_price_offset_bps: fields.i64("scaled_price_offset_bps")?,
            extra_oracle: (extra_oracle != Pubkey::default()).then_some(extra_oracle),
            liquidity_extra_market_price: extra_price,
            attributed_borrow_value: decimal(fields, "attributed_borrow_value")?,
            attributed_borrow_limit_open: fields.u64("attributed_borrow_limit_open")?,
            attributed_borrow_limit_close: fields.u64("attributed_borrow_limit_close")?,
        })
    }
}

impl Reserve {
    /// borrowed / (borrowed + available), in whole base units.
    pub fn utilization_ratio(&self) -> f64 {
        let borrowed = self.liquidity.borrowed_amount_wads.to_wads() as f64 / WAD as f64;
        let total = borrowed + self.liquidity.available_amount as f64;
        if total == 0.0 {
            return 0.0;
        }
        borrowed / total
    }

    /// Two-slope borrow rate. Rates are the config percentages as fractions.
    pub fn borrow_apy(&self) -> f64 {
        let utilization = self.utilization_ratio();
        let optimal_utilization = self.config.optimal_utilization_rate as f64 / 100.0;
        let min_rate = self.config.min_borrow_rate as f64 / 100.0;
        let optimal_rate = self.config.optimal_borrow_rate as f64 / 100.0;
        let max_rate = self.config.max_borrow_rate as f64 / 100.0;

        if optimal_utilization == 1.0 || utilization < optimal_utilization {
            let normalized_factor = utilization / optimal_utilization;
            normalized_factor * (optimal_rate - min_rate) + min_rate
        } else {
            let normalized_factor =
                (utilization - optimal_utilization) / (1.0 - optimal_utilization);
            normalized_factor * (max_rate - optimal_rate) + optimal_rate
        }
    }

    pub fn supply_apy(&self) -> f64 {
        self.utilization_ratio() * self.borrow_apy()
    }

    pub fn total_supply(&self) -> Result<Decimal> {
        self.liquidity.total_supply()
    }

    /// Collateral tokens per liquidity token. 1 when the reserve is empty.
    pub fn collateral_exchange_rate(&self) -> Result<Decimal> {
        let total = self.total_supply()?;
        if self.collateral.mint_total_supply == 0 || total.is_zero() {
            return Ok(Decimal::ONE);
        }
        Decimal::from_integer(self.collateral.mint_total_supply).try_div(total)
    }

    /// Liquidity base units redeemable for `collateral_amount` cTokens.
    pub fn collateral_to_liquidity(&self, collateral_amount: u64) -> Result<Decimal> {
        if self.collateral.mint_total_supply == 0 {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_integer(collateral_amount)
            .try_mul_div(
                self.total_supply()?,
                Decimal::from_integer(self.collateral.mint_total_supply),
            )
    }

    /// Quote value of `liquidity` base units at the reserve's market price.
    pub fn market_value(&self, liquidity: Decimal) -> Result<Decimal> {
        liquidity
            .try_mul(self.liquidity.market_price)?
            .try_div(Decimal::ten_pow(self.liquidity.mint_decimals)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationCollateral {
    pub deposit_reserve: Pubkey,
    pub deposited_amount: u64,
    pub market_value: Decimal,
    pub attributed_borrow_value: Decimal,
}

impl ObligationCollateral {
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(ObligationCollateral {
            deposit_reserve: fields.pubkey("deposit_reserve")?,
            deposited_amount: fields.u64("deposited_amount")?,
            market_value: decimal(fields, "market_value")?,
            attributed_borrow_value: decimal(fields, "attributed_borrow_value")?,
        })
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with("deposit_reserve", self.deposit_reserve)
            .with("deposited_amount", self.deposited_amount)
            .with("market_value", self.market_value.to_wads())
            .with("attributed_borrow_value", self.attributed_borrow_value.to_wads())
            .with("padding", vec![0u8; 16])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationLiquidity {
    pub borrow_reserve: Pubkey,
    pub cumulative_borrow_rate_wads: Decimal,
    pub borrowed_amount_wads: Decimal,
    pub market_value: Decimal,
}

impl ObligationLiquidity {
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(ObligationLiquidity {
            borrow_reserve: fields.pubkey("borrow_reserve")?,
            cumulative_borrow_rate_wads: decimal(fields, "cumulative_borrow_rate_wads")?,
            borrowed_amount_wads: decimal(fields, "borrowed_amount_wads")?,
            market_value: decimal(fields, "market_value")?,
        })
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with("borrow_reserve", self.borrow_reserve)
            .with("cumulative_borrow_rate_wads", self.cumulative_borrow_rate_wads.to_wads())
            .with("borrowed_amount_wads", self.borrowed_amount_wads.to_wads())
            .with("market_value", self.market_value.to_wads())
            .with("padding", vec![0u8; 32])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Obligation {
    pub address: Pubkey,
    pub version: u8,
    pub last_update: LastUpdate,
    pub lending_market: Pubkey,
    pub owner: Pubkey,
    pub deposited_value: Decimal,
    pub borrowed_value: Decimal,
    pub allowed_borrow_value: Decimal,
    pub unhealthy_borrow_value: Decimal,
    pub borrowed_value_upper_bound: Decimal,
    pub borrowing_isolated_asset: bool,
    pub super_unhealthy_borrow_value: Decimal,
    pub unweighted_borrowed_value: Decimal,
    pub closeable: bool,
    pub deposits: Vec<ObligationCollateral>,
    pub borrows: Vec<ObligationLiquidity>,
}

impl AccountRecord for Obligation {
    const NAME: &'static str = "Obligation";
    const DISCRIMINATOR: Discriminator = Discriminator::None;
    /// Header only; the entries follow it and are sliced by `decode`.
    const LAYOUT: Layout = OBLIGATION_HEADER_LAYOUT;

    /// Expects the header fields plus `deposits` / `borrows` lists.
    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        let deposits = fields
            .list("deposits")?
            .iter()
            .map(|v| match v {
                Value::Struct(f) => ObligationCollateral::from_fields(f),
                _ => Err(Error::TypeMismatch { field: "deposits".to_string(), expected: "struct" }),
            })
            .collect::<Result<Vec<_>>>()?;
        let borrows = fields
            .list("borrows")?
            .iter()
            .map(|v| match v {
                Value::Struct(f) => ObligationLiquidity::from_fields(f),
                _ => Err(Error::TypeMismatch { field: "borrows".to_string(), expected: "struct" }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Obligation {
            address,
            version: check_version(fields, Self::NAME)?,
            last_update: LastUpdate::from_fields(fields.record("last_update")?)?,
            lending_market: fields.pubkey("lending_market")?,
            owner: fields.pubkey("owner")?,
            deposited_value: decimal(fields, "deposited_value")?,
            borrowed_value: decimal(fields, "borrowed_value")?,
            allowed_borrow_value: decimal(fields, "allowed_borrow_value")?,
            unhealthy_borrow_value: decimal(fields, "unhealthy_borrow_value")?,
            borrowed_value_upper_bound: decimal(fields, "borrowed_value_upper_bound")?,
            borrowing_isolated_asset: fields.bool("borrowing_isolated_asset")?,
            super_unhealthy_borrow_value: decimal(fields, "super_unhealthy_borrow_value")?,
            unweighted_borrowed_value: decimal(fields, "unweighted_borrowed_value")?,
            closeable: fields.bool("closeable")?,
            deposits,
            borrows,
        })
    }

    /// Header first, then `deposits_len` collateral entries followed by
    /// `borrows_len` liquidity entries, each at its entry-aligned offset.
    fn decode(data: &[u8], address: Pubkey) -> Result<Self> {
        let (header, consumed) = OBLIGATION_HEADER_LAYOUT.decode(data)?;
        let mut fields = header.into_struct(Self::NAME)?;
        let deposits_len = fields.u8("deposits_len")? as usize;
        let borrows_len = fields.u8("borrows_len")? as usize;

        if deposits_len + borrows_len > MAX_OBLIGATION_RESERVES {
            return Err(Error::malformed(format!(
                "Obligation {}: {} deposits and {} borrows exceed the {} reserve limit",
                address, deposits_len, borrows_len, MAX_OBLIGATION_RESERVES
            )));
        }

        let tail = &data[consumed..];
        let needed =
            deposits_len * OBLIGATION_COLLATERAL_LEN + borrows_len * OBLIGATION_LIQUIDITY_LEN;
        if needed > tail.len() {
            return Err(Error::malformed(format!(
                "Obligation {}: {} deposits and {} borrows need {} bytes after the header, \
                 {} available",
                address,
                deposits_len,
                borrows_len,
                needed,
                tail.len()
            )));
        }
        let (deposit_bytes, rest) = tail.split_at(deposits_len * OBLIGATION_COLLATERAL_LEN);
        let deposits = deposit_bytes
            .chunks_exact(OBLIGATION_COLLATERAL_LEN)
            .map(|entry| OBLIGATION_COLLATERAL_LAYOUT.decode(entry).map(|(v, _)| v))
            .collect::<Result<Vec<_>>>()?;
        let borrows = rest[..borrows_len * OBLIGATION_LIQUIDITY_LEN]
            .chunks_exact(OBLIGATION_LIQUIDITY_LEN)
            .map(|entry| OBLIGATION_LIQUIDITY_LAYOUT.decode(entry).map(|(v, _)| v))
            .collect::<Result<Vec<_>>>()?;

        fields.set("deposits", Value::List(deposits));
        fields.set("borrows", Value::List(borrows));
        log::debug!(
            "Decoded Obligation {} with {} deposits, {} borrows",
            address,
            deposits_len,
            borrows_len
        );
        Self::from_fields(address, &fields)
    }
}

/// What to do with an obligation entry whose reserve is not in the supplied set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownReservePolicy {
    /// Leave the entry out of the totals and report it in `skipped_reserves`.
    #[default]
    Skip,
    /// Fail with `UnknownReserveReference`.
    Reject,
}

/// Obligation totals recomputed from reserve state, in quote currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObligationValuation {
    pub deposited_value: Decimal,
    pub allowed_borrow_value: Decimal,
    pub unhealthy_borrow_value: Decimal,
    pub borrowed_value: Decimal,
    pub skipped_reserves: Vec<Pubkey>,
}

impl ObligationValuation {
    /// unhealthy borrow value / borrowed value; infinite without debt.
    pub fn health_factor(&self) -> f64 {
        if self.borrowed_value.is_zero() {
            return f64::INFINITY;
        }
        self.unhealthy_borrow_value.to_f64() / self.borrowed_value.to_f64()
    }

    pub fn is_liquidatable(&self) -> bool {
        self.borrowed_value > self.unhealthy_borrow_value
    }

    pub fn is_complete(&self) -> bool {
        self.skipped_reserves.is_empty()
    }
}

impl Obligation {
    /// Header and entry list of an obligation account, for fixtures and simulation.
    /// `deposits_len` / `borrows_len` in `header` are overwritten.
    pub fn pack(
        header: &Fields,
        deposits: &[ObligationCollateral],
        borrows: &[ObligationLiquidity],
    ) -> Result<Vec<u8>> {
        let mut header = header.clone();
        header.set("deposits_len", deposits.len() as u64);
        header.set("borrows_len", borrows.len() as u64);
        let mut out = OBLIGATION_HEADER_LAYOUT.encode_to_vec(&Value::Struct(header))?;
        for deposit in deposits {
            OBLIGATION_COLLATERAL_LAYOUT.encode(&Value::Struct(deposit.to_fields()), &mut out)?;
        }
        for borrow in borrows {
            OBLIGATION_LIQUIDITY_LAYOUT.encode(&Value::Struct(borrow.to_fields()), &mut out)?;
        }
        Ok(out)
    }

    pub fn deposit_reserves(&self) -> Vec<Pubkey> {
        self.deposits.iter().map(|d| d.deposit_reserve).collect()
    }

    pub fn borrow_reserves(&self) -> Vec<Pubkey> {
        self.borrows.iter().map(|b| b.borrow_reserve).collect()
    }

    /// Health factor from the values stored on chain at the last refresh.
    pub fn stored_health_factor(&self) -> f64 {
        if self.borrowed_value.is_zero() {
            return f64::INFINITY;
        }
        self.unhealthy_borrow_value.to_f64() / self.borrowed_value.to_f64()
    }

    /// Recomputes deposit and borrow values from `reserves`, matching entries
    /// to reserves by address.
    pub fn valuation(
        &self,
        reserves: &[Reserve],
        policy: UnknownReservePolicy,
    ) -> Result<ObligationValuation> {
        let by_address: HashMap<Pubkey, &Reserve> =
            reserves.iter().map(|r| (r.address, r)).collect();
        let mut out = ObligationValuation::default();

        for deposit in &self.deposits {
            let found =
                self.lookup_reserve(&by_address, &deposit.deposit_reserve, policy, &mut out)?;
            let reserve = match found {
                Some(reserve) => reserve,
                None => continue,
            };
            let liquidity = reserve.collateral_to_liquidity(deposit.deposited_amount)?;
            let value = reserve.market_value(liquidity)?;
            out.deposited_value = out.deposited_value.try_add(value)?;
            out.allowed_borrow_value = out
                .allowed_borrow_value
                .try_add(
                    value.try_mul(Decimal::from_percent(reserve.config.loan_to_value_ratio))?,
                )?;
            out.unhealthy_borrow_value = out
                .unhealthy_borrow_value
                .try_add(
                    value.try_mul(Decimal::from_percent(reserve.config.liquidation_threshold))?,
                )?;
        }

        for borrow in &self.borrows {
            let found =
                self.lookup_reserve(&by_address, &borrow.borrow_reserve, policy, &mut out)?;
            let reserve = match found {
                Some(reserve) => reserve,
                None => continue,
            };
            let value = reserve.market_value(borrow.borrowed_amount_wads)?;
            out.borrowed_value = out.borrowed_value.try_add(value)?;
        }

        Ok(out)
    }

    fn lookup_reserve<'a>(
        &self,
        by_address: &HashMap<Pubkey, &'a Reserve>,
        address: &Pubkey,
        policy: UnknownReservePolicy,
        out: &mut ObligationValuation,
    ) -> Result<Option<&'a Reserve>> {
        if let Some(reserve) = by_address.get(address) {
            return Ok(Some(*reserve));
        }
        match policy {
            UnknownReservePolicy::Reject => Err(Error::UnknownReserveReference(*address)),
            UnknownReservePolicy::Skip => {
                log::warn!(
                    "Obligation {}: reserve {} not in supplied set, entry skipped",
                    self.address,
                    address
                );
                out.skipped_reserves.push(*address);
                Ok(None)
            }
        }
    }
}
