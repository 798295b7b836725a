use crate::core::error::{Error, Result};
use crate::layout::{field, AccountRecord, Discriminator, Fields, Layout};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

pub const STATE_DISCRIMINATOR: [u8; 8] = [0xd8, 0x92, 0x6b, 0x5e, 0x68, 0x4b, 0xb6, 0xb1];

/// `msol_price` is a fixed-point number with this denominator.
pub const PRICE_DENOMINATOR: u64 = 1 << 32;

const FEE: Layout = Layout::Struct(&[field("basis_points", Layout::U32)]);

const LIST: Layout = Layout::Struct(&[
    field("account", Layout::Pubkey),
    field("item_size", Layout::U32),
    field("count", Layout::U32),
    field("new_account", Layout::Pubkey),
    field("copy_data_executed", Layout::U32),
]);

const STAKE_SYSTEM: Layout = Layout::Struct(&[
    field("stake_list", LIST),
    field("delayed_unstake_cooling_down", Layout::U64),
    field("stake_deposit_bump_seed", Layout::U8),
    field("stake_withdraw_bump_seed", Layout::U8),
    field("slots_for_stake_delta", Layout::U64),
    field("last_stake_delta_epoch", Layout::U64),
    field("min_stake", Layout::U64),
    field("extra_stake_delta_runs", Layout::U32),
]);

const VALIDATOR_SYSTEM: Layout = Layout::Struct(&[
    field("validator_list", LIST),
    field("manager_authority", Layout::Pubkey),
    field("total_validator_score", Layout::U32),
    field("total_active_balance", Layout::U64),
    field("auto_add_validator_enabled", Layout::U8),
]);

pub const LIQ_POOL_LAYOUT: Layout = Layout::Struct(&[
    field("lp_mint", Layout::Pubkey),
    field("lp_mint_authority_bump_seed", Layout::U8),
    field("sol_leg_bump_seed", Layout::U8),
    field("msol_leg_authority_bump_seed", Layout::U8),
    field("msol_leg", Layout::Pubkey),
    field("lp_liquidity_target", Layout::U64),
    field("lp_max_fee", FEE),
    field("lp_min_fee", FEE),
    field("treasury_cut", FEE),
    field("lp_supply", Layout::U64),
    field("lent_from_sol_leg", Layout::U64),
    field("liquidity_sol_cap", Layout::U64),
]);

/// Leading fields of the pool state; later fields are not read.
pub const STATE_LAYOUT: Layout = Layout::Struct(&[
    field("msol_mint", Layout::Pubkey),
    field("admin_authority", Layout::Pubkey),
    field("operational_sol_account", Layout::Pubkey),
    field("treasury_msol_account", Layout::Pubkey),
    field("reserve_bump_seed", Layout::U8),
    field("msol_mint_authority_bump_seed", Layout::U8),
    field("rent_exempt_for_token_acc", Layout::U64),
    field("reward_fee", FEE),
    field("stake_system", STAKE_SYSTEM),
    field("validator_system", VALIDATOR_SYSTEM),
    field("liq_pool", LIQ_POOL_LAYOUT),
    field("available_reserve_balance", Layout::U64),
    field("msol_supply", Layout::U64),
    field("msol_price", Layout::U64),
    field("circulating_ticket_count", Layout::U64),
    field("circulating_ticket_balance", Layout::U64),
    field("lent_from_reserve", Layout::U64),
    field("min_deposit", Layout::U64),
    field("min_withdraw", Layout::U64),
    field("staking_sol_cap", Layout::U64),
    field("emergency_cooling_down", Layout::U64),
]);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiqPool {
    pub lp_mint: Pubkey,
    pub lp_mint_authority_bump_seed: u8,
    pub sol_leg_bump_seed: u8,
    pub msol_leg_authority_bump_seed: u8,
    pub msol_leg: Pubkey,
    pub lp_liquidity_target: u64,
    pub lp_max_fee_bps: u32,
    pub lp_min_fee_bps: u32,
    pub treasury_cut_bps: u32,
    pub lp_supply: u64,
    pub lent_from_sol_leg: u64,
    pub liquidity_sol_cap: u64,
}

impl LiqPool {
    fn from_fields(fields: &Fields) -> Result<Self> {
        let bps = |name: &str| fields.record(name).and_then(|fee| fee.u32("basis_points"));
        Ok(LiqPool {
            lp_mint: fields.pubkey("lp_mint")?,
            lp_mint_authority_bump_seed: fields.u8("lp_mint_authority_bump_seed")?,
            sol_leg_bump_seed: fields.u8("sol_leg_bump_seed")?,
            msol_leg_authority_bump_seed: fields.u8("msol_leg_authority_bump_seed")?,
            msol_leg: fields.pubkey("msol_leg")?,
            lp_liquidity_target: fields.u64("lp_liquidity_target")?,
            lp_max_fee_bps: bps("lp_max_fee")?,
            lp_min_fee_bps: bps("lp_min_fee")?,
            treasury_cut_bps: bps("treasury_cut")?,
            lp_supply: fields.u64("lp_supply")?,
            lent_from_sol_leg: fields.u64("lent_from_sol_leg")?,
            liquidity_sol_cap: fields.u64("liquidity_sol_cap")?,
        })
    }
}

/// Marinade liquid-staking pool state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct State {
    pub address: Pubkey,
    pub msol_mint: Pubkey,
    pub admin_authority: Pubkey,
    pub operational_sol_account: Pubkey,
    pub treasury_msol_account: Pubkey,
    pub reserve_bump_seed: u8,
    pub msol_mint_authority_bump_seed: u8,
    pub rent_exempt_for_token_acc: u64,
    pub reward_fee_bps: u32,
    pub validator_manager_authority: Pubkey,
    pub total_active_balance: u64,
    pub liq_pool: LiqPool,
    pub available_reserve_balance: u64,
    pub msol_supply: u64,
    /// mSOL price in lamports, scaled by [`PRICE_DENOMINATOR`].
    pub msol_price: u64,
    pub circulating_ticket_count: u64,
    pub circulating_ticket_balance: u64,
    pub lent_from_reserve: u64,
    pub min_deposit: u64,
    pub min_withdraw: u64,
    pub staking_sol_cap: u64,
    pub emergency_cooling_down: u64,
}

impl AccountRecord for State {
    const NAME: &'static str = "State";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(STATE_DISCRIMINATOR);
    const LAYOUT: Layout = STATE_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        let validators = fields.record("validator_system")?;
        Ok(State {
            address,
            msol_mint: fields.pubkey("msol_mint")?,
            admin_authority: fields.pubkey("admin_authority")?,
            operational_sol_account: fields.pubkey("operational_sol_account")?,
            treasury_msol_account: fields.pubkey("treasury_msol_account")?,
            reserve_bump_seed: fields.u8("reserve_bump_seed")?,
            msol_mint_authority_bump_seed: fields.u8("msol_mint_authority_bump_seed")?,
            rent_exempt_for_token_acc: fields.u64("rent_exempt_for_token_acc")?,
            reward_fee_bps: fields.record("reward_fee")?.u32("basis_points")?,
            validator_manager_authority: validators.pubkey("manager_authority")?,
            total_active_balance: validators.u64("total_active_balance")?,
            liq_pool: LiqPool::from_fields(fields.record("liq_pool")?)?,
            available_reserve_balance: fields.u64("available_reserve_balance")?,
            msol_supply: fields.u64("msol_supply")?,
            msol_price: fields.u64("msol_price")?,
            circulating_ticket_count: fields.u64("circulating_ticket_count")?,
            circulating_ticket_balance: fields.u64("circulating_ticket_balance")?,
            lent_from_reserve: fields.u64("lent_from_reserve")?,
            min_deposit: fields.u64("min_deposit")?,
            min_withdraw: fields.u64("min_withdraw")?,
            staking_sol_cap: fields.u64("staking_sol_cap")?,
            emergency_cooling_down: fields.u64("emergency_cooling_down")?,
        })
    }
}

impl State {
    /// Lamports per mSOL.
    pub fn msol_price(&self) -> f64 {
        self.msol_price as f64 / PRICE_DENOMINATOR as f64
    }

    /// mSOL minted for `lamports`, rounded down.
    pub fn lamports_to_msol(&self, lamports: u64) -> Result<u64> {
        if self.msol_price == 0 {
            return Err(Error::MathOverflow("zero msol price"));
        }
        let msol = lamports as u128 * PRICE_DENOMINATOR as u128 / self.msol_price as u128;
        u64::try_from(msol).map_err(|_| Error::MathOverflow("lamports to msol"))
    }

    /// Lamports backing `msol`, rounded down.
    pub fn msol_to_lamports(&self, msol: u64) -> Result<u64> {
        let lamports = msol as u128 * self.msol_price as u128 / PRICE_DENOMINATOR as u128;
        u64::try_from(lamports).map_err(|_| Error::MathOverflow("msol to lamports"))
    }
}
