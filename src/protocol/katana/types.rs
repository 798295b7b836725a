use crate::core::error::{Error, Result};
use crate::layout::{field, AccountRecord, Discriminator, Fields, Layout};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

pub const VAULT_DISCRIMINATOR: [u8; 8] = [0xd3, 0x08, 0xe8, 0x2b, 0x02, 0x98, 0x75, 0x77];
pub const USER_ACCOUNT_DISCRIMINATOR: [u8; 8] = [0xd3, 0x21, 0x88, 0x10, 0xba, 0x6e, 0xf2, 0x7f];
pub const PRICE_PER_SHARE_DISCRIMINATOR: [u8; 8] = [0x45, 0xfa, 0x80, 0xf4, 0x3a, 0x31, 0xf0, 0xd9];
pub const OTC_TERMS_DISCRIMINATOR: [u8; 8] = [0x00, 0xb6, 0x22, 0xd1, 0x34, 0x16, 0xc5, 0x0e];
pub const OPTION_MARKET_DISCRIMINATOR: [u8; 8] = [0xaf, 0xee, 0xa2, 0x61, 0x35, 0x7a, 0x10, 0x1d];

/// Offset of `underlying_asset_mint` in an option market account.
pub const OPTION_MARKET_UNDERLYING_OFFSET: usize = 72;

pub const VAULT_LAYOUT: Layout = Layout::Struct(&[
    field("admin", Layout::Pubkey),
    field("pending_admin", Layout::Pubkey),
    field("vault_authority", Layout::Pubkey),
    field("cap", Layout::U64),
    field("locked_amount", Layout::U64),
    field("last_locked_amount", Layout::U64),
    field("total_pending_deposits", Layout::U64),
    field("queued_withdraw_shares", Layout::U64),
    field("round", Layout::U64),
    field("underlying_token_mint", Layout::Pubkey),
    field("quote_token_mint", Layout::Pubkey),
    field("option_token_mint", Layout::Pubkey),
    field("next_option_token_mint", Layout::Pubkey),
    field("next_option_token_vault", Layout::Pubkey),
    field("writer_token_mint", Layout::Pubkey),
    field("next_writer_token_mint", Layout::Pubkey),
    field("next_writer_token_vault", Layout::Pubkey),
    field("derivative_token_mint", Layout::Pubkey),
    field("early_access_token_mint", Layout::Pubkey),
    field("underlying_token_vault", Layout::Pubkey),
    field("quote_token_vault", Layout::Pubkey),
    field("option_token_vault", Layout::Pubkey),
    field("writer_token_vault", Layout::Pubkey),
    field("option_market", Layout::Pubkey),
    field("next_option_market", Layout::Pubkey),
    field("vault_bump", Layout::U8),
    field("vault_authority_bump", Layout::U8),
    field("decimals", Layout::U8),
]);

pub const PENDING_DEPOSIT_LAYOUT: Layout = Layout::Struct(&[
    field("round", Layout::U64),
    field("amount_underlying", Layout::U64),
]);

pub const PENDING_WITHDRAW_LAYOUT: Layout = Layout::Struct(&[
    field("round", Layout::U64),
    field("shares", Layout::U64),
]);

pub const USER_ACCOUNT_LAYOUT: Layout = Layout::Struct(&[
    field("owner", Layout::Pubkey),
    field("pending_deposit_data", PENDING_DEPOSIT_LAYOUT),
    field("pending_withdraw_data", PENDING_WITHDRAW_LAYOUT),
    field("bump", Layout::U8),
]);

pub const PRICE_PER_SHARE_LAYOUT: Layout = Layout::Struct(&[field("price_per_share", Layout::U64)]);

pub const OTC_TERMS_LAYOUT: Layout = Layout::Struct(&[
    field("round", Layout::U64),
    field("total_price", Layout::U64),
]);

pub const OPTION_MARKET_LAYOUT: Layout = Layout::Struct(&[
    field("option_mint", Layout::Pubkey),
    field("writer_token_mint", Layout::Pubkey),
    field("underlying_asset_mint", Layout::Pubkey),
    field("quote_asset_mint", Layout::Pubkey),
    field("underlying_amount_per_contract", Layout::U64),
    field("quote_amount_per_contract", Layout::U64),
    field("expiration_unix_timestamp", Layout::I64),
    field("underlying_asset_pool", Layout::Pubkey),
    field("quote_asset_pool", Layout::Pubkey),
    field("mint_fee_account", Layout::Pubkey),
    field("exercise_fee_account", Layout::Pubkey),
    field("expired", Layout::Bool),
    field("bump_seed", Layout::U8),
]);

/// What a lookup returns when the account or match does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// An all-default record carrying only the looked-up address.
    Default,
    /// `None`.
    Absent,
}

impl MissingPolicy {
    pub fn resolve<T>(self, found: Option<T>, default: impl FnOnce() -> T) -> Option<T> {
        match (found, self) {
            (Some(value), _) => Some(value),
            (None, MissingPolicy::Default) => Some(default()),
            (None, MissingPolicy::Absent) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vault {
    pub address: Pubkey,
    pub admin: Pubkey,
    pub pending_admin: Pubkey,
    pub vault_authority: Pubkey,
    pub cap: u64,
    /// Underlying locked into the current round's options.
    pub locked_amount: u64,
    pub last_locked_amount: u64,
    pub total_pending_deposits: u64,
    pub queued_withdraw_shares: u64,
    pub round: u64,
    pub underlying_token_mint: Pubkey,
    pub quote_token_mint: Pubkey,
    pub option_token_mint: Pubkey,
    pub next_option_token_mint: Pubkey,
    pub next_option_token_vault: Pubkey,
    pub writer_token_mint: Pubkey,
    pub next_writer_token_mint: Pubkey,
    pub next_writer_token_vault: Pubkey,
    /// Vault share mint.
    pub derivative_token_mint: Pubkey,
    pub early_access_token_mint: Pubkey,
    pub underlying_token_vault: Pubkey,
    pub quote_token_vault: Pubkey,
    pub option_token_vault: Pubkey,
    pub writer_token_vault: Pubkey,
    pub option_market: Pubkey,
    pub next_option_market: Pubkey,
    pub vault_bump: u8,
    pub vault_authority_bump: u8,
    /// Decimals of the underlying mint, shared by the share mint and price per share.
    pub decimals: u8,
}

impl AccountRecord for Vault {
    const NAME: &'static str = "Vault";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(VAULT_DISCRIMINATOR);
    const LAYOUT: Layout = VAULT_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(Vault {
            address,
            admin: fields.pubkey("admin")?,
            pending_admin: fields.pubkey("pending_admin")?,
            vault_authority: fields.pubkey("vault_authority")?,
            cap: fields.u64("cap")?,
            locked_amount: fields.u64("locked_amount")?,
            last_locked_amount: fields.u64("last_locked_amount")?,
            total_pending_deposits: fields.u64("total_pending_deposits")?,
            queued_withdraw_shares: fields.u64("queued_withdraw_shares")?,
            round: fields.u64("round")?,
            underlying_token_mint: fields.pubkey("underlying_token_mint")?,
            quote_token_mint: fields.pubkey("quote_token_mint")?,
            option_token_mint: fields.pubkey("option_token_mint")?,
            next_option_token_mint: fields.pubkey("next_option_token_mint")?,
            next_option_token_vault: fields.pubkey("next_option_token_vault")?,
            writer_token_mint: fields.pubkey("writer_token_mint")?,
            next_writer_token_mint: fields.pubkey("next_writer_token_mint")?,
            next_writer_token_vault: fields.pubkey("next_writer_token_vault")?,
            derivative_token_mint: fields.pubkey("derivative_token_mint")?,
            early_access_token_mint: fields.pubkey("early_access_token_mint")?,
            underlying_token_vault: fields.pubkey("underlying_token_vault")?,
            quote_token_vault: fields.pubkey("quote_token_vault")?,
            option_token_vault: fields.pubkey("option_token_vault")?,
            writer_token_vault: fields.pubkey("writer_token_vault")?,
            option_market: fields.pubkey("option_market")?,
            next_option_market: fields.pubkey("next_option_market")?,
            vault_bump: fields.u8("vault_bump")?,
            vault_authority_bump: fields.u8("vault_authority_bump")?,
            decimals: fields.u8("decimals")?,
        })
    }
}

impl Vault {
    /// Underlying that can still be deposited before hitting the cap.
    pub fn remaining_capacity(&self) -> u64 {
        self.cap
            .saturating_sub(self.locked_amount.saturating_add(self.total_pending_deposits))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub pending_deposit_round: u64,
    pub pending_deposit_amount: u64,
    pub pending_withdraw_round: u64,
    pub pending_withdraw_shares: u64,
    pub bump: u8,
}

impl AccountRecord for UserAccount {
    const NAME: &'static str = "UserAccount";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(USER_ACCOUNT_DISCRIMINATOR);
    const LAYOUT: Layout = USER_ACCOUNT_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        let deposit = fields.record("pending_deposit_data")?;
        let withdraw = fields.record("pending_withdraw_data")?;
        Ok(UserAccount {
            address,
            owner: fields.pubkey("owner")?,
            pending_deposit_round: deposit.u64("round")?,
            pending_deposit_amount: deposit.u64("amount_underlying")?,
            pending_withdraw_round: withdraw.u64("round")?,
            pending_withdraw_shares: withdraw.u64("shares")?,
            bump: fields.u8("bump")?,
        })
    }
}

impl UserAccount {
    /// A queued withdrawal can be completed once its round has been priced.
    pub fn can_complete_withdraw(&self, vault: &Vault) -> bool {
        self.pending_withdraw_shares > 0 && self.pending_withdraw_round < vault.round
    }
}

/// Share price recorded at the close of a vault round. The round and vault
/// live in the account's seeds, not its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PricePerShare {
    pub address: Pubkey,
    /// Underlying base units per share, scaled by `10^vault.decimals`.
    pub price_per_share: u64,
}

impl AccountRecord for PricePerShare {
    const NAME: &'static str = "PricePerShare";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(PRICE_PER_SHARE_DISCRIMINATOR);
    const LAYOUT: Layout = PRICE_PER_SHARE_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(PricePerShare {
            address,
            price_per_share: fields.u64("price_per_share")?,
        })
    }
}

impl PricePerShare {
    fn scale(decimals: u8) -> Result<u128> {
        10u128
            .checked_pow(decimals as u32)
            .ok_or(Error::MathOverflow("price per share scale"))
    }

    fn narrow(value: u128) -> Result<u64> {
        u64::try_from(value).map_err(|_| Error::MathOverflow("share conversion"))
    }

    pub fn shares_to_underlying(&self, shares: u64, decimals: u8) -> Result<u64> {
        Self::narrow(shares as u128 * self.price_per_share as u128 / Self::scale(decimals)?)
    }

    /// Rounds down. A zero price has no inverse.
    pub fn underlying_to_shares(&self, underlying: u64, decimals: u8) -> Result<u64> {
        if self.price_per_share == 0 {
            return Err(Error::MathOverflow("zero price per share"));
        }
        let scaled = (underlying as u128)
            .checked_mul(Self::scale(decimals)?)
            .ok_or(Error::MathOverflow("share conversion"))?;
        Self::narrow(scaled / self.price_per_share as u128)
    }
}

/// Terms an OTC buyer accepted for a round's options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OtcTerms {
    pub address: Pubkey,
    pub round: u64,
    /// Quote paid for the round's whole option position.
    pub total_price: u64,
}

impl AccountRecord for OtcTerms {
    const NAME: &'static str = "OtcTerms";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(OTC_TERMS_DISCRIMINATOR);
    const LAYOUT: Layout = OTC_TERMS_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(OtcTerms {
            address,
            round: fields.u64("round")?,
            total_price: fields.u64("total_price")?,
        })
    }
}

impl OtcTerms {
    /// Decodes terms that may not have been posted yet. `data` is `None`
    /// when the account does not exist.
    pub fn decode_optional(
        data: Option<&[u8]>,
        address: Pubkey,
        policy: MissingPolicy,
    ) -> Result<Option<OtcTerms>> {
        let found = data.map(|bytes| OtcTerms::decode(bytes, address)).transpose()?;
        Ok(policy.resolve(found, || OtcTerms {
            address,
            ..OtcTerms::default()
        }))
    }
}

/// PsyOptions American option market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionMarket {
    pub address: Pubkey,
    pub option_mint: Pubkey,
    pub writer_token_mint: Pubkey,
    pub underlying_asset_mint: Pubkey,
    pub quote_asset_mint: Pubkey,
    pub underlying_amount_per_contract: u64,
    pub quote_amount_per_contract: u64,
    pub expiration_unix_timestamp: i64,
    pub underlying_asset_pool: Pubkey,
    pub quote_asset_pool: Pubkey,
    pub mint_fee_account: Pubkey,
    pub exercise_fee_account: Pubkey,
    pub expired: bool,
    pub bump_seed: u8,
}

impl AccountRecord for OptionMarket {
    const NAME: &'static str = "OptionMarket";
    const DISCRIMINATOR: Discriminator = Discriminator::Anchor(OPTION_MARKET_DISCRIMINATOR);
    const LAYOUT: Layout = OPTION_MARKET_LAYOUT;

    fn from_fields(address: Pubkey, fields: &Fields) -> Result<Self> {
        Ok(OptionMarket {
            address,
            option_mint: fields.pubkey("option_mint")?,
            writer_token_mint: fields.pubkey("writer_token_mint")?,
            underlying_asset_mint: fields.pubkey("underlying_asset_mint")?,
            quote_asset_mint: fields.pubkey("quote_asset_mint")?,
            underlying_amount_per_contract: fields.u64("underlying_amount_per_contract")?,
            quote_amount_per_contract: fields.u64("quote_amount_per_contract")?,
            expiration_unix_timestamp: fields.i64("expiration_unix_timestamp")?,
            underlying_asset_pool: fields.pubkey("underlying_asset_pool")?,
            quote_asset_pool: fields.pubkey("quote_asset_pool")?,
            mint_fee_account: fields.pubkey("mint_fee_account")?,
            exercise_fee_account: fields.pubkey("exercise_fee_account")?,
            expired: fields.bool("expired")?,
            bump_seed: fields.u8("bump_seed")?,
        })
    }
}

impl OptionMarket {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expired || now >= self.expiration_unix_timestamp
    }
}

/// Option market search criteria. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMarketQuery {
    pub underlying_asset_mint: Option<Pubkey>,
    pub quote_asset_mint: Option<Pubkey>,
    pub expiration_unix_timestamp: Option<i64>,
    pub underlying_amount_per_contract: Option<u64>,
    pub quote_amount_per_contract: Option<u64>,
}

impl OptionMarketQuery {
    pub fn matches(&self, market: &OptionMarket) -> bool {
        self.underlying_asset_mint.map_or(true, |m| m == market.underlying_asset_mint)
            && self.quote_asset_mint.map_or(true, |m| m == market.quote_asset_mint)
            && self
                .expiration_unix_timestamp
                .map_or(true, |ts| ts == market.expiration_unix_timestamp)
            && self
                .underlying_amount_per_contract
                .map_or(true, |a| a == market.underlying_amount_per_contract)
            && self
                .quote_amount_per_contract
                .map_or(true, |a| a == market.quote_amount_per_contract)
    }
}

/// First market matching `query`; a miss resolves through `policy`.
pub fn find_option_market(
    markets: &[OptionMarket],
    query: &OptionMarketQuery,
    policy: MissingPolicy,
) -> Option<OptionMarket> {
    let found = markets.iter().find(|m| query.matches(m)).cloned();
    if found.is_none() {
        log::debug!("No option market matches {:?} among {} candidates", query, markets.len());
    }
    policy.resolve(found, OptionMarket::default)
}
