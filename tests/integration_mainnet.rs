//! Mainnet Integration Test Suite
//!
//! Decodes live accounts of every supported program family.
//! All tests are ignored by default and read their targets from the environment.
//!
//! To run all tests:
//!   cargo test --test integration_mainnet -- --ignored
//!
//! To run a specific test:
//!   cargo test --test integration_mainnet test_real_reserve_decoding -- --ignored --nocapture
//!
//! Environment variables (see each test for specific requirements):
//!   - RPC_HTTP_URL: RPC endpoint (defaults to mainnet)
//!   - TEST_RESERVE_ADDRESS: Solend reserve (defaults to the main-market USDC reserve)
//!   - TEST_OBLIGATION_ADDRESS: Solend obligation
//!   - TEST_SABER_SWAP_ADDRESS: Saber StableSwap pool
//!   - TEST_QUARRY_ADDRESS / TEST_WALLET_ADDRESS: Quarry and miner authority
//!   - TEST_KATANA_VAULT_ADDRESS: Katana vault

use anyhow::{Context, Result};
use defi_sdk::blockchain::rpc_client::{AccountSource, RpcClient};
use defi_sdk::config::Config;
use defi_sdk::core::registry::AccountAddresses;
use defi_sdk::protocol::solend::UnknownReservePolicy;
use defi_sdk::protocol::{katana, marinade, quarry, saber, solend, ProtocolRegistry};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Config and RPC client from the environment
fn connect() -> Result<(Config, RpcClient)> {
    dotenv::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;
    let client = RpcClient::from_config(&config).context("Failed to create RPC client")?;
    Ok((config, client))
}

fn get_pubkey_from_env(var_name: &str) -> Result<Pubkey> {
    let address_str = std::env::var(var_name)
        .with_context(|| format!("{} environment variable must be set", var_name))?;

    Pubkey::from_str(&address_str)
        .with_context(|| format!("Invalid {} format: {}", var_name, address_str))
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Test 1: Solend reserve decoding
///
/// Required env vars:
///   - TEST_RESERVE_ADDRESS: (optional, defaults to the USDC reserve)
#[tokio::test]
#[ignore]
async fn test_real_reserve_decoding() {
    println!("Test 1: Solend Reserve Decoding");
    println!("{}", "=".repeat(80));

    let reserve_address = get_pubkey_from_env("TEST_RESERVE_ADDRESS")
        .or_else(|_| {
            Pubkey::from_str(AccountAddresses::SOLEND_USDC_RESERVE).context("default reserve")
        })
        .expect("reserve address");
    let (config, client) = connect().expect("connection");

    let reserve = solend::accounts::fetch_reserve(&client, &config.programs, &reserve_address)
        .await
        .expect("Failed to decode reserve");

    println!("   Reserve: {}", reserve.address);
    println!("   Lending market: {}", reserve.lending_market);
    println!(
        "   Mint: {} ({} decimals)",
        reserve.liquidity.mint_pubkey,
        reserve.liquidity.mint_decimals
    );
    println!("   Utilization: {:.2}%", reserve.utilization_ratio() * 100.0);
    println!("   Supply APY: {:.2}%", reserve.supply_apy() * 100.0);

    assert_eq!(reserve.version, 1);
    assert!(reserve.config.liquidation_threshold >= reserve.config.loan_to_value_ratio);
    assert!(reserve.utilization_ratio() <= 1.0);
}

/// Test 2: Solend obligation valuation
///
/// Required env vars:
///   - TEST_OBLIGATION_ADDRESS: Real obligation address
#[tokio::test]
#[ignore]
async fn test_real_obligation_valuation() {
    println!("Test 2: Solend Obligation Valuation");
    println!("{}", "=".repeat(80));

    let obligation_address = match get_pubkey_from_env("TEST_OBLIGATION_ADDRESS") {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };
    let (config, client) = connect().expect("connection");

    let obligation =
        solend::accounts::fetch_obligation(&client, &config.programs, &obligation_address)
            .await
            .expect("Failed to decode obligation");
    let reserves =
        solend::accounts::fetch_obligation_reserves(&client, &config.programs, &obligation)
            .await
            .expect("Failed to fetch obligation reserves");
    let valuation = obligation
        .valuation(&reserves, UnknownReservePolicy::Reject)
        .expect("Failed to value obligation");

    println!("   Owner: {}", obligation.owner);
    println!("   Deposits: {}, borrows: {}", obligation.deposits.len(), obligation.borrows.len());
    println!("   Stored health factor: {:.4}", obligation.stored_health_factor());
    println!("   Recomputed health factor: {:.4}", valuation.health_factor());
    println!("   Deposited value: {:.2}", valuation.deposited_value.to_f64());
    println!("   Borrowed value: {:.2}", valuation.borrowed_value.to_f64());

    assert!(reserves.len() <= obligation.deposits.len() + obligation.borrows.len());
    assert!(valuation.is_complete());
}

/// Test 3: Marinade state
#[tokio::test]
#[ignore]
async fn test_marinade_state() {
    println!("Test 3: Marinade State");
    println!("{}", "=".repeat(80));

    let (config, client) = connect().expect("connection");
    let state = marinade::accounts::fetch_state(&client, &config.programs)
        .await
        .expect("Failed to decode Marinade state");

    println!("   mSOL supply: {}", state.msol_supply);
    println!("   mSOL price: {:.6} SOL", state.msol_price());

    assert_eq!(state.msol_mint, config.programs.msol_mint);
    assert!(state.msol_price() >= 1.0);
    let reserve =
        marinade::accounts::reserve_address(&config.programs, &state).expect("reserve PDA");
    let reserve_account = client.get_account(&reserve).await.expect("reserve fetch");
    assert!(reserve_account.is_some(), "reserve PDA {} does not exist", reserve);
}

/// Test 4: Saber swap pool with reserve balances
///
/// Required env vars:
///   - TEST_SABER_SWAP_ADDRESS: StableSwap pool address
#[tokio::test]
#[ignore]
async fn test_saber_swap_with_balances() {
    println!("Test 4: Saber Swap Pool");
    println!("{}", "=".repeat(80));

    let swap_address = match get_pubkey_from_env("TEST_SABER_SWAP_ADDRESS") {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };
    let (config, client) = connect().expect("connection");

    let swap = saber::accounts::fetch_swap_with_balances(&client, &config.programs, &swap_address)
        .await
        .expect("Failed to decode swap");

    println!("   Pool mint: {}", swap.pool_mint);
    println!("   Amp factor: {}", swap.amp_factor(now()));
    println!("   Trade fee: {:.4}%", swap.fees.trade_fee() * 100.0);
    println!("   Balances: {:?} / {:?}", swap.token_a.balance, swap.token_b.balance);

    assert!(swap.token_a.balance.is_some() && swap.token_b.balance.is_some());
    saber::accounts::swap_authority(&config.programs, &swap).expect("swap authority");
}

/// Test 5: Quarry miner rewards
///
/// Required env vars:
///   - TEST_QUARRY_ADDRESS: Quarry address
///   - TEST_WALLET_ADDRESS: (optional) miner authority
#[tokio::test]
#[ignore]
async fn test_quarry_miner_rewards() {
    println!("Test 5: Quarry Miner");
    println!("{}", "=".repeat(80));

    let quarry_address = match get_pubkey_from_env("TEST_QUARRY_ADDRESS") {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };
    let (config, client) = connect().expect("connection");

    let quarry = quarry::accounts::fetch_quarry(&client, &config.programs, &quarry_address)
        .await
        .expect("Failed to decode quarry");
    let rewarder = quarry::accounts::fetch_rewarder(&client, &config.programs, &quarry.rewarder)
        .await
        .expect("Failed to decode rewarder");

    println!("   Token mint: {}", quarry.token_mint_key);
    println!("   Total staked: {}", quarry.total_tokens_deposited);
    let rate = rewarder.quarry_rewards_rate(&quarry).unwrap_or_default();
    println!("   Daily rewards rate: {}", rate);

    if let Ok(wallet) = get_pubkey_from_env("TEST_WALLET_ADDRESS") {
        match quarry::accounts::find_miner(&client, &config.programs, &quarry, &wallet).await {
            Ok(Some(miner)) => {
                println!("   Miner balance: {}", miner.balance);
                let claimable = miner.claimable_rewards(&quarry, now()).unwrap_or_default();
                println!("   Claimable: {}", claimable);
            }
            Ok(None) => println!("   No miner for {}", wallet),
            Err(e) => panic!("Failed to look up miner: {}", e),
        }
    }
}

/// Test 6: Katana vault and option market
///
/// Required env vars:
///   - TEST_KATANA_VAULT_ADDRESS: Vault address
#[tokio::test]
#[ignore]
async fn test_katana_vault() {
    println!("Test 6: Katana Vault");
    println!("{}", "=".repeat(80));

    let vault_address = match get_pubkey_from_env("TEST_KATANA_VAULT_ADDRESS") {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Skipping test: {}", e);
            return;
        }
    };
    let (config, client) = connect().expect("connection");

    let vault = katana::accounts::fetch_vault(&client, &config.programs, &vault_address)
        .await
        .expect("Failed to decode vault");
    println!("   Round: {}", vault.round);
    println!("   Underlying: {}", vault.underlying_token_mint);
    println!("   Remaining capacity: {}", vault.remaining_capacity());

    if vault.round > 0 {
        let last_round = vault.round - 1;
        let pps = katana::accounts::fetch_price_per_share(
            &client,
            &config.programs,
            &vault.address,
            last_round,
        )
        .await
        .expect("Failed to decode price per share");
        println!("   Last price per share: {} ({} decimals)", pps.price_per_share, vault.decimals);
    }

    let otc = katana::accounts::fetch_otc_terms(
        &client,
        &config.programs,
        &vault.address,
        &vault.option_market,
        katana::MissingPolicy::Absent,
    )
    .await
    .expect("Failed to read OTC terms");
    println!("   OTC terms posted: {}", otc.is_some());
}

/// Test 7: Registry detection on a live account
#[tokio::test]
#[ignore]
async fn test_registry_decodes_live_reserve() {
    let (config, client) = connect().expect("connection");
    let address = Pubkey::from_str(AccountAddresses::SOLEND_USDC_RESERVE).expect("reserve address");
    let account = client
        .get_account(&address)
        .await
        .expect("fetch")
        .expect("reserve account exists");

    let registry = ProtocolRegistry::with_programs(&config.programs);
    let decoded = registry
        .decode(&account.owner, address, &account.data)
        .expect("Failed to decode through registry");
    assert_eq!(decoded.kind(), "Reserve");
}
