//! Fetch an account and print it decoded through the protocol registry.
//!
//! ```bash
//! cargo run --bin decode_account -- \
//!   --address BgxfHJDzm44T7XG68MYKx7YisTjZu73tVovyZSjJMpmw
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use defi_sdk::blockchain::rpc_client::{AccountSource, RpcClient};
use defi_sdk::config::Config;
use defi_sdk::protocol::ProtocolRegistry;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

#[derive(Parser, Debug)]
#[command(name = "decode_account")]
#[command(about = "Decodes a lending, AMM, farm, vault or staking account into JSON")]
struct Args {
    /// Overrides RPC_HTTP_URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Account to fetch
    #[arg(long, required = true)]
    address: String,

    /// Protocol id (solend, saber, quarry, katana, marinade); detected from the owner when omitted
    #[arg(long)]
    program: Option<String>,
}

/// Pubkeys serialize as 32-byte arrays; print them in base58 instead.
fn base58_pubkeys(value: Value) -> Value {
    match value {
        Value::Array(items)
            if items.len() == 32 && items.iter().all(|v| v.as_u64().map_or(false, |b| b <= 255)) =>
        {
            let bytes: Vec<u8> = items.iter().filter_map(|v| v.as_u64()).map(|b| b as u8).collect();
            match Pubkey::try_from(bytes.as_slice()) {
                Ok(key) => Value::String(key.to_string()),
                Err(_) => Value::Array(items),
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(base58_pubkeys).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, base58_pubkeys(v))).collect())
        }
        other => other,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc_http_url = rpc_url;
        config.validate().context("Invalid --rpc-url")?;
    }

    let address = args
        .address
        .parse::<Pubkey>()
        .context("Invalid account address format")?;

    let client = RpcClient::from_config(&config).context("Failed to create RPC client")?;
    let account = client
        .get_account(&address)
        .await
        .context("Failed to fetch account")?
        .with_context(|| format!("Account {} does not exist", address))?;

    log::info!(
        "Fetched {} ({} bytes, owner {})",
        address,
        account.data.len(),
        account.owner
    );

    let registry = ProtocolRegistry::with_programs(&config.programs);
    let decoded = match args.program.as_deref() {
        Some(id) => registry
            .find(id)
            .with_context(|| format!("Unknown protocol: {}", id))?
            .decode_account(&account.owner, address, &account.data),
        None => registry.decode(&account.owner, address, &account.data),
    }
    .with_context(|| format!("Failed to decode {}", address))?;

    log::info!("Decoded {} as {}", address, decoded.kind());

    let json = serde_json::to_value(&decoded).context("Failed to serialize decoded account")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&base58_pubkeys(json)).context("Failed to format JSON")?
    );
    Ok(())
}
