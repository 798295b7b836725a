use crate::core::registry::{parse_pubkey, ProgramRegistry, REGISTRY_ENV_OVERRIDES};
use anyhow::{Context, Result};
use solana_sdk::commitment_config::CommitmentConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_http_url: String,
    pub rpc_timeout_seconds: u64,
    /// processed | confirmed | finalized
    pub commitment: String,
    pub programs: ProgramRegistry,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut programs =
            ProgramRegistry::mainnet().context("Failed to load mainnet program registry")?;
        for (var, name) in REGISTRY_ENV_OVERRIDES {
            if let Ok(value) = env::var(var) {
                let address = parse_pubkey(value.trim(), var)
                    .with_context(|| format!("Invalid {} value", var))?;
                programs = programs
                    .with_override(name, address)
                    .with_context(|| format!("Failed to apply {}", var))?;
            }
        }

        let config = Config {
            rpc_http_url: env::var("RPC_HTTP_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            rpc_timeout_seconds: env::var("RPC_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid RPC_TIMEOUT_SECONDS value")?,
            commitment: env::var("RPC_COMMITMENT").unwrap_or_else(|_| "confirmed".to_string()),
            programs,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rpc_http_url.starts_with("http://") && !self.rpc_http_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "RPC_HTTP_URL must start with http:// or https://"
            ));
        }

        if self.rpc_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("RPC_TIMEOUT_SECONDS must be greater than 0"));
        }

        if self.rpc_timeout_seconds > 30 {
            log::warn!(
                "RPC_TIMEOUT_SECONDS={} is very high (>30s), \
                 a stuck request will block callers that long",
                self.rpc_timeout_seconds
            );
        }

        self.commitment_config()?;

        if self.rpc_http_url.contains("api.mainnet-beta.solana.com") {
            log::warn!(
                "Using the public mainnet RPC endpoint, getProgramAccounts calls may be rate limited"
            );
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| anyhow::anyhow!("Invalid RPC_COMMITMENT value: {}", self.commitment))
    }
}
