//! Configuration management for sol-courier
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub courier: CourierConfig,
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub transfer: TransferConfig,
    pub faucet: FaucetConfig,
}

/// Submission retry tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CourierConfig {
    /// Upper bound on submission attempts per transfer
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts, no backoff
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Dry-run the transaction before submitting it
    #[serde(default = "default_simulate")]
    pub simulate_before_submit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    /// Commitment level: processed, confirmed, or finalized
    pub commitment: String,
    pub request_timeout_ms: u64,
    /// Deadline for the confirmation wait after a successful submit
    pub confirm_timeout_ms: u64,
    /// Interval between confirmation status polls
    pub confirm_poll_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the hex-encoded 64-byte secret key
    pub private_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Base58 recipient address; omit for a self-transfer
    pub recipient: Option<String>,
    pub amount_lamports: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaucetConfig {
    pub enabled: bool,
    pub airdrop_lamports: u64,
    /// Balance polls after an airdrop before giving up
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_simulate() -> bool {
    true
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("COURIER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.courier.max_attempts == 0 {
            anyhow::bail!("courier.max_attempts must be at least 1");
        }

        if self.rpc.url.is_empty() {
            anyhow::bail!("rpc.url must be configured");
        }

        if !matches!(
            self.rpc.commitment.as_str(),
            "processed" | "confirmed" | "finalized"
        ) {
            anyhow::bail!(
                "rpc.commitment must be processed, confirmed, or finalized (got {})",
                self.rpc.commitment
            );
        }

        if self.wallet.private_key_env.is_empty() {
            anyhow::bail!("wallet.private_key_env must be configured");
        }

        if self.faucet.enabled && self.faucet.airdrop_lamports == 0 {
            anyhow::bail!("faucet.airdrop_lamports must be nonzero when the faucet is enabled");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            courier: CourierConfig {
                max_attempts: 3,
                retry_delay_ms: 500,
                simulate_before_submit: true,
            },
            rpc: RpcConfig {
                url: "https://api.devnet.solana.com".to_string(),
                commitment: "confirmed".to_string(),
                request_timeout_ms: 10_000,
                confirm_timeout_ms: 30_000,
                confirm_poll_ms: 1_000,
            },
            wallet: WalletConfig {
                private_key_env: "COURIER_PRIVATE_KEY".to_string(),
            },
            transfer: TransferConfig {
                recipient: None,
                amount_lamports: 100_000,
            },
            faucet: FaucetConfig {
                enabled: true,
                airdrop_lamports: 1_000_000_000,
                poll_attempts: 5,
                poll_interval_ms: 2_000,
            },
        }
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut settings = base_settings();
        settings.courier.max_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_commitment_is_rejected() {
        let mut settings = base_settings();
        settings.rpc.commitment = "hopeful".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn defaults_apply_when_tuning_omitted() {
        let parsed: CourierConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.max_attempts, 3);
        assert_eq!(parsed.retry_delay_ms, 500);
        assert!(parsed.simulate_before_submit);
    }

    #[test]
    fn valid_settings_pass_validation() {
        assert!(base_settings().validate().is_ok());
    }
}
