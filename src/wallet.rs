//! Wallet loading and readiness state
//!
//! The signing identity comes from an authenticated session upstream; this
//! module only materializes it from the environment and tracks readiness as an
//! explicit state instead of an optional handle.

use crate::config::WalletConfig;
use crate::error::{CourierError, CourierResult};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::info;

/// Wallet readiness state
pub enum WalletState {
    /// No key material loaded yet
    Uninitialized,
    /// Key material loaded and usable
    Ready(Keypair),
    /// Loading was attempted and failed
    Failed(String),
}

/// Holds the signing identity for transfer submissions
pub struct Wallet {
    state: WalletState,
}

impl Wallet {
    /// Create a wallet with no key material
    pub fn uninitialized() -> Self {
        Self {
            state: WalletState::Uninitialized,
        }
    }

    /// Load the signing key named by configuration from the environment
    pub fn load(config: &WalletConfig) -> Self {
        let state = match std::env::var(&config.private_key_env) {
            Ok(encoded) => match parse_keypair(&encoded) {
                Ok(keypair) => {
                    info!("Wallet loaded with public key: {}", keypair.pubkey());
                    WalletState::Ready(keypair)
                }
                Err(reason) => WalletState::Failed(reason),
            },
            Err(_) => WalletState::Failed(format!(
                "No wallet configured. Set {} to a hex-encoded secret key",
                config.private_key_env
            )),
        };

        Self { state }
    }

    /// Get the signing keypair, failing if the wallet is not ready
    pub fn keypair(&self) -> CourierResult<&Keypair> {
        match &self.state {
            WalletState::Ready(keypair) => Ok(keypair),
            WalletState::Uninitialized => {
                Err(CourierError::Wallet("wallet not initialized".to_string()))
            }
            WalletState::Failed(reason) => Err(CourierError::Wallet(reason.clone())),
        }
    }

    /// Get the wallet's public key, failing if the wallet is not ready
    pub fn pubkey(&self) -> CourierResult<Pubkey> {
        self.keypair().map(|k| k.pubkey())
    }
}

/// Parse a hex-encoded 64-byte ed25519 secret key
fn parse_keypair(encoded: &str) -> Result<Keypair, String> {
    let bytes = hex::decode(encoded.trim())
        .map_err(|e| format!("Invalid private key encoding: {}", e))?;

    Keypair::from_bytes(&bytes).map_err(|e| format!("Invalid private key: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hex_encoded_keypair() {
        let keypair = Keypair::new();
        let encoded = hex::encode(keypair.to_bytes());

        let parsed = parse_keypair(&encoded).unwrap();
        assert_eq!(parsed.pubkey(), keypair.pubkey());
    }

    #[test]
    fn rejects_bad_encodings() {
        assert!(parse_keypair("not hex at all").is_err());
        // Valid hex, wrong length
        assert!(parse_keypair("deadbeef").is_err());
    }

    #[test]
    fn uninitialized_wallet_refuses_operations() {
        let wallet = Wallet::uninitialized();
        assert!(matches!(wallet.keypair(), Err(CourierError::Wallet(_))));
        assert!(wallet.pubkey().is_err());
    }

    #[test]
    fn missing_env_var_lands_in_failed_state() {
        let config = WalletConfig {
            private_key_env: "COURIER_TEST_KEY_THAT_IS_NOT_SET".to_string(),
        };
        let wallet = Wallet::load(&config);
        assert!(matches!(wallet.state, WalletState::Failed(_)));
        assert!(wallet.keypair().is_err());
    }
}
