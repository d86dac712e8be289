//! Devnet faucet funding
//!
//! Airdrops land asynchronously, so a request is followed by a bounded number
//! of balance polls at a fixed interval.

use crate::config::FaucetConfig;
use crate::error::{CourierError, CourierResult};
use crate::ledger::LedgerRpc;

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Tops up an account from the cluster faucet when it is empty
pub struct Faucet {
    /// Ledger collaborator
    ledger: Arc<dyn LedgerRpc>,
    /// Faucet tuning
    config: FaucetConfig,
}

impl Faucet {
    /// Create a new faucet helper
    pub fn new(ledger: Arc<dyn LedgerRpc>, config: FaucetConfig) -> Self {
        Self { ledger, config }
    }

    /// Ensure the account holds lamports, airdropping if it is empty
    ///
    /// Returns the account balance once funding is visible.
    pub async fn ensure_funded(&self, owner: &Pubkey) -> CourierResult<u64> {
        let balance = self
            .ledger
            .get_balance(owner)
            .await
            .map_err(|e| CourierError::Rpc(e.to_string()))?;

        if balance > 0 || !self.config.enabled {
            return Ok(balance);
        }

        info!(
            "No lamports detected for {}, requesting {} from faucet",
            owner, self.config.airdrop_lamports
        );

        let signature = self
            .ledger
            .request_airdrop(owner, self.config.airdrop_lamports)
            .await
            .map_err(|e| CourierError::Faucet(e.to_string()))?;
        info!("Airdrop requested with signature: {}", signature);

        // The airdrop is its own transaction; poll until it lands
        for attempt in 1..=self.config.poll_attempts {
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;

            let balance = self
                .ledger
                .get_balance(owner)
                .await
                .map_err(|e| CourierError::Rpc(e.to_string()))?;
            if balance > 0 {
                info!("Airdrop confirmed, balance is {} lamports", balance);
                return Ok(balance);
            }

            warn!(
                "Airdrop not visible yet (poll {}/{})",
                attempt, self.config.poll_attempts
            );
        }

        Err(CourierError::Faucet(format!(
            "airdrop {} not confirmed after {} polls",
            signature, self.config.poll_attempts
        )))
    }
}
