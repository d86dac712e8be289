//! Solana JSON-RPC ledger adapter
//!
//! Wraps the nonblocking SDK client and classifies its errors into the
//! transport-level taxonomy the submitter's retry policy is written against.

use super::{LedgerError, LedgerRpc, SimulationOutcome};
use crate::config::RpcConfig;

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Ledger adapter backed by a Solana JSON-RPC endpoint
pub struct SolanaLedger {
    /// Nonblocking SDK client
    client: RpcClient,
    /// Deadline for the confirmation wait
    confirm_timeout: Duration,
    /// Interval between confirmation polls
    confirm_poll: Duration,
}

impl SolanaLedger {
    /// Create a new ledger adapter from RPC configuration
    pub fn new(config: &RpcConfig) -> Self {
        let commitment = match config.commitment.as_str() {
            "processed" => CommitmentConfig::processed(),
            "finalized" => CommitmentConfig::finalized(),
            _ => CommitmentConfig::confirmed(),
        };

        let client = RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            Duration::from_millis(config.request_timeout_ms),
            commitment,
        );

        debug!("Ledger adapter initialized for {}", config.url);

        Self {
            client,
            confirm_timeout: Duration::from_millis(config.confirm_timeout_ms),
            confirm_poll: Duration::from_millis(config.confirm_poll_ms),
        }
    }

    /// Decode wire bytes back into an SDK transaction
    fn decode(tx_bytes: &[u8]) -> Result<Transaction, LedgerError> {
        bincode::deserialize(tx_bytes).map_err(|e| LedgerError::Rejected {
            message: format!("malformed transaction bytes: {}", e),
        })
    }
}

/// Classify an SDK client error into the transport taxonomy
fn classify(error: ClientError) -> LedgerError {
    match error.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => LedgerError::Transport {
            message: error.to_string(),
        },
        ClientErrorKind::RpcError(_) | ClientErrorKind::TransactionError(_) => {
            LedgerError::Rejected {
                message: error.to_string(),
            }
        }
        _ => LedgerError::Transport {
            message: error.to_string(),
        },
    }
}

#[async_trait]
impl LedgerRpc for SolanaLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client.get_latest_blockhash().await.map_err(classify)
    }

    async fn simulate(&self, tx_bytes: &[u8]) -> Result<SimulationOutcome, LedgerError> {
        let tx = Self::decode(tx_bytes)?;

        let config = RpcSimulateTransactionConfig {
            sig_verify: true,
            ..RpcSimulateTransactionConfig::default()
        };

        let response = self
            .client
            .simulate_transaction_with_config(&tx, config)
            .await
            .map_err(classify)?;

        Ok(SimulationOutcome {
            err: response.value.err.map(|e| e.to_string()),
            logs: response.value.logs.unwrap_or_default(),
        })
    }

    async fn submit(&self, tx_bytes: &[u8]) -> Result<Signature, LedgerError> {
        let tx = Self::decode(tx_bytes)?;

        // Preflight is skipped: the submitter runs its own simulation step
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };

        self.client
            .send_transaction_with_config(&tx, config)
            .await
            .map_err(classify)
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<(), LedgerError> {
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            match self.client.confirm_transaction(signature).await {
                Ok(true) => {
                    debug!("Transaction {} confirmed", signature);
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Confirmation status check failed for {}: {}", signature, e);
                    return Err(classify(e));
                }
            }

            if Instant::now() >= deadline {
                return Err(LedgerError::Timeout {
                    operation: "transaction confirmation".to_string(),
                });
            }

            sleep(self.confirm_poll).await;
        }
    }

    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        self.client.get_balance(owner).await.map_err(classify)
    }

    async fn request_airdrop(
        &self,
        owner: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError> {
        self.client
            .request_airdrop(owner, lamports)
            .await
            .map_err(classify)
    }
}
