//! Ledger module - the external RPC collaborator boundary
//!
//! This module provides:
//! - The `LedgerRpc` trait consumed by the submitter and faucet
//! - Transport-level error classification decoupled from SDK error shapes
//! - The production Solana JSON-RPC adapter

pub mod rpc;

pub use rpc::SolanaLedger;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// Low-level errors surfaced by ledger backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("ledger rejected request: {message}")]
    Rejected { message: String },

    #[error("timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("ledger call cancelled")]
    Cancelled,
}

/// Dry-run result for a serialized transaction
#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    /// Program-level error, if the transaction would fail
    pub err: Option<String>,
    /// Program log output captured during the dry run
    pub logs: Vec<String>,
}

impl SimulationOutcome {
    /// Check if the dry run passed
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

/// Ledger RPC interface
///
/// All wire-level encoding and JSON-RPC framing belongs to implementations;
/// callers hand over bincode-serialized transaction bytes and opaque keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetch a fresh recent blockhash from the cluster
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Dry-run serialized transaction bytes against the ledger
    async fn simulate(&self, tx_bytes: &[u8]) -> Result<SimulationOutcome, LedgerError>;

    /// Submit serialized transaction bytes, returning the transaction signature
    async fn submit(&self, tx_bytes: &[u8]) -> Result<Signature, LedgerError>;

    /// Block until the transaction reaches the configured commitment
    async fn await_confirmation(&self, signature: &Signature) -> Result<(), LedgerError>;

    /// Get the lamport balance of an account
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError>;

    /// Request faucet funds for an account (devnet/testnet only)
    async fn request_airdrop(&self, owner: &Pubkey, lamports: u64)
        -> Result<Signature, LedgerError>;
}
