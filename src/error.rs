//! Error types for sol-courier

use thiserror::Error;

/// Main error type for the courier
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to fetch recent blockhash: {message}")]
    BlockhashFetch { message: String },

    #[error("Simulation rejected transaction: {reason}")]
    SimulationRejected { reason: String },

    #[error("Ledger rejected transaction: {reason}")]
    SubmissionRejected { reason: String },

    #[error("Confirmation failed for {signature}: {reason}")]
    ConfirmationFailed { signature: String, reason: String },

    #[error("Insufficient funds: {reason}")]
    InsufficientFunds { reason: String },

    #[error("All {attempts} submission attempts exhausted")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        last: Box<CourierError>,
    },

    #[error("Faucet error: {0}")]
    Faucet(String),

    #[error("Ledger query failed: {0}")]
    Rpc(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Check if error is retryable within a submission's attempt budget
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CourierError::BlockhashFetch { .. }
                | CourierError::SimulationRejected { .. }
                | CourierError::SubmissionRejected { .. }
        )
    }

    /// Check if error terminates a submission regardless of remaining attempts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CourierError::Signing(_)
                | CourierError::ConfirmationFailed { .. }
                | CourierError::InsufficientFunds { .. }
                | CourierError::Cancelled
        )
    }
}

/// Result type for courier operations
pub type CourierResult<T> = Result<T, CourierError>;
