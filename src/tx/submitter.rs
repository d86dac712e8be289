//! Transaction submitter with bounded retry and fresh-blockhash rotation
//!
//! One submission is strictly sequential: every retry follows the previous
//! attempt's terminal outcome, and every retry fetches a new blockhash. The
//! attempt counter is the sole termination guard; the delay between attempts
//! is fixed, not exponential.

use super::builder::{self, TransferRequest};
use crate::config::CourierConfig;
use crate::error::{CourierError, CourierResult};
use crate::ledger::{LedgerError, LedgerRpc};

use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Terminal outcome of one submission attempt
enum AttemptOutcome {
    /// Submitted and confirmed at the configured commitment
    Confirmed(Signature),
    /// Failed transiently; counts toward the attempt budget
    Retry(CourierError),
    /// Failed in a way no further attempt can fix
    Fatal(CourierError),
}

/// Submits transfers with comprehensive retry and error handling
pub struct TransactionSubmitter {
    /// Ledger collaborator
    ledger: Arc<dyn LedgerRpc>,
    /// Retry tuning
    config: CourierConfig,
}

impl TransactionSubmitter {
    /// Create a new transaction submitter
    pub fn new(ledger: Arc<dyn LedgerRpc>, config: CourierConfig) -> Self {
        Self { ledger, config }
    }

    /// Submit a transfer, retrying transient failures up to the attempt bound
    ///
    /// Returns the confirmed transaction signature. The caller owns refreshing
    /// any cached balance afterwards.
    pub async fn submit(
        &self,
        keypair: &Keypair,
        request: &TransferRequest,
    ) -> CourierResult<Signature> {
        // Pure data transformation, done once; the envelope around it is
        // rebuilt per attempt with a fresh blockhash
        let instruction = builder::transfer_instruction(request);

        let max_attempts = self.config.max_attempts;
        let mut last_error: Option<CourierError> = None;

        for attempt in 1..=max_attempts {
            match self
                .run_attempt(attempt, &instruction, request, keypair)
                .await
            {
                AttemptOutcome::Confirmed(signature) => {
                    info!(
                        "Transfer confirmed: {} (attempt {}/{})",
                        signature, attempt, max_attempts
                    );
                    return Ok(signature);
                }
                AttemptOutcome::Fatal(error) => return Err(error),
                AttemptOutcome::Retry(error) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, error);
                    last_error = Some(error);
                }
            }

            // Fixed delay between attempts
            if attempt < max_attempts {
                sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }
        }

        Err(CourierError::AttemptsExhausted {
            attempts: max_attempts,
            last: Box::new(last_error.unwrap_or_else(|| {
                CourierError::Internal("no attempt outcome recorded".to_string())
            })),
        })
    }

    /// Run one full attempt: fetch, assemble, sign, simulate, submit, confirm
    async fn run_attempt(
        &self,
        attempt: u32,
        instruction: &Instruction,
        request: &TransferRequest,
        keypair: &Keypair,
    ) -> AttemptOutcome {
        // Fresh blockhash every attempt, never the previous one
        let blockhash = match self.ledger.latest_blockhash().await {
            Ok(hash) => hash,
            Err(LedgerError::Cancelled) => return AttemptOutcome::Fatal(CourierError::Cancelled),
            Err(e) => {
                return AttemptOutcome::Retry(CourierError::BlockhashFetch {
                    message: e.to_string(),
                })
            }
        };
        debug!("Attempt {} using blockhash {}", attempt, blockhash);

        // Signing failure indicates a corrupt identity, not a transient
        // network condition
        let transaction = match builder::sign_envelope(
            instruction.clone(),
            &request.sender,
            blockhash,
            keypair,
        ) {
            Ok(tx) => tx,
            Err(e) => return AttemptOutcome::Fatal(e),
        };

        let wire = match builder::serialize_wire(&transaction) {
            Ok(bytes) => bytes,
            Err(e) => return AttemptOutcome::Fatal(e),
        };

        // Dry run before spending the submit
        if self.config.simulate_before_submit {
            match self.ledger.simulate(&wire).await {
                Ok(outcome) => {
                    if let Some(reason) = outcome.err {
                        for log in &outcome.logs {
                            debug!("Simulation log: {}", log);
                        }
                        if is_insufficient_funds(&reason) {
                            return AttemptOutcome::Fatal(CourierError::InsufficientFunds {
                                reason,
                            });
                        }
                        return AttemptOutcome::Retry(CourierError::SimulationRejected {
                            reason,
                        });
                    }
                }
                Err(LedgerError::Cancelled) => {
                    return AttemptOutcome::Fatal(CourierError::Cancelled)
                }
                Err(e) => {
                    return AttemptOutcome::Retry(CourierError::SimulationRejected {
                        reason: e.to_string(),
                    })
                }
            }
        }

        let signature = match self.ledger.submit(&wire).await {
            Ok(signature) => signature,
            Err(LedgerError::Cancelled) => return AttemptOutcome::Fatal(CourierError::Cancelled),
            Err(e) => {
                let reason = e.to_string();
                if is_insufficient_funds(&reason) {
                    return AttemptOutcome::Fatal(CourierError::InsufficientFunds { reason });
                }
                return AttemptOutcome::Retry(CourierError::SubmissionRejected { reason });
            }
        };
        info!("Transaction submitted: {} (attempt {})", signature, attempt);

        // Confirmation failure is terminal at this layer; the transaction may
        // still land, and re-querying its status is the caller's concern
        match self.ledger.await_confirmation(&signature).await {
            Ok(()) => AttemptOutcome::Confirmed(signature),
            Err(LedgerError::Cancelled) => AttemptOutcome::Fatal(CourierError::Cancelled),
            Err(e) => AttemptOutcome::Fatal(CourierError::ConfirmationFailed {
                signature: signature.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Check if a rejection reason names a substantive shortfall rather than a
/// stale anchor; these short-circuit the retry loop
fn is_insufficient_funds(reason: &str) -> bool {
    let lower = reason.to_ascii_lowercase();
    lower.contains("insufficient funds") || lower.contains("insufficient lamports")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MockLedgerRpc, SimulationOutcome};

    use solana_sdk::hash::Hash;
    use solana_sdk::signer::Signer;
    use solana_sdk::transaction::Transaction;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn config(max_attempts: u32, simulate: bool) -> CourierConfig {
        CourierConfig {
            max_attempts,
            retry_delay_ms: 1,
            simulate_before_submit: simulate,
        }
    }

    fn self_transfer(keypair: &Keypair) -> TransferRequest {
        TransferRequest::new(keypair.pubkey(), keypair.pubkey(), 1_000)
    }

    fn transport_error() -> LedgerError {
        LedgerError::Transport {
            message: "connection reset".to_string(),
        }
    }

    fn submitter(mock: MockLedgerRpc, config: CourierConfig) -> TransactionSubmitter {
        TransactionSubmitter::new(Arc::new(mock), config)
    }

    #[tokio::test]
    async fn exhausts_attempts_when_every_blockhash_fetch_fails() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(3)
            .returning(|| Err(transport_error()));
        mock.expect_simulate().times(0);
        mock.expect_submit().times(0);

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, true)).submit(&keypair, &request).await;

        match result {
            Err(CourierError::AttemptsExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, CourierError::BlockhashFetch { .. }));
            }
            other => panic!("expected AttemptsExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn each_attempt_embeds_a_fresh_blockhash() {
        let hashes: Vec<Hash> = (0..3).map(|_| Hash::new_unique()).collect();
        let expected = hashes.clone();
        let fetches = Arc::new(AtomicUsize::new(0));
        let submitted: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));

        let mut mock = MockLedgerRpc::new();
        {
            let fetches = fetches.clone();
            mock.expect_latest_blockhash().times(3).returning(move || {
                let index = fetches.fetch_add(1, Ordering::SeqCst);
                Ok(hashes[index])
            });
        }
        {
            let submitted = submitted.clone();
            // Transient rejection on attempts 1-2, accepted on attempt 3
            mock.expect_submit().times(3).returning(move |bytes| {
                let mut calls = submitted.lock().unwrap();
                calls.push(bytes.to_vec());
                if calls.len() < 3 {
                    Err(transport_error())
                } else {
                    Ok(Signature::new_unique())
                }
            });
        }
        mock.expect_await_confirmation()
            .times(1)
            .returning(|_| Ok(()));

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, false)).submit(&keypair, &request).await;

        assert!(result.is_ok());
        assert_eq!(fetches.load(Ordering::SeqCst), 3);

        let submitted = submitted.lock().unwrap();
        let embedded: Vec<Hash> = submitted
            .iter()
            .map(|bytes| {
                let tx: Transaction = bincode::deserialize(bytes).unwrap();
                tx.message.recent_blockhash
            })
            .collect();
        assert_eq!(embedded, expected);
        assert_ne!(embedded[0], embedded[1]);
        assert_ne!(embedded[1], embedded[2]);
    }

    #[tokio::test]
    async fn signing_failure_terminates_with_zero_submits() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(1)
            .returning(|| Ok(Hash::new_unique()));
        mock.expect_simulate().times(0);
        mock.expect_submit().times(0);

        // The identity cannot sign for this sender
        let keypair = Keypair::new();
        let request = self_transfer(&Keypair::new());
        let result = submitter(mock, config(3, true)).submit(&keypair, &request).await;

        assert!(matches!(result, Err(CourierError::Signing(_))));
    }

    #[tokio::test]
    async fn simulation_rejection_skips_submit_and_proceeds_to_next_attempt() {
        let simulations = Arc::new(AtomicUsize::new(0));

        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(2)
            .returning(|| Ok(Hash::new_unique()));
        {
            let simulations = simulations.clone();
            mock.expect_simulate().times(2).returning(move |_| {
                if simulations.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(SimulationOutcome {
                        err: Some("BlockhashNotFound".to_string()),
                        logs: vec![],
                    })
                } else {
                    Ok(SimulationOutcome::default())
                }
            });
        }
        mock.expect_submit()
            .times(1)
            .returning(|_| Ok(Signature::new_unique()));
        mock.expect_await_confirmation()
            .times(1)
            .returning(|_| Ok(()));

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, true)).submit(&keypair, &request).await;

        assert!(result.is_ok());
        assert_eq!(simulations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_during_confirmation_propagates_as_cancelled() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(1)
            .returning(|| Ok(Hash::new_unique()));
        mock.expect_submit()
            .times(1)
            .returning(|_| Ok(Signature::new_unique()));
        mock.expect_await_confirmation()
            .times(1)
            .returning(|_| Err(LedgerError::Cancelled));

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, false)).submit(&keypair, &request).await;

        assert!(matches!(result, Err(CourierError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_blockhash_fetch_aborts_without_retry() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(1)
            .returning(|| Err(LedgerError::Cancelled));
        mock.expect_submit().times(0);

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, false)).submit(&keypair, &request).await;

        assert!(matches!(result, Err(CourierError::Cancelled)));
    }

    #[tokio::test]
    async fn confirmation_timeout_is_terminal_without_retry() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(1)
            .returning(|| Ok(Hash::new_unique()));
        mock.expect_submit()
            .times(1)
            .returning(|_| Ok(Signature::new_unique()));
        mock.expect_await_confirmation().times(1).returning(|_| {
            Err(LedgerError::Timeout {
                operation: "transaction confirmation".to_string(),
            })
        });

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(1, false)).submit(&keypair, &request).await;

        assert!(matches!(
            result,
            Err(CourierError::ConfirmationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn insufficient_funds_simulation_short_circuits() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(1)
            .returning(|| Ok(Hash::new_unique()));
        mock.expect_simulate().times(1).returning(|_| {
            Ok(SimulationOutcome {
                err: Some("Transfer: insufficient lamports 0, need 1000".to_string()),
                logs: vec![],
            })
        });
        mock.expect_submit().times(0);

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(3, true)).submit(&keypair, &request).await;

        assert!(matches!(
            result,
            Err(CourierError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn exhaustion_reports_the_last_submission_rejection() {
        let mut mock = MockLedgerRpc::new();
        mock.expect_latest_blockhash()
            .times(2)
            .returning(|| Ok(Hash::new_unique()));
        mock.expect_submit().times(2).returning(|_| {
            Err(LedgerError::Rejected {
                message: "node is behind".to_string(),
            })
        });
        mock.expect_await_confirmation().times(0);

        let keypair = Keypair::new();
        let request = self_transfer(&keypair);
        let result = submitter(mock, config(2, false)).submit(&keypair, &request).await;

        match result {
            Err(CourierError::AttemptsExhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, CourierError::SubmissionRejected { .. }));
            }
            other => panic!("expected AttemptsExhausted, got {:?}", other),
        }
    }
}
