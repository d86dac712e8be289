//! sol-courier - reliable SOL transfer submission
//!
//! Builds a transfer instruction, fetches a fresh recent blockhash, signs,
//! simulates, submits, and retries transient failures with a newly fetched
//! blockhash up to a bounded attempt count, then waits for confirmation and
//! reports the resulting balance.

use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod config;
mod error;
mod faucet;
mod ledger;
mod tx;
mod wallet;

use config::Settings;
use error::CourierError;
use faucet::Faucet;
use ledger::{LedgerRpc, SolanaLedger};
use tx::{TransactionSubmitter, TransferRequest};
use wallet::Wallet;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting sol-courier v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!("Submitting via {}", settings.rpc.url);

    // Load the signing identity
    let wallet = Wallet::load(&settings.wallet);
    let sender = wallet.pubkey()?;

    let ledger: Arc<dyn LedgerRpc> = Arc::new(SolanaLedger::new(&settings.rpc));

    // Make sure the fee payer holds lamports before spending attempts
    let faucet = Faucet::new(ledger.clone(), settings.faucet.clone());
    let balance = faucet.ensure_funded(&sender).await?;
    info!("Sender {} holds {} lamports", sender, balance);

    let recipient: Pubkey = match &settings.transfer.recipient {
        Some(address) => address
            .parse()
            .map_err(|e| CourierError::Config(format!("Invalid recipient address: {}", e)))?,
        None => sender,
    };
    let request = TransferRequest::new(sender, recipient, settings.transfer.amount_lamports);
    info!(
        "Transferring {} lamports from {} to {}",
        request.lamports, request.sender, request.recipient
    );

    let submitter = TransactionSubmitter::new(ledger.clone(), settings.courier.clone());

    // Dropping the submission future abandons further retries; a transaction
    // that already reached the ledger is not rolled back and must be
    // re-queried out of band
    let signature = tokio::select! {
        result = submitter.submit(wallet.keypair()?, &request) => result?,
        _ = shutdown_signal() => {
            error!("Shutdown signal received, abandoning submission");
            return Err(CourierError::Cancelled.into());
        }
    };

    info!("Transfer confirmed with signature: {}", signature);

    // Refresh the balance now that the transfer landed
    match ledger.get_balance(&sender).await {
        Ok(balance) => info!("Final balance: {} lamports", balance),
        Err(e) => error!("Balance refresh failed: {}", e),
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sol_courier=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
