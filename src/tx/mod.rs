//! Transfer assembly and submission with bounded fresh-blockhash retry

mod builder;
mod submitter;

pub use builder::TransferRequest;
pub use submitter::TransactionSubmitter;
