//! Transfer instruction and envelope assembly
//!
//! Pure data transformation: no I/O happens here. The envelope gets a fresh
//! blockhash from the submitter on every attempt.

use crate::error::{CourierError, CourierResult};

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

/// One transfer to submit: sender pays the fee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub lamports: u64,
}

impl TransferRequest {
    /// Create a transfer request; recipient may equal sender (self-transfer)
    pub fn new(sender: Pubkey, recipient: Pubkey, lamports: u64) -> Self {
        Self {
            sender,
            recipient,
            lamports,
        }
    }
}

/// Build the system-program transfer instruction for a request
pub fn transfer_instruction(request: &TransferRequest) -> Instruction {
    system_instruction::transfer(&request.sender, &request.recipient, request.lamports)
}

/// Assemble and sign a transaction envelope around one instruction
///
/// Signing is deterministic given the identity and envelope; a failure here
/// means the identity cannot produce the required signature and is not a
/// transient condition.
pub fn sign_envelope(
    instruction: Instruction,
    fee_payer: &Pubkey,
    blockhash: Hash,
    keypair: &Keypair,
) -> CourierResult<Transaction> {
    let message = Message::new(&[instruction], Some(fee_payer));
    let mut transaction = Transaction::new_unsigned(message);

    transaction
        .try_sign(&[keypair], blockhash)
        .map_err(|e| CourierError::Signing(e.to_string()))?;

    Ok(transaction)
}

/// Serialize a signed transaction to the wire bytes the RPC client expects
pub fn serialize_wire(transaction: &Transaction) -> CourierResult<Vec<u8>> {
    bincode::serialize(transaction)
        .map_err(|e| CourierError::Internal(format!("transaction serialization failed: {}", e)))
}
