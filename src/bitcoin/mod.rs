//! Bitcoin protocol operations
//!
//! - Explorer access (UTXO lookup, broadcast)
//! - Input mapping and fee estimation
//! - Transaction building and signing
//! - Bitcoin sending

pub mod explorer;
pub mod fee;
pub mod inputs;
pub mod send;
pub mod transaction;

// Re-export main types
pub use explorer::{BroadcastResult, ExplorerClient, UnspentOutput, UnspentOutputs};
pub use inputs::{build_inputs_from_unspent_outputs, TransactionInput, TransactionInputSet};
pub use send::{send_bitcoin, validate_send_request, SendRequest};
pub use transaction::{serialize_transaction, TransactionBuilder};
