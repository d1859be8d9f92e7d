use bitcoin::blockdata::script::ScriptBuf;
use bitcoin::blockdata::transaction::{Transaction, TxIn, TxOut};
use bitcoin::blockdata::witness::Witness;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Sequence;
use bitcoin::{absolute, ecdsa, Address, Amount};
use bitcoin::{PrivateKey, PublicKey};

use super::inputs::TransactionInput;
use crate::error::SendError;

/// Outputs below this value are not relayed by default policy
pub const DUST_THRESHOLD_SATS: u64 = 546;

/// Unsigned two-output payment plus the bookkeeping needed to sign it
#[derive(Debug, Clone)]
pub struct UnsignedPayment {
    pub tx: Transaction,
    pub change: Amount,
    pub fee: Amount,
}

pub struct TransactionBuilder {
    secp: Secp256k1<All>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Build a payment to `to_address` with change back to `change_address`
    ///
    /// The caller has already checked that the inputs cover amount plus fee.
    pub fn build_payment_tx(
        &self,
        inputs: &[TransactionInput],
        to_address: &Address,
        amount: Amount,
        change_address: &Address,
        fee: Amount,
    ) -> Result<UnsignedPayment, SendError> {
        let total_input = inputs
            .iter()
            .try_fold(Amount::ZERO, |acc, input| acc.checked_add(input.satoshis))
            .ok_or_else(|| SendError::Transaction("Input total overflows".to_string()))?;

        let change = total_input
            .checked_sub(amount)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or_else(|| {
                SendError::InsufficientFunds(format!(
                    "Need {} sats (amount + fee), but only have {} sats",
                    amount.to_sat().saturating_add(fee.to_sat()),
                    total_input.to_sat()
                ))
            })?;

        let mut tx = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: inputs
                .iter()
                .map(|input| TxIn {
                    previous_output: input.outpoint(),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
                .collect(),
            output: vec![TxOut {
                value: amount,
                script_pubkey: to_address.script_pubkey(),
            }],
        };

        if change.to_sat() >= DUST_THRESHOLD_SATS {
            tx.output.push(TxOut {
                value: change,
                script_pubkey: change_address.script_pubkey(),
            });
        } else if change > Amount::ZERO {
            log::warn!(
                "Change of {} sats is below dust threshold, leaving it to the miner",
                change.to_sat()
            );
        }

        Ok(UnsignedPayment { tx, change, fee })
    }

    /// Sign every input with `private_key`
    ///
    /// P2PKH inputs get a scriptSig, P2WPKH inputs a witness. Inputs must be
    /// in the same order as the transaction's inputs.
    pub fn sign_transaction(
        &self,
        mut tx: Transaction,
        inputs: &[TransactionInput],
        private_key: &PrivateKey,
    ) -> Result<Transaction, SendError> {
        if tx.input.len() != inputs.len() {
            return Err(SendError::Transaction(format!(
                "Transaction has {} inputs but {} UTXOs were supplied",
                tx.input.len(),
                inputs.len()
            )));
        }

        let public_key = PublicKey::from_private_key(&self.secp, private_key);
        let sighash_type = EcdsaSighashType::All;

        let mut unlocks = Vec::with_capacity(inputs.len());
        {
            let mut sighash_cache = SighashCache::new(&tx);

            for (input_index, input) in inputs.iter().enumerate() {
                if tx.input[input_index].previous_output != input.outpoint() {
                    return Err(SendError::Transaction(format!(
                        "UTXO not found for input {}",
                        input_index
                    )));
                }

                let (digest, is_segwit) = if input.script.is_p2pkh() {
                    let sighash = sighash_cache
                        .legacy_signature_hash(input_index, &input.script, sighash_type.to_u32())
                        .map_err(|e| SendError::Transaction(e.to_string()))?;
                    (sighash.to_byte_array(), false)
                } else if input.script.is_p2wpkh() {
                    let sighash = sighash_cache
                        .p2wpkh_signature_hash(
                            input_index,
                            &input.script,
                            input.satoshis,
                            sighash_type,
                        )
                        .map_err(|e| SendError::Transaction(e.to_string()))?;
                    (sighash.to_byte_array(), true)
                } else {
                    return Err(SendError::Transaction(format!(
                        "Unsupported script type for input {}: {}",
                        input_index,
                        input.script.to_hex_string()
                    )));
                };

                let message = Message::from_digest(digest);
                let signature = ecdsa::Signature {
                    signature: self.secp.sign_ecdsa(&message, &private_key.inner),
                    sighash_type,
                };

                log::debug!("Signed input {} (segwit: {})", input_index, is_segwit);
                unlocks.push((signature, is_segwit));
            }
        }

        for (txin, (signature, is_segwit)) in tx.input.iter_mut().zip(unlocks) {
            if is_segwit {
                let mut witness = Witness::new();
                witness.push(signature.to_vec());
                witness.push(public_key.to_bytes());
                txin.witness = witness;
            } else {
                let push = PushBytesBuf::try_from(signature.to_vec())
                    .map_err(|e| SendError::Transaction(e.to_string()))?;
                txin.script_sig = Builder::new()
                    .push_slice(push)
                    .push_key(&public_key)
                    .into_script();
            }
        }

        Ok(tx)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Consensus-encode a transaction as hex for broadcasting
pub fn serialize_transaction(tx: &Transaction) -> String {
    bitcoin::consensus::encode::serialize_hex(tx)
}
