//! Mapping of explorer UTXOs into spendable transaction inputs

use bitcoin::{Amount, Denomination, OutPoint, ScriptBuf, Txid};
use std::str::FromStr;

use super::explorer::{UnspentOutput, UnspentOutputs};
use crate::error::SendError;

/// A UTXO ready to be spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub satoshis: Amount,
    pub script: ScriptBuf,
    pub address: String,
    pub txid: Txid,
    pub output_index: u32,
}

impl TransactionInput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.output_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInputSet {
    pub inputs: Vec<TransactionInput>,
    pub total_amount_available: Amount,
    pub input_count: usize,
}

impl TransactionInputSet {
    /// Fail if the explorer listed any input under an address other than `owner`
    pub fn ensure_owned_by(&self, owner: &str) -> Result<(), SendError> {
        match self.inputs.iter().find(|input| input.address != owner) {
            Some(input) => Err(SendError::Explorer(format!(
                "UTXO {} belongs to {}, expected {}",
                input.outpoint(),
                input.address,
                owner
            ))),
            None => Ok(()),
        }
    }
}

/// Convert every unspent output into an input, in explorer order
pub fn build_inputs_from_unspent_outputs(
    utxos: &UnspentOutputs,
) -> Result<TransactionInputSet, SendError> {
    let mut inputs = Vec::with_capacity(utxos.txs.len());
    let mut total_amount_available = Amount::ZERO;

    for utxo in &utxos.txs {
        let input = to_transaction_input(utxo, &utxos.address)?;

        total_amount_available = total_amount_available
            .checked_add(input.satoshis)
            .ok_or_else(|| SendError::Explorer("UTXO total overflows".to_string()))?;

        log::debug!(
            "Input {}:{} worth {} sats",
            input.txid,
            input.output_index,
            input.satoshis.to_sat()
        );
        inputs.push(input);
    }

    Ok(TransactionInputSet {
        input_count: inputs.len(),
        inputs,
        total_amount_available,
    })
}

fn to_transaction_input(utxo: &UnspentOutput, address: &str) -> Result<TransactionInput, SendError> {
    let satoshis = Amount::from_str_in(utxo.value.trim(), Denomination::Bitcoin).map_err(|e| {
        SendError::Explorer(format!("Invalid UTXO value '{}': {}", utxo.value, e))
    })?;

    let txid = Txid::from_str(&utxo.txid)
        .map_err(|e| SendError::Explorer(format!("Invalid UTXO txid '{}': {}", utxo.txid, e)))?;

    let script_bytes = hex::decode(&utxo.script_hex).map_err(|e| {
        SendError::Explorer(format!("Invalid UTXO script '{}': {}", utxo.script_hex, e))
    })?;

    Ok(TransactionInput {
        satoshis,
        script: ScriptBuf::from_bytes(script_bytes),
        address: address.to_string(),
        txid,
        output_index: utxo.output_no,
    })
}
