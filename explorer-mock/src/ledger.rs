/// In-memory UTXO ledger backing the mock explorer
///
/// Holds funded outputs per address, applies broadcast transactions by
/// removing the outpoints they spend, and keeps counters for tests.

use bitcoin::consensus::deserialize;
use bitcoin::Transaction;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::types::*;

const DEFAULT_CONFIRMATIONS: u64 = 6;
const MOCK_TIME: u64 = 1_700_000_000;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] bitcoin::consensus::encode::Error),

    #[error("Missing inputs: {0}")]
    MissingInput(String),

    #[error("Output already funded: {0}")]
    DuplicateOutput(String),
}

#[derive(Default)]
struct LedgerState {
    utxos: HashMap<String, Vec<UnspentTx>>,
    broadcasts: Vec<RecordedBroadcast>,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    request_count: AtomicUsize,
    unavailable: AtomicBool,
    reject_broadcasts: AtomicBool,
    fail_lookups: AtomicBool,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a spendable output to `address`
    pub fn fund(&self, request: FundRequest) -> Result<UnspentTx, LedgerError> {
        let mut state = self.state();
        let utxos = state.utxos.entry(request.address.clone()).or_default();

        if utxos
            .iter()
            .any(|u| u.txid == request.txid && u.output_no == request.output_no)
        {
            return Err(LedgerError::DuplicateOutput(format!(
                "{}:{}",
                request.txid, request.output_no
            )));
        }

        let utxo = UnspentTx {
            txid: request.txid,
            output_no: request.output_no,
            script_asm: String::new(),
            script_hex: request.script_hex,
            value: format_btc(request.value_sats),
            confirmations: request.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS),
            time: MOCK_TIME,
        };
        utxos.push(utxo.clone());

        log::debug!(
            "Funded {} with {}:{} ({} BTC)",
            request.address,
            utxo.txid,
            utxo.output_no,
            utxo.value
        );
        Ok(utxo)
    }

    /// Unspent outputs of `address`, in funding order
    pub fn unspent(&self, address: &str) -> Vec<UnspentTx> {
        self.state().utxos.get(address).cloned().unwrap_or_default()
    }

    /// Decode and apply a raw transaction, returning its txid
    ///
    /// Every input must spend a known output; nothing is changed otherwise.
    pub fn broadcast(&self, network: &str, tx_hex: &str) -> Result<String, LedgerError> {
        let bytes = hex::decode(tx_hex.trim())?;
        let tx: Transaction = deserialize(&bytes)?;

        let mut state = self.state();

        for txin in &tx.input {
            let outpoint = txin.previous_output;
            let known = state.utxos.values().flatten().any(|u| {
                u.txid == outpoint.txid.to_string() && u.output_no == outpoint.vout
            });
            if !known {
                return Err(LedgerError::MissingInput(outpoint.to_string()));
            }
        }

        for txin in &tx.input {
            let outpoint = txin.previous_output;
            for utxos in state.utxos.values_mut() {
                utxos.retain(|u| {
                    !(u.txid == outpoint.txid.to_string() && u.output_no == outpoint.vout)
                });
            }
        }

        let txid = tx.compute_txid().to_string();
        state.broadcasts.push(RecordedBroadcast {
            network: network.to_string(),
            txid: txid.clone(),
            tx_hex: tx_hex.trim().to_string(),
        });

        log::info!("Accepted transaction {} ({} inputs)", txid, tx.input.len());
        Ok(txid)
    }

    pub fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.state().broadcasts.clone()
    }

    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of explorer API requests served (mock helpers excluded)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Make explorer endpoints answer HTTP 500
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::SeqCst)
    }

    /// Make `send_tx` answer HTTP 400 with a `fail` envelope
    pub fn set_reject_broadcasts(&self, reject: bool) {
        self.reject_broadcasts.store(reject, Ordering::SeqCst);
    }

    pub fn rejects_broadcasts(&self) -> bool {
        self.reject_broadcasts.load(Ordering::SeqCst)
    }

    /// Make `get_tx_unspent` answer HTTP 200 with a `fail` envelope
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fails_lookups(&self) -> bool {
        self.fail_lookups.load(Ordering::SeqCst)
    }
}
