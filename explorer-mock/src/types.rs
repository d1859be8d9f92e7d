/// SoChain v2 API response types
///
/// These types match the SoChain v2 format so clients can consume them transparently.

use serde::{Deserialize, Serialize};

/// `{"status": "...", "data": ...}` wrapper used by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }

    pub fn fail(data: T) -> Self {
        Self {
            status: "fail".to_string(),
            data,
        }
    }
}

/// One unspent output from /get_tx_unspent/{network}/{address}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnspentTx {
    pub txid: String,
    pub output_no: u32,
    pub script_asm: String,
    pub script_hex: String,
    /// BTC amount with eight decimals
    pub value: String,
    pub confirmations: u64,
    pub time: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnspentTxData {
    pub network: String,
    pub address: String,
    pub txs: Vec<UnspentTx>,
}

/// Body of POST /send_tx/{network}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTxRequest {
    pub tx_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendTxData {
    pub network: String,
    pub txid: String,
}

/// Failure payload, mirrors SoChain's `{"status":"fail","data":{...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailData {
    pub message: String,
}

/// Body of POST /mock/fund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRequest {
    pub address: String,
    pub txid: String,
    pub output_no: u32,
    pub script_hex: String,
    pub value_sats: u64,
    #[serde(default)]
    pub confirmations: Option<u64>,
}

/// A transaction accepted by POST /send_tx, as recorded by the mock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedBroadcast {
    pub network: String,
    pub txid: String,
    pub tx_hex: String,
}

/// Format satoshis the way SoChain does ("0.01000000")
pub fn format_btc(sats: u64) -> String {
    format!("{}.{:08}", sats / 100_000_000, sats % 100_000_000)
}
