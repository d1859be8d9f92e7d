//! Block explorer client (SoChain v2 wire format)
//!
//! Two calls are used: listing the unspent outputs of an address and
//! broadcasting a raw transaction. Every failure is returned to the caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SendError;

const STATUS_SUCCESS: &str = "success";

/// Envelope wrapping every explorer response
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerEnvelope<T> {
    pub status: String,
    pub data: Option<T>,
}

/// Unspent output as returned by `get_tx_unspent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnspentOutput {
    pub txid: String,
    pub output_no: u32,
    pub script_hex: String,
    /// BTC amount as a decimal string, e.g. "0.01000000"
    pub value: String,
    #[serde(default)]
    pub confirmations: u64,
    #[serde(default)]
    pub script_asm: Option<String>,
    #[serde(default)]
    pub time: Option<u64>,
}

/// Payload of `get_tx_unspent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnspentOutputs {
    pub network: String,
    pub address: String,
    pub txs: Vec<UnspentOutput>,
}

#[derive(Debug, Serialize)]
struct BroadcastBody<'a> {
    tx_hex: &'a str,
}

/// Payload of `send_tx`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastResult {
    pub network: String,
    pub txid: String,
}

#[derive(Clone)]
pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExplorerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SendError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the unspent outputs of `address` on the explorer `network`
    pub async fn fetch_unspent_outputs(
        &self,
        address: &str,
        network: &str,
    ) -> Result<UnspentOutputs, SendError> {
        let url = format!("{}/get_tx_unspent/{}/{}", self.base_url, network, address);
        log::debug!("Fetching UTXOs: {}", url);

        let response = self.client.get(&url).send().await?;
        let utxos: UnspentOutputs = read_envelope(response, "UTXO lookup").await?;

        log::info!(
            "Explorer returned {} UTXOs for {}",
            utxos.txs.len(),
            utxos.address
        );
        Ok(utxos)
    }

    /// Broadcast a serialized transaction and return the explorer's txid
    pub async fn broadcast_transaction(
        &self,
        tx_hex: &str,
        network: &str,
    ) -> Result<BroadcastResult, SendError> {
        let url = format!("{}/send_tx/{}", self.base_url, network);
        log::debug!("Broadcasting transaction to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&BroadcastBody { tx_hex })
            .send()
            .await?;

        read_envelope(response, "Broadcast").await
    }
}

async fn read_envelope<T>(response: reqwest::Response, operation: &str) -> Result<T, SendError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response.text().await?;

    if status.is_server_error() {
        return Err(SendError::Upstream(format!(
            "{} failed with HTTP {}: {}",
            operation, status, body
        )));
    }

    let envelope: ExplorerEnvelope<serde_json::Value> =
        serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                SendError::Explorer(format!("{} returned malformed JSON: {}", operation, e))
            } else {
                SendError::Explorer(format!("{} failed with HTTP {}: {}", operation, status, body))
            }
        })?;

    if !status.is_success() || envelope.status != STATUS_SUCCESS {
        let detail = envelope
            .data
            .map(|data| data.to_string())
            .unwrap_or_else(|| "no details".to_string());
        return Err(SendError::Explorer(format!(
            "{} rejected (HTTP {}, status '{}'): {}",
            operation, status, envelope.status, detail
        )));
    }

    let data = envelope
        .data
        .ok_or_else(|| SendError::Explorer(format!("{} response has no data", operation)))?;

    serde_json::from_value(data)
        .map_err(|e| SendError::Explorer(format!("{} returned unexpected data: {}", operation, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspent_outputs_deserialize() {
        let body = r#"{
            "status": "success",
            "data": {
                "network": "BTCTEST",
                "address": "mxVFsFW5N4mu1HPkxPttorvocvzeZ7KZyk",
                "txs": [{
                    "txid": "b1ab3e3eb1d8c9d4b1d6f0c5b6b2b7f7e0b66e4bd5a2e7ea8a8f1d9b0c4d5e6f",
                    "output_no": 1,
                    "script_asm": "OP_DUP OP_HASH160 ...",
                    "script_hex": "76a914ba27f99e007c7f605a8305e318c1abde3cd220ac88ac",
                    "value": "0.01000000",
                    "confirmations": 6,
                    "time": 1612345678
                }]
            }
        }"#;

        let envelope: ExplorerEnvelope<UnspentOutputs> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.status, "success");
        let data = envelope.data.unwrap();
        assert_eq!(data.txs.len(), 1);
        assert_eq!(data.txs[0].output_no, 1);
        assert_eq!(data.txs[0].value, "0.01000000");
    }

    #[test]
    fn test_minimal_unspent_output() {
        let body = r#"{"txid":"aa","output_no":0,"script_hex":"00","value":"1.0"}"#;
        let utxo: UnspentOutput = serde_json::from_str(body).unwrap();
        assert_eq!(utxo.confirmations, 0);
        assert!(utxo.script_asm.is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ExplorerClient::new("http://localhost:3001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
    }
}
