use serde::{Deserialize, Serialize};

use crate::bitcoin::BroadcastResult;

/// Body of `POST /bitcoin/send`
///
/// `recieverAddress` keeps the historical spelling of the public API;
/// `receiverAddress` is accepted too.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBitcoinRequest {
    pub sender_address: String,
    #[serde(rename = "recieverAddress", alias = "receiverAddress")]
    pub reciever_address: String,
    pub bitcoin_to_send: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate_sat_per_byte: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendBitcoinResponse {
    pub result: BroadcastResult,
}
