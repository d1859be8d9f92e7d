/// Send Manager - Orchestration Layer
///
/// Holds the configuration and explorer client shared by all requests and
/// runs the validate → credential → send pipeline.
use crate::api::types::{SendBitcoinRequest, SendBitcoinResponse};
use crate::bitcoin::{
    explorer::ExplorerClient,
    send::{send_bitcoin, validate_send_request, verify_sender_controls_address},
};
use crate::config::SenderConfig;
use crate::error::SendError;

pub struct SendManager {
    pub config: SenderConfig,
    explorer: ExplorerClient,
}

impl SendManager {
    pub fn new(config: SenderConfig) -> Result<Self, SendError> {
        let explorer = ExplorerClient::new(config.explorer_url.clone(), config.explorer_timeout)?;
        Ok(Self { config, explorer })
    }

    /// Create SendManager from environment configuration
    pub fn from_env() -> Result<Self, SendError> {
        Self::new(SenderConfig::from_env())
    }

    /// Validate, sign with the configured wallet key, and broadcast
    ///
    /// Every check that can fail without the network runs before the
    /// first explorer call.
    pub async fn send_bitcoin(
        &self,
        request: SendBitcoinRequest,
    ) -> Result<SendBitcoinResponse, SendError> {
        let network = self.config.bitcoin_network;
        let validated =
            validate_send_request(&request, network, self.config.fee_rate_sat_per_byte)?;

        let private_key = self.config.sender_credential()?;
        verify_sender_controls_address(&private_key, &validated.sender_address, network)?;

        let result = send_bitcoin(
            &self.explorer,
            &self.config.explorer_network,
            &validated,
            &private_key,
        )
        .await?;

        Ok(SendBitcoinResponse { result })
    }
}
