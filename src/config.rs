/// Sender configuration from environment variables
///
/// Controls the Bitcoin network, the block explorer endpoint, the default
/// fee rate and the sending wallet's private key.
/// Defaults to Testnet with the public SoChain v2 API.

use bitcoin::{NetworkKind, PrivateKey};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::SendError;

pub const DEFAULT_EXPLORER_URL: &str = "https://sochain.com/api/v2";
pub const DEFAULT_FEE_RATE_SAT_PER_BYTE: u64 = 20;
pub const DEFAULT_EXPLORER_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct SenderConfig {
    /// Bitcoin network type (for address and key validation)
    pub bitcoin_network: bitcoin::Network,
    /// Explorer API base URL
    pub explorer_url: String,
    /// Network code used in explorer paths ("BTC", "BTCTEST")
    pub explorer_network: String,
    /// Fee rate used when the request does not carry one
    pub fee_rate_sat_per_byte: u64,
    /// Timeout applied to every explorer call
    pub explorer_timeout: Duration,
    /// WIF-encoded key of the sending wallet
    pub sender_private_key: Option<String>,
}

impl SenderConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BITCOIN_NETWORK`: "testnet" (default), "bitcoin"/"mainnet", "signet" or "regtest"
    /// - `EXPLORER_URL`: explorer API endpoint (default: SoChain v2)
    /// - `EXPLORER_NETWORK`: network code in explorer paths (default derived from network)
    /// - `FEE_RATE_SAT_PER_BYTE`: default fee rate (default 20)
    /// - `EXPLORER_TIMEOUT_SECS`: outbound request timeout (default 30)
    /// - `BITCOIN_WALLET_PRIVATE_KEY`: WIF key of the sending wallet
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Testnet against SoChain (default)
    /// BITCOIN_WALLET_PRIVATE_KEY=cV... cargo run
    ///
    /// # Local explorer mock
    /// EXPLORER_URL=http://localhost:3001 cargo run
    /// ```
    pub fn from_env() -> Self {
        let network_str = env::var("BITCOIN_NETWORK")
            .unwrap_or_else(|_| "testnet".to_string())
            .to_lowercase();

        let bitcoin_network = parse_network(&network_str).unwrap_or_else(|| {
            log::warn!("Unknown network '{}', defaulting to Testnet", network_str);
            bitcoin::Network::Testnet
        });
        log::info!("Using {:?} network", bitcoin_network);

        let explorer_url = env::var("EXPLORER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string());
        log::info!("Explorer URL: {}", explorer_url);

        let explorer_network = env::var("EXPLORER_NETWORK")
            .map(|code| code.to_uppercase())
            .unwrap_or_else(|_| explorer_network_code(bitcoin_network).to_string());
        log::info!("Explorer network code: {}", explorer_network);

        let fee_rate_sat_per_byte = parse_positive_u64(
            "FEE_RATE_SAT_PER_BYTE",
            env::var("FEE_RATE_SAT_PER_BYTE").ok(),
            DEFAULT_FEE_RATE_SAT_PER_BYTE,
        );

        let explorer_timeout = Duration::from_secs(parse_positive_u64(
            "EXPLORER_TIMEOUT_SECS",
            env::var("EXPLORER_TIMEOUT_SECS").ok(),
            DEFAULT_EXPLORER_TIMEOUT_SECS,
        ));

        let sender_private_key = env::var("BITCOIN_WALLET_PRIVATE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if sender_private_key.is_none() {
            log::warn!("BITCOIN_WALLET_PRIVATE_KEY not set, send requests will fail");
        }

        Self {
            bitcoin_network,
            explorer_url,
            explorer_network,
            fee_rate_sat_per_byte,
            explorer_timeout,
            sender_private_key,
        }
    }

    /// Decode the configured sending key
    ///
    /// The key must be valid WIF and belong to the configured network kind.
    pub fn sender_credential(&self) -> Result<PrivateKey, SendError> {
        let wif = self.sender_private_key.as_deref().ok_or_else(|| {
            SendError::Credential("BITCOIN_WALLET_PRIVATE_KEY is not configured".to_string())
        })?;

        let private_key = PrivateKey::from_wif(wif.trim())
            .map_err(|e| SendError::Credential(format!("Invalid WIF private key: {}", e)))?;

        let expected = NetworkKind::from(self.bitcoin_network);
        if private_key.network != expected {
            return Err(SendError::Credential(format!(
                "Private key is for {:?}, configured network is {:?}",
                private_key.network, self.bitcoin_network
            )));
        }

        Ok(private_key)
    }
}

impl Default for SenderConfig {
    /// Default configuration (Testnet, SoChain)
    fn default() -> Self {
        Self {
            bitcoin_network: bitcoin::Network::Testnet,
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            explorer_network: "BTCTEST".to_string(),
            fee_rate_sat_per_byte: DEFAULT_FEE_RATE_SAT_PER_BYTE,
            explorer_timeout: Duration::from_secs(DEFAULT_EXPLORER_TIMEOUT_SECS),
            sender_private_key: None,
        }
    }
}

impl fmt::Debug for SenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderConfig")
            .field("bitcoin_network", &self.bitcoin_network)
            .field("explorer_url", &self.explorer_url)
            .field("explorer_network", &self.explorer_network)
            .field("fee_rate_sat_per_byte", &self.fee_rate_sat_per_byte)
            .field("explorer_timeout", &self.explorer_timeout)
            .field(
                "sender_private_key",
                &self.sender_private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn parse_network(value: &str) -> Option<bitcoin::Network> {
    match value {
        "testnet" | "" => Some(bitcoin::Network::Testnet),
        "bitcoin" | "mainnet" => Some(bitcoin::Network::Bitcoin),
        "signet" => Some(bitcoin::Network::Signet),
        "regtest" => Some(bitcoin::Network::Regtest),
        _ => None,
    }
}

/// SoChain only knows mainnet and testnet; every test network maps to BTCTEST.
fn explorer_network_code(network: bitcoin::Network) -> &'static str {
    match network {
        bitcoin::Network::Bitcoin => "BTC",
        _ => "BTCTEST",
    }
}

fn parse_positive_u64(name: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => {
                log::warn!("Invalid {} '{}', using default {}", name, raw, default);
                default
            }
        },
    }
}
