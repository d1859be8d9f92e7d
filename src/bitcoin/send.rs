//! Bitcoin sending operations

use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Amount, CompressedPublicKey, Network, PrivateKey};
use std::str::FromStr;

use super::explorer::{BroadcastResult, ExplorerClient};
use super::fee::{calculate_total_fee, is_amount_sufficient, OUTPUT_COUNT};
use super::inputs::build_inputs_from_unspent_outputs;
use super::transaction::{serialize_transaction, TransactionBuilder};
use crate::api::types::SendBitcoinRequest;
use crate::error::SendError;

/// A validated send request
///
/// The signing key travels separately, see [`send_bitcoin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub sender_address: Address,
    pub receiver_address: Address,
    pub amount: Amount,
    pub fee_rate_sat_per_byte: u64,
}

/// Validate an API request against the configured network
///
/// Runs before any explorer call.
pub fn validate_send_request(
    request: &SendBitcoinRequest,
    network: Network,
    default_fee_rate: u64,
) -> Result<SendRequest, SendError> {
    let sender_address = parse_address("senderAddress", &request.sender_address, network)?;
    let receiver_address = parse_address("recieverAddress", &request.reciever_address, network)?;

    let btc = request.bitcoin_to_send;
    if !btc.is_finite() || btc <= 0.0 {
        return Err(SendError::InvalidInput(
            "bitcoinToSend must be a positive number".to_string(),
        ));
    }
    let amount = Amount::from_btc(btc)
        .map_err(|e| SendError::InvalidInput(format!("Invalid bitcoinToSend {}: {}", btc, e)))?;
    if amount == Amount::ZERO {
        return Err(SendError::InvalidInput(
            "bitcoinToSend is smaller than one satoshi".to_string(),
        ));
    }

    let fee_rate_sat_per_byte = match request.fee_rate_sat_per_byte {
        Some(0) => {
            return Err(SendError::InvalidInput(
                "feeRateSatPerByte must be greater than zero".to_string(),
            ))
        }
        Some(rate) => rate,
        None => default_fee_rate,
    };

    Ok(SendRequest {
        sender_address,
        receiver_address,
        amount,
        fee_rate_sat_per_byte,
    })
}

fn parse_address(field: &str, value: &str, network: Network) -> Result<Address, SendError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SendError::InvalidInput(format!("{} must not be empty", field)));
    }

    Address::from_str(value)
        .map_err(|e| SendError::InvalidInput(format!("Invalid {} '{}': {}", field, value, e)))?
        .require_network(network)
        .map_err(|e| {
            SendError::InvalidInput(format!("{} network mismatch '{}': {}", field, value, e))
        })
}

/// Check that `private_key` can sign for `address`
///
/// Only P2PKH and P2WPKH addresses of the key are accepted.
pub fn verify_sender_controls_address(
    private_key: &PrivateKey,
    address: &Address,
    network: Network,
) -> Result<(), SendError> {
    let secp = Secp256k1::new();
    let public_key = private_key.public_key(&secp);

    if Address::p2pkh(public_key, network) == *address {
        return Ok(());
    }

    if let Ok(compressed) = CompressedPublicKey::try_from(public_key) {
        if Address::p2wpkh(&compressed, network) == *address {
            return Ok(());
        }
    }

    Err(SendError::InvalidInput(format!(
        "senderAddress {} is not controlled by the configured wallet key",
        address
    )))
}

/// Send Bitcoin from the request's sender address
///
/// Fetches the sender's UTXOs, spends all of them into a payment plus
/// change back to the sender, signs with `private_key` and broadcasts.
pub async fn send_bitcoin(
    explorer: &ExplorerClient,
    explorer_network: &str,
    request: &SendRequest,
    private_key: &PrivateKey,
) -> Result<BroadcastResult, SendError> {
    log::info!(
        "Sending {} sats from {} to {}",
        request.amount.to_sat(),
        request.sender_address,
        request.receiver_address
    );

    let sender = request.sender_address.to_string();
    let utxos = explorer
        .fetch_unspent_outputs(&sender, explorer_network)
        .await?;

    let input_set = build_inputs_from_unspent_outputs(&utxos)?;
    input_set.ensure_owned_by(&sender)?;

    let fee = calculate_total_fee(
        input_set.input_count,
        OUTPUT_COUNT,
        request.fee_rate_sat_per_byte,
    );

    if !is_amount_sufficient(input_set.total_amount_available, request.amount, fee) {
        return Err(SendError::InsufficientFunds(format!(
            "Balance too low for transaction. Available: {} sats, needed: {} sats (including {} sats fee)",
            input_set.total_amount_available.to_sat(),
            request.amount.to_sat().saturating_add(fee.to_sat()),
            fee.to_sat()
        )));
    }

    log::debug!(
        "{} inputs, {} sats available, fee {} sats at {} sat/byte",
        input_set.input_count,
        input_set.total_amount_available.to_sat(),
        fee.to_sat(),
        request.fee_rate_sat_per_byte
    );

    let builder = TransactionBuilder::new();
    let payment = builder.build_payment_tx(
        &input_set.inputs,
        &request.receiver_address,
        request.amount,
        &request.sender_address,
        fee,
    )?;
    log::debug!(
        "Payment built: {} outputs, change {} sats, fee {} sats",
        payment.tx.output.len(),
        payment.change.to_sat(),
        payment.fee.to_sat()
    );
    let signed_tx = builder.sign_transaction(payment.tx, &input_set.inputs, private_key)?;

    let tx_hex = serialize_transaction(&signed_tx);
    log::debug!("Signed transaction {}: {}", signed_tx.compute_txid(), tx_hex);

    let result = explorer
        .broadcast_transaction(&tx_hex, explorer_network)
        .await?;
    log::info!("Bitcoin sent - txid: {}", result.txid);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::SecretKey;

    fn key(byte: u8) -> PrivateKey {
        PrivateKey::new(SecretKey::from_slice(&[byte; 32]).unwrap(), Network::Testnet)
    }

    fn p2pkh_string(byte: u8) -> String {
        let secp = Secp256k1::new();
        Address::p2pkh(key(byte).public_key(&secp), Network::Testnet).to_string()
    }

    fn request(sender: String, receiver: String, btc: f64) -> SendBitcoinRequest {
        SendBitcoinRequest {
            sender_address: sender,
            reciever_address: receiver,
            bitcoin_to_send: btc,
            fee_rate_sat_per_byte: None,
        }
    }

    #[test]
    fn test_validate_accepts_good_request() {
        let req = request(p2pkh_string(1), p2pkh_string(2), 0.02);
        let validated = validate_send_request(&req, Network::Testnet, 20).unwrap();
        assert_eq!(validated.amount, Amount::from_sat(2_000_000));
        assert_eq!(validated.fee_rate_sat_per_byte, 20);
    }

    #[test]
    fn test_validate_uses_request_fee_rate() {
        let mut req = request(p2pkh_string(1), p2pkh_string(2), 0.5);
        req.fee_rate_sat_per_byte = Some(3);
        let validated = validate_send_request(&req, Network::Testnet, 20).unwrap();
        assert_eq!(validated.fee_rate_sat_per_byte, 3);

        req.fee_rate_sat_per_byte = Some(0);
        assert!(validate_send_request(&req, Network::Testnet, 20).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_addresses() {
        let req = request(String::new(), p2pkh_string(2), 0.1);
        assert!(matches!(
            validate_send_request(&req, Network::Testnet, 20),
            Err(SendError::InvalidInput(_))
        ));

        let req = request(p2pkh_string(1), "   ".to_string(), 0.1);
        assert!(matches!(
            validate_send_request(&req, Network::Testnet, 20),
            Err(SendError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        for btc in [0.0, -1.0, f64::NAN, f64::INFINITY, 0.000000001] {
            let req = request(p2pkh_string(1), p2pkh_string(2), btc);
            assert!(
                matches!(
                    validate_send_request(&req, Network::Testnet, 20),
                    Err(SendError::InvalidInput(_))
                ),
                "{} should be rejected",
                btc
            );
        }
    }

    #[test]
    fn test_validate_rejects_wrong_network() {
        let secp = Secp256k1::new();
        let mainnet = Address::p2pkh(key(1).public_key(&secp), Network::Bitcoin).to_string();
        let req = request(mainnet, p2pkh_string(2), 0.1);
        assert!(matches!(
            validate_send_request(&req, Network::Testnet, 20),
            Err(SendError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sender_must_match_key() {
        let secp = Secp256k1::new();
        let private_key = key(1);

        let legacy = Address::p2pkh(private_key.public_key(&secp), Network::Testnet);
        assert!(verify_sender_controls_address(&private_key, &legacy, Network::Testnet).is_ok());

        let compressed = CompressedPublicKey::from_private_key(&secp, &private_key).unwrap();
        let segwit = Address::p2wpkh(&compressed, Network::Testnet);
        assert!(verify_sender_controls_address(&private_key, &segwit, Network::Testnet).is_ok());

        let other = Address::p2pkh(key(2).public_key(&secp), Network::Testnet);
        assert!(matches!(
            verify_sender_controls_address(&private_key, &other, Network::Testnet),
            Err(SendError::InvalidInput(_))
        ));
    }
}
