//! Common test utilities for sender integration tests
//!
//! This module provides shared test infrastructure including:
//! - An in-process explorer mock with an in-memory ledger
//! - A sender router wired to that mock with a generated wallet key
//! - Helpers to fund the sender and call `POST /bitcoin/send`

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bitcoin::hashes::Hash;
use bitcoin::script::Instruction;
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::SighashCache;
use bitcoin::{
    ecdsa, Address, Amount, CompressedPublicKey, Network, PrivateKey, PublicKey, Script,
    Transaction,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use bitcoin_sender::api::server::create_router;
use bitcoin_sender::{SendManager, SenderConfig};
use explorer_mock::{spawn_server, FundRequest, MockLedger};

pub const NETWORK: Network = Network::Testnet;

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn private_key(byte: u8) -> PrivateKey {
    let secret = SecretKey::from_slice(&[byte; 32]).expect("valid secret key");
    PrivateKey::new(secret, NETWORK)
}

pub fn p2pkh_address(key: &PrivateKey) -> Address {
    let secp = Secp256k1::new();
    Address::p2pkh(key.public_key(&secp), NETWORK)
}

pub fn p2wpkh_address(key: &PrivateKey) -> Address {
    let secp = Secp256k1::new();
    let compressed = CompressedPublicKey::from_private_key(&secp, key).expect("compressed key");
    Address::p2wpkh(&compressed, NETWORK)
}

/// Check every input's ECDSA signature against the output it spends
///
/// `prevout_script` is the sender's script_pubkey; `prevout_values` are the
/// spent amounts in input order (only P2WPKH commits to them).
pub fn assert_inputs_signed(
    tx: &Transaction,
    prevout_script: &Script,
    prevout_values: &[Amount],
    signer: &PrivateKey,
) {
    assert_eq!(tx.input.len(), prevout_values.len());

    let secp = Secp256k1::new();
    let expected_key = signer.public_key(&secp);
    let mut cache = SighashCache::new(tx);

    for (index, txin) in tx.input.iter().enumerate() {
        let pushes: Vec<Vec<u8>> = if prevout_script.is_p2wpkh() {
            assert!(txin.script_sig.is_empty(), "input {} has a scriptSig", index);
            txin.witness.iter().map(|item| item.to_vec()).collect()
        } else {
            txin.script_sig
                .instructions()
                .map(|instruction| match instruction.expect("parse scriptSig") {
                    Instruction::PushBytes(bytes) => bytes.as_bytes().to_vec(),
                    Instruction::Op(op) => panic!("unexpected opcode {} in scriptSig", op),
                })
                .collect()
        };
        assert_eq!(pushes.len(), 2, "input {} must carry signature and key", index);

        let signature = ecdsa::Signature::from_slice(&pushes[0]).expect("signature");
        let public_key = PublicKey::from_slice(&pushes[1]).expect("public key");
        assert_eq!(public_key, expected_key);

        let digest = if prevout_script.is_p2wpkh() {
            cache
                .p2wpkh_signature_hash(
                    index,
                    prevout_script,
                    prevout_values[index],
                    signature.sighash_type,
                )
                .expect("segwit sighash")
                .to_byte_array()
        } else {
            cache
                .legacy_signature_hash(index, prevout_script, signature.sighash_type.to_u32())
                .expect("legacy sighash")
                .to_byte_array()
        };

        secp.verify_ecdsa(
            &Message::from_digest(digest),
            &signature.signature,
            &public_key.inner,
        )
        .unwrap_or_else(|e| panic!("input {} signature does not verify: {}", index, e));
    }
}

/// Test environment: explorer mock + sender router
pub struct TestEnvironment {
    pub ledger: Arc<MockLedger>,
    pub router: Router,
    pub config: SenderConfig,
    pub sender_key: PrivateKey,
    pub sender_address: Address,
    pub receiver_address: Address,
    next_vout: AtomicU32,
}

impl TestEnvironment {
    pub async fn new() -> anyhow::Result<Self> {
        Self::new_with(|_| {}).await
    }

    /// Build an environment, letting the caller adjust the sender config
    pub async fn new_with(configure: impl FnOnce(&mut SenderConfig)) -> anyhow::Result<Self> {
        init_logging();

        let ledger = Arc::new(MockLedger::new());
        let addr = spawn_server(ledger.clone()).await?;
        log::info!("Explorer mock: http://{}", addr);

        let sender_key = private_key(0x11);
        let sender_address = p2pkh_address(&sender_key);
        let receiver_address = p2pkh_address(&private_key(0x22));

        let mut config = SenderConfig {
            bitcoin_network: NETWORK,
            explorer_url: format!("http://{}", addr),
            explorer_network: "BTCTEST".to_string(),
            fee_rate_sat_per_byte: 20,
            explorer_timeout: Duration::from_secs(5),
            sender_private_key: Some(sender_key.to_wif()),
        };
        configure(&mut config);

        let manager = Arc::new(SendManager::new(config.clone())?);
        let router = create_router(manager);

        Ok(Self {
            ledger,
            router,
            config,
            sender_key,
            sender_address,
            receiver_address,
            next_vout: AtomicU32::new(0),
        })
    }

    /// Give `address` a new UTXO worth `sats`
    pub fn fund(&self, address: &Address, sats: u64) {
        let vout = self.next_vout.fetch_add(1, Ordering::SeqCst);
        self.ledger
            .fund(FundRequest {
                address: address.to_string(),
                txid: "ab".repeat(32),
                output_no: vout,
                script_hex: address.script_pubkey().to_hex_string(),
                value_sats: sats,
                confirmations: None,
            })
            .expect("fund mock ledger");
    }

    pub fn fund_sender(&self, sats: u64) {
        let address = self.sender_address.clone();
        self.fund(&address, sats);
    }

    /// Standard request body from sender to receiver
    pub fn send_body(&self, bitcoin_to_send: f64) -> serde_json::Value {
        serde_json::json!({
            "senderAddress": self.sender_address.to_string(),
            "recieverAddress": self.receiver_address.to_string(),
            "bitcoinToSend": bitcoin_to_send,
        })
    }

    pub async fn post_send(&self, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.post_raw(body.to_string()).await
    }

    pub async fn post_raw(&self, body: String) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/bitcoin/send")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        log::debug!("POST /bitcoin/send -> {} {}", status, json);
        (status, json)
    }

    /// Decode the only transaction the mock accepted
    pub fn broadcast_tx(&self) -> Transaction {
        let broadcasts = self.ledger.broadcasts();
        assert_eq!(broadcasts.len(), 1, "expected exactly one broadcast");
        let bytes = hex::decode(&broadcasts[0].tx_hex).expect("broadcast hex");
        bitcoin::consensus::deserialize(&bytes).expect("broadcast transaction")
    }
}
