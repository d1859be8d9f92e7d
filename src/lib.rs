//! Bitcoin sender: build, sign and broadcast payments over HTTP
//!
//! `POST /bitcoin/send` looks up the sender's UTXOs on a block explorer,
//! spends them into a payment plus change, signs with the configured wallet
//! key and broadcasts the raw transaction through the same explorer.
//!
//! # Example
//!
//! ```ignore
//! use bitcoin_sender::{api::server::create_router, SendManager, SenderConfig};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(SendManager::new(SenderConfig::from_env())?);
//! let app = create_router(manager);
//! ```

pub mod api;
pub mod bitcoin;
pub mod config;
pub mod error;
pub mod manager;

pub use config::SenderConfig;
pub use error::SendError;
pub use manager::SendManager;

pub type Result<T> = std::result::Result<T, SendError>;
