//! Common - Shared Types for the Bridge Guard Contracts
//!
//! This package provides the wire types that cross contract boundaries:
//! Ethereum addresses and the signed subjects (validator sets and outgoing
//! transaction batches) that bridge validators sign for the EVM chain.

pub mod eth;
pub mod subject;

pub use eth::EthAddress;
pub use subject::{BridgeValidator, Erc20Token, OutgoingTransferTx, OutgoingTxBatch, Valset};
