//! Bridge Guard Contract - Withdrawal Limits and Bad-Signature Slashing
//!
//! Defends a token bridge to an EVM chain against two attack classes.
//!
//! # Rate limiting
//! 1. Operators create withdrawal batches; each is refused once the worst-case
//!    USD value leaving the bridge (net outflow + pending batches + new batch)
//!    reaches the token's cap
//! 2. Confirmed batches are recorded as outflow, observed deposits as inflow
//! 3. Deposits of bridged tokens are minted only below an absolute ceiling
//!
//! # Evidence
//! 1. Every checkpoint the bridge asks validators to sign is archived
//! 2. Anyone may submit a subject and a signature over it
//! 3. If the checkpoint was never requested, the recovered signer is jailed,
//!    once per (checkpoint, validator)

pub mod contract;
pub mod error;
mod execute;
pub mod guard;
pub mod hash;
pub mod host;
pub mod msg;
mod query;
pub mod state;

pub use crate::error::{ContractError, ErrorKind};
pub use crate::hash::{batch_checkpoint, eth_signed_message_hash, keccak256, valset_checkpoint};
