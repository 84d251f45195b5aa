//! Hash computation module for checkpoints and Ethereum signatures
//!
//! Checkpoints are the digests bridge validators sign for the EVM chain. They
//! must match the Peggy contract byte for byte, so the ABI encoding below is
//! written out by hand.
//!
//! # Valset checkpoint
//! ```solidity
//! keccak256(abi.encode(
//!     bytes32 peggyId,
//!     bytes32 "checkpoint",
//!     uint256 valsetNonce,
//!     address[] validators,
//!     uint256[] powers,
//!     uint256 rewardAmount,
//!     address rewardToken
//! ))
//! ```
//!
//! # Batch checkpoint
//! ```solidity
//! keccak256(abi.encode(
//!     bytes32 peggyId,
//!     bytes32 "transactionBatch",
//!     uint256[] amounts,
//!     address[] destinations,
//!     uint256[] fees,
//!     uint256 batchNonce,
//!     address tokenContract,
//!     uint256 batchTimeout
//! ))
//! ```

use common::{EthAddress, OutgoingTxBatch, Valset};
use cosmwasm_std::{StdError, StdResult};
use tiny_keccak::{Hasher, Keccak};

/// Method name bound into valset checkpoints
const VALSET_METHOD: &[u8] = b"checkpoint";

/// Method name bound into batch checkpoints
const BATCH_METHOD: &[u8] = b"transactionBatch";

/// EIP-191 prefix for a 32-byte personal message
const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Copy a short string into a right-zero-padded bytes32.
pub fn string_to_bytes32(value: &str) -> StdResult<[u8; 32]> {
    let bytes = value.as_bytes();
    if bytes.len() > 32 {
        return Err(StdError::generic_err(format!(
            "value exceeds 32 bytes: {} bytes",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Checkpoint of a validator set update.
pub fn valset_checkpoint(peggy_id: &[u8; 32], valset: &Valset) -> StdResult<[u8; 32]> {
    let mut validators = Vec::with_capacity(valset.members.len());
    let mut powers = Vec::with_capacity(valset.members.len());
    for member in &valset.members {
        validators.push(EthAddress::parse(&member.ethereum_address)?.to_word());
        powers.push(u64_word(member.power));
    }

    let tokens = [
        AbiToken::Word(*peggy_id),
        AbiToken::Word(method_word(VALSET_METHOD)),
        AbiToken::Word(u64_word(valset.nonce)),
        AbiToken::Array(validators),
        AbiToken::Array(powers),
        AbiToken::Word(valset.reward_amount.to_be_bytes()),
        AbiToken::Word(optional_address_word(&valset.reward_token)?),
    ];

    Ok(keccak256(&abi_encode(&tokens)))
}

/// Checkpoint of an outgoing transaction batch.
pub fn batch_checkpoint(peggy_id: &[u8; 32], batch: &OutgoingTxBatch) -> StdResult<[u8; 32]> {
    let mut amounts = Vec::with_capacity(batch.transactions.len());
    let mut destinations = Vec::with_capacity(batch.transactions.len());
    let mut fees = Vec::with_capacity(batch.transactions.len());
    for tx in &batch.transactions {
        amounts.push(tx.erc20_token.amount.to_be_bytes());
        destinations.push(EthAddress::parse(&tx.dest_address)?.to_word());
        fees.push(tx.erc20_fee.amount.to_be_bytes());
    }

    let tokens = [
        AbiToken::Word(*peggy_id),
        AbiToken::Word(method_word(BATCH_METHOD)),
        AbiToken::Array(amounts),
        AbiToken::Array(destinations),
        AbiToken::Array(fees),
        AbiToken::Word(u64_word(batch.batch_nonce)),
        AbiToken::Word(EthAddress::parse(&batch.token_contract)?.to_word()),
        AbiToken::Word(u64_word(batch.batch_timeout)),
    ];

    Ok(keccak256(&abi_encode(&tokens)))
}

/// Digest actually signed by an Ethereum key for a 32-byte message.
pub fn eth_signed_message_hash(message: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 60];
    data[..28].copy_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    data[28..].copy_from_slice(message);
    keccak256(&data)
}

/// Ethereum address of an uncompressed (65-byte, 0x04-prefixed) secp256k1 key.
pub fn eth_address_from_pubkey(pubkey: &[u8]) -> StdResult<EthAddress> {
    if pubkey.len() != 65 || pubkey[0] != 0x04 {
        return Err(StdError::generic_err(format!(
            "expected 65-byte uncompressed public key, got {} bytes",
            pubkey.len()
        )));
    }
    let digest = keccak256(&pubkey[1..]);
    EthAddress::from_slice(&digest[12..])
}

/// Convert 32-byte hash to hex string (for attributes/logging)
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse hex string (with or without 0x prefix) to 32-byte array
pub fn hex_to_bytes32(input: &str) -> Result<[u8; 32], &'static str> {
    let hex_part = input.strip_prefix("0x").unwrap_or(input);
    if hex_part.len() != 64 {
        return Err("Invalid hex length: expected 64 characters");
    }
    let bytes = hex::decode(hex_part).map_err(|_| "Invalid hex character")?;
    bytes
        .try_into()
        .map_err(|_| "Invalid hex length: expected 64 characters")
}

// ============================================================================
// Internal helpers
// ============================================================================

/// A value in an `abi.encode` parameter list.
enum AbiToken {
    /// Static 32-byte value, encoded in place
    Word([u8; 32]),
    /// Dynamic array of static 32-byte values, encoded in the tail
    Array(Vec<[u8; 32]>),
}

/// `abi.encode` over a flat parameter list.
///
/// Static words sit in the head. Each array leaves its byte offset (relative to
/// the start of the encoding) in the head and its length-prefixed elements in
/// the tail.
fn abi_encode(tokens: &[AbiToken]) -> Vec<u8> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            AbiToken::Word(word) => head.extend_from_slice(word),
            AbiToken::Array(items) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&u64_word(items.len() as u64));
                for item in items {
                    tail.extend_from_slice(item);
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// uint256 word for a u64, left-padded, big-endian
fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// ASCII method name, right-padded into a bytes32
fn method_word(name: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..name.len()].copy_from_slice(name);
    word
}

fn optional_address_word(address: &str) -> StdResult<[u8; 32]> {
    if address.is_empty() {
        return Ok(EthAddress::ZERO.to_word());
    }
    Ok(EthAddress::parse(address)?.to_word())
}
