//! Ethereum address handling.

use std::fmt;

use cosmwasm_std::{StdError, StdResult};

/// A 20-byte Ethereum account or contract address.
///
/// Messages carry addresses as `0x`-prefixed hex strings; handlers parse them
/// into this type before touching storage so every key is the raw 20 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    pub const LEN: usize = 20;

    pub const ZERO: EthAddress = EthAddress([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn parse(input: &str) -> StdResult<Self> {
        let hex_part = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if hex_part.len() != Self::LEN * 2 {
            return Err(StdError::generic_err(format!(
                "invalid ethereum address {input}: expected 40 hex characters, got {}",
                hex_part.len()
            )));
        }
        let bytes = hex::decode(hex_part).map_err(|e| {
            StdError::generic_err(format!("invalid ethereum address {input}: {e}"))
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> StdResult<Self> {
        let raw: [u8; 20] = bytes.try_into().map_err(|_| {
            StdError::generic_err(format!(
                "invalid ethereum address length: expected 20 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Left-pad to a 32-byte ABI word.
    pub fn to_word(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
