//! Error types for the bridge guard contract
//!
//! Every failure the guard can produce is a `ContractError`. `ContractError::kind`
//! buckets the variants so callers can tell a benign duplicate from a fault.

use cosmwasm_std::{Decimal256, Int256, OverflowError, StdError, Uint256};
use thiserror::Error;

/// Coarse classification of a `ContractError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the role required by a contract message
    Unauthorized,
    /// Malformed or unacceptable input; never worth retrying
    Validation,
    /// Price feed has no value; the guarded action fails closed
    OracleUnavailable,
    /// Evidence already acted upon
    AlreadyProcessed,
    /// A collaborator (validator registry) failed; nothing was committed
    CollaboratorFailure,
    /// A configured threshold would be crossed
    LimitExceeded,
    /// Arithmetic or storage fault
    Internal,
}

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("Internal error: {reason}")]
    Internal { reason: String },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    #[error("Unauthorized: only operator can perform this action")]
    UnauthorizedOperator,

    #[error("Operator already registered")]
    OperatorAlreadyRegistered,

    #[error("Operator not registered")]
    OperatorNotRegistered,

    // ========================================================================
    // Input Errors
    // ========================================================================

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Invalid peggy id: {reason}")]
    InvalidPeggyId { reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Invalid valset: {reason}")]
    InvalidValset { reason: String },

    // ========================================================================
    // Rate Limit Errors
    // ========================================================================

    #[error("Invalid rate limit: {reason}")]
    InvalidRateLimit { reason: String },

    #[error("Rate limit already exists for token {token}")]
    RateLimitAlreadyExists { token: String },

    #[error("Rate limit not found for token {token}")]
    RateLimitNotFound { token: String },

    #[error("Rate limit overflow: configured limit: {limit}USD")]
    RateLimitExceeded { limit: Decimal256 },

    #[error("Absolute mint limit overflow: limit {limit}, minted {minted}, requested {requested}")]
    AbsoluteMintLimitExceeded {
        limit: Uint256,
        minted: Int256,
        requested: Uint256,
    },

    #[error("No price available for feed {price_id}")]
    OracleUnavailable { price_id: String },

    // ========================================================================
    // Batch Errors
    // ========================================================================

    #[error("Batch {nonce} already exists for token {token}")]
    BatchAlreadyExists { token: String, nonce: u64 },

    #[error("Batch {nonce} not found for token {token}")]
    BatchNotFound { token: String, nonce: u64 },

    #[error("Batch is empty")]
    EmptyBatch,

    // ========================================================================
    // Evidence Errors
    // ========================================================================

    #[error("Bad signature must be over a batch or valset, got {type_url}")]
    UnsupportedEvidenceSubject { type_url: String },

    #[error("Invalid evidence subject: {reason}")]
    InvalidEvidenceSubject { reason: String },

    #[error("Checkpoint exists, cannot slash: {checkpoint}")]
    CheckpointExists { checkpoint: String },

    #[error("Signature decoding failed: {reason}")]
    InvalidSignatureEncoding { reason: String },

    #[error("Signature to eth address failed with checkpoint {checkpoint} and signature {signature}: {reason}")]
    SignatureRecoveryFailed {
        checkpoint: String,
        signature: String,
        reason: String,
    },

    #[error("Did not find validator for eth address {eth_address}")]
    UnknownSigner { eth_address: String },

    #[error("Validator already slashed for fake checkpoint {checkpoint} and signature {signature}")]
    AlreadySlashed {
        checkpoint: String,
        signature: String,
    },

    #[error("Could not get consensus address for validator {validator}")]
    MissingConsensusAddress { validator: String },

    #[error("Could not jail validator {consensus_address}: {reason}")]
    JailFailed {
        consensus_address: String,
        reason: String,
    },

    // ========================================================================
    // Validator Registry Errors
    // ========================================================================

    #[error("Validator already registered: {consensus_address}")]
    ValidatorAlreadyRegistered { consensus_address: String },

    #[error("Eth address already bound to a validator: {eth_address}")]
    EthAddressTaken { eth_address: String },

    #[error("Validator not found: {consensus_address}")]
    ValidatorNotFound { consensus_address: String },

    #[error("Validator is not jailed: {consensus_address}")]
    ValidatorNotJailed { consensus_address: String },
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::Unauthorized | ContractError::UnauthorizedOperator => {
                ErrorKind::Unauthorized
            }
            ContractError::Std(_) | ContractError::Overflow(_) | ContractError::Internal { .. } => {
                ErrorKind::Internal
            }
            ContractError::RateLimitExceeded { .. }
            | ContractError::AbsoluteMintLimitExceeded { .. } => ErrorKind::LimitExceeded,
            ContractError::OracleUnavailable { .. } => ErrorKind::OracleUnavailable,
            ContractError::AlreadySlashed { .. } => ErrorKind::AlreadyProcessed,
            ContractError::MissingConsensusAddress { .. } | ContractError::JailFailed { .. } => {
                ErrorKind::CollaboratorFailure
            }
            _ => ErrorKind::Validation,
        }
    }
}
