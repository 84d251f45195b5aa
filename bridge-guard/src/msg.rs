//! Message types for the bridge guard contract

use common::{OutgoingTransferTx, OutgoingTxBatch, Valset};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Decimal256, Int256, Uint256};

use crate::guard::SubjectAny;
use crate::state::{RateLimit, ValidatorInfo};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address for contract management
    pub admin: String,
    /// Bridge instance identifier, at most 32 bytes. Fixed for the life of the contract.
    pub peggy_id: String,
    /// Initial operator (orchestrator) addresses
    pub operators: Vec<String>,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Execute messages
#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Admin
    // ========================================================================
    /// Hand the admin role to another address
    UpdateAdmin { new_admin: String },

    AddOperator { operator: String },

    RemoveOperator { operator: String },

    /// Start rate limiting a token
    CreateRateLimit {
        /// ERC20 contract address (hex)
        token_address: String,
        token_decimals: u32,
        /// Oracle feed id used to value the token
        token_price_id: String,
        /// Worst-case withdrawal notional at which new batches are refused
        rate_limit_usd: Decimal256,
        /// Ceiling on outstanding bridge-minted supply
        absolute_mint_limit: Uint256,
    },

    /// Change the parameters of an existing rate limit; the transfer ledger is kept
    UpdateRateLimit {
        token_address: String,
        token_price_id: Option<String>,
        rate_limit_usd: Option<Decimal256>,
        absolute_mint_limit: Option<Uint256>,
    },

    /// Drop a rate limit together with the token's mint counter
    RemoveRateLimit { token_address: String },

    /// Bind a validator's Ethereum signing key to its consensus identity
    RegisterValidator {
        operator: String,
        consensus_address: String,
        eth_address: String,
    },

    UnjailValidator { consensus_address: String },

    /// Mark an ERC20 as the EVM representation of a token native to this chain
    RegisterNativeToken { token_address: String, denom: String },

    // ========================================================================
    // Operator
    // ========================================================================
    /// Report the latest USD price for a feed
    UpdatePrice { price_id: String, price: Decimal256 },

    /// Build a withdrawal batch; refused if it would cross the token's rate limit
    CreateBatch {
        token_contract: String,
        batch_nonce: u64,
        batch_timeout: u64,
        transactions: Vec<OutgoingTransferTx>,
    },

    /// A batch was executed on the EVM chain
    ConfirmBatch {
        token_contract: String,
        batch_nonce: u64,
    },

    /// A deposit on the EVM chain was observed and is being credited here
    ObserveDeposit {
        token_contract: String,
        amount: Uint256,
    },

    /// Archive the checkpoint of a validator set update requested for signing
    RecordValset { valset: Valset },

    // ========================================================================
    // Public
    // ========================================================================
    /// Prove that a validator signed a checkpoint the bridge never requested
    SubmitBadSignatureEvidence {
        subject: SubjectAny,
        /// Hex `[R || S || V]`
        signature: String,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

/// Query messages
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    #[returns(OperatorsResponse)]
    Operators {},

    #[returns(RateLimitResponse)]
    RateLimit { token_address: String },

    /// Paginated by token address
    #[returns(RateLimitsResponse)]
    RateLimits {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(MintAmountResponse)]
    MintAmount { token_address: String },

    /// Whether a checkpoint (hex) was legitimately requested for signing
    #[returns(PastCheckpointResponse)]
    PastCheckpoint { checkpoint: String },

    #[returns(IsSlashedResponse)]
    IsSlashed {
        checkpoint: String,
        consensus_address: String,
    },

    #[returns(ValidatorResponse)]
    Validator { consensus_address: String },

    #[returns(ValidatorResponse)]
    ValidatorByEthAddress { eth_address: String },

    #[returns(PriceResponse)]
    Price { price_id: String },

    #[returns(PendingBatchesResponse)]
    PendingBatches { token_contract: String },

    /// Checkpoint this contract computes for a signed subject
    #[returns(ComputeCheckpointResponse)]
    ComputeCheckpoint { subject: SubjectAny },

    /// Dry-run the rate limit check for a prospective batch
    #[returns(SimulateRateLimitResponse)]
    SimulateRateLimit {
        token_address: String,
        transactions: Vec<OutgoingTransferTx>,
    },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub admin: Addr,
    pub peggy_id: String,
}

#[cw_serde]
pub struct OperatorsResponse {
    pub operators: Vec<Addr>,
}

#[cw_serde]
pub struct RateLimitResponse {
    pub rate_limit: Option<RateLimit>,
    pub total_inflow: Uint256,
    pub total_outflow: Uint256,
}

#[cw_serde]
pub struct RateLimitsResponse {
    pub rate_limits: Vec<RateLimit>,
}

#[cw_serde]
pub struct MintAmountResponse {
    /// Outstanding bridge-minted supply; negative when more left than was minted
    pub mint_amount: Int256,
}

#[cw_serde]
pub struct PastCheckpointResponse {
    pub exists: bool,
}

#[cw_serde]
pub struct IsSlashedResponse {
    pub slashed: bool,
}

#[cw_serde]
pub struct ValidatorResponse {
    pub validator: Option<ValidatorInfo>,
}

#[cw_serde]
pub struct PriceResponse {
    pub price: Option<Decimal256>,
}

#[cw_serde]
pub struct PendingBatchesResponse {
    pub batches: Vec<OutgoingTxBatch>,
}

#[cw_serde]
pub struct ComputeCheckpointResponse {
    pub checkpoint: Binary,
    pub checkpoint_hex: String,
}

#[cw_serde]
pub struct SimulateRateLimitResponse {
    pub allowed: bool,
    /// Why the batch would be refused
    pub reason: Option<String>,
}
