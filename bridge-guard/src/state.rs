//! State definitions for the bridge guard contract
//!
//! The guard owns four key namespaces (rate limits, mint counters, the
//! checkpoint archive and slash marks). The remaining maps back the
//! contract-hosted collaborators in `host`.

use common::OutgoingTxBatch;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal256, Int256, OverflowError, Uint256};
use cw_storage_plus::{Item, Map};

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Admin address for contract management
    pub admin: Addr,
    /// Bridge instance identifier bound into every checkpoint
    pub peggy_id: String,
}

// ============================================================================
// Rate Limits
// ============================================================================

/// A deposit or withdrawal observed for a rate-limited token.
#[cw_serde]
pub struct BridgeTransfer {
    /// Block height at which the transfer was tracked
    pub block_number: u64,
    pub amount: Uint256,
    /// `true` for inflow (deposit), `false` for outflow (withdrawal)
    pub is_deposit: bool,
}

/// Per-token limits plus the append-only transfer ledger.
#[cw_serde]
pub struct RateLimit {
    /// ERC20 contract address (hex)
    pub token_address: String,
    pub token_decimals: u32,
    /// Oracle price feed id used to value the token in USD
    pub token_price_id: String,
    /// Worst-case withdrawal notional, in USD, at which new batches are refused
    pub rate_limit_usd: Decimal256,
    /// Ceiling on outstanding bridge-minted supply
    pub absolute_mint_limit: Uint256,
    pub transfers: Vec<BridgeTransfer>,
}

impl RateLimit {
    pub fn total_inflow(&self) -> Result<Uint256, OverflowError> {
        self.sum_transfers(true)
    }

    pub fn total_outflow(&self) -> Result<Uint256, OverflowError> {
        self.sum_transfers(false)
    }

    fn sum_transfers(&self, deposits: bool) -> Result<Uint256, OverflowError> {
        self.transfers
            .iter()
            .filter(|t| t.is_deposit == deposits)
            .try_fold(Uint256::zero(), |acc, t| acc.checked_add(t.amount))
    }
}

// ============================================================================
// Contract-hosted collaborator records
// ============================================================================

/// A bridge validator known to the hosted validator registry.
#[cw_serde]
pub struct ValidatorInfo {
    /// Operator (valoper) address
    pub operator: String,
    pub consensus_address: String,
    /// Ethereum signing address (hex)
    pub eth_address: String,
    pub jailed: bool,
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:bridge-guard";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quote currency for every rate-limit valuation
pub const USD_QUOTE: &str = "USD";

/// Largest power of ten that fits in a 256-bit integer
pub const MAX_TOKEN_DECIMALS: u32 = 77;

/// Stored value for set-membership maps
pub const MARKER: bool = true;

// ============================================================================
// Core State Storage
// ============================================================================

/// Primary config storage
pub const CONFIG: Item<Config> = Item::new("config");

/// Orchestrators allowed to report flows, prices and signed subjects
/// Key: operator address, Value: whether active
pub const OPERATORS: Map<&Addr, bool> = Map::new("operators");

// ============================================================================
// Guard State (owned exclusively by `guard`)
// ============================================================================

/// Per-token rate limits
/// Key: 20-byte ERC20 address, Value: RateLimit
pub const RATE_LIMITS: Map<&[u8], RateLimit> = Map::new("rate_limits");

/// Outstanding bridge-minted supply per token; may dip below zero
/// Key: 20-byte ERC20 address, Value: signed amount
pub const MINT_AMOUNTS: Map<&[u8], Int256> = Map::new("mint_amounts");

/// Checkpoints that were legitimately requested for signing
/// Key: 32-byte checkpoint, Value: marker
pub const PAST_CHECKPOINTS: Map<&[u8], bool> = Map::new("past_checkpoints");

/// Validators already punished for a fake checkpoint
/// Key: (32-byte checkpoint, consensus address), Value: marker
pub const SLASHED_CHECKPOINTS: Map<(&[u8], &str), bool> = Map::new("slashed_checkpoints");

// ============================================================================
// Hosted Collaborator State
// ============================================================================

/// Latest USD price per oracle feed
/// Key: price feed id, Value: price
pub const PRICES: Map<&str, Decimal256> = Map::new("prices");

/// Registered bridge validators
/// Key: consensus address, Value: ValidatorInfo
pub const VALIDATORS: Map<&str, ValidatorInfo> = Map::new("validators");

/// Reverse index from Ethereum signing address to consensus address
/// Key: 20-byte eth address, Value: consensus address
pub const VALIDATOR_BY_ETH: Map<&[u8], String> = Map::new("validator_by_eth");

/// Batches built but not yet executed on the EVM chain
/// Key: (20-byte token address, batch nonce), Value: OutgoingTxBatch
pub const OUTGOING_BATCHES: Map<(&[u8], u64), OutgoingTxBatch> = Map::new("outgoing_batches");

/// Tokens that originate on this chain (never minted by the bridge)
/// Key: 20-byte ERC20 address, Value: native denom
pub const NATIVE_TOKENS: Map<&[u8], String> = Map::new("native_tokens");
