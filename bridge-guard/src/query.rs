//! Query handlers for the bridge guard contract.

use common::{EthAddress, OutgoingTransferTx};
use cosmwasm_std::{Addr, Binary, Deps, Order, StdError, StdResult, Uint256};
use cw_storage_plus::Bound;

use crate::guard::{
    check_rate_limit, get_mint_amount, get_past_eth_signature_checkpoint, get_rate_limit,
    is_validator_slashed, BatchStore, SignedSubject, SubjectAny,
};
use crate::hash::{bytes32_to_hex, hex_to_bytes32, string_to_bytes32};
use crate::host::{Host, StoredBatches, StoredValidatorRegistry};
use crate::msg::{
    ComputeCheckpointResponse, ConfigResponse, IsSlashedResponse, MintAmountResponse,
    OperatorsResponse, PastCheckpointResponse, PendingBatchesResponse, PriceResponse,
    RateLimitResponse, RateLimitsResponse, SimulateRateLimitResponse, ValidatorResponse,
};
use crate::state::{CONFIG, OPERATORS, PRICES, RATE_LIMITS, VALIDATOR_BY_ETH};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;

fn parse_token(input: &str) -> StdResult<EthAddress> {
    EthAddress::parse(input)
}

fn parse_checkpoint(input: &str) -> StdResult<[u8; 32]> {
    hex_to_bytes32(input).map_err(StdError::generic_err)
}

// ============================================================================
// Core Queries
// ============================================================================

/// Query contract configuration.
pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        admin: config.admin,
        peggy_id: config.peggy_id,
    })
}

/// Query active operators.
pub fn query_operators(deps: Deps) -> StdResult<OperatorsResponse> {
    let operators: Vec<Addr> = OPERATORS
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|item| {
            let (addr, active) = item.ok()?;
            if active {
                Some(addr)
            } else {
                None
            }
        })
        .collect();

    Ok(OperatorsResponse { operators })
}

// ============================================================================
// Rate Limit Queries
// ============================================================================

/// Query a token's rate limit with its derived totals.
pub fn query_rate_limit(deps: Deps, token_address: String) -> StdResult<RateLimitResponse> {
    let token = parse_token(&token_address)?;
    let rate_limit = get_rate_limit(deps.storage, &token)?;

    let (total_inflow, total_outflow) = match &rate_limit {
        Some(rate_limit) => (rate_limit.total_inflow()?, rate_limit.total_outflow()?),
        None => (Uint256::zero(), Uint256::zero()),
    };

    Ok(RateLimitResponse {
        rate_limit,
        total_inflow,
        total_outflow,
    })
}

/// Query rate limits with pagination.
pub fn query_rate_limits(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<RateLimitsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_token = start_after.as_deref().map(parse_token).transpose()?;
    let start: Option<Bound<&[u8]>> = start_token
        .as_ref()
        .map(|token| Bound::exclusive(token.as_bytes()));

    let rate_limits = RATE_LIMITS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, rate_limit)| rate_limit))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(RateLimitsResponse { rate_limits })
}

/// Query a token's outstanding bridge-minted supply.
pub fn query_mint_amount(deps: Deps, token_address: String) -> StdResult<MintAmountResponse> {
    let token = parse_token(&token_address)?;
    Ok(MintAmountResponse {
        mint_amount: get_mint_amount(deps.storage, &token)?,
    })
}

/// Dry-run the rate limit for a prospective batch.
pub fn query_simulate_rate_limit(
    deps: Deps,
    token_address: String,
    transactions: Vec<OutgoingTransferTx>,
) -> StdResult<SimulateRateLimitResponse> {
    let config = CONFIG.load(deps.storage)?;
    let token = parse_token(&token_address)?;

    let host = Host::new(deps.api);
    let view = host.view(deps.storage, &config.peggy_id)?;

    Ok(match check_rate_limit(&view, &token, &transactions) {
        Ok(()) => SimulateRateLimitResponse {
            allowed: true,
            reason: None,
        },
        Err(err) => SimulateRateLimitResponse {
            allowed: false,
            reason: Some(err.to_string()),
        },
    })
}

// ============================================================================
// Evidence Queries
// ============================================================================

pub fn query_past_checkpoint(deps: Deps, checkpoint: String) -> StdResult<PastCheckpointResponse> {
    let checkpoint = parse_checkpoint(&checkpoint)?;
    Ok(PastCheckpointResponse {
        exists: get_past_eth_signature_checkpoint(deps.storage, &checkpoint)?,
    })
}

pub fn query_is_slashed(
    deps: Deps,
    checkpoint: String,
    consensus_address: String,
) -> StdResult<IsSlashedResponse> {
    let checkpoint = parse_checkpoint(&checkpoint)?;
    Ok(IsSlashedResponse {
        slashed: is_validator_slashed(deps.storage, &checkpoint, &consensus_address)?,
    })
}

/// Compute the checkpoint of a signed subject under this bridge's id.
pub fn query_compute_checkpoint(
    deps: Deps,
    subject: SubjectAny,
) -> StdResult<ComputeCheckpointResponse> {
    let config = CONFIG.load(deps.storage)?;
    let peggy_id = string_to_bytes32(&config.peggy_id)?;

    let checkpoint = SignedSubject::unpack(&subject)
        .and_then(|subject| subject.checkpoint(&peggy_id))
        .map_err(|e| StdError::generic_err(e.to_string()))?;

    Ok(ComputeCheckpointResponse {
        checkpoint: Binary::from(checkpoint.to_vec()),
        checkpoint_hex: bytes32_to_hex(&checkpoint),
    })
}

// ============================================================================
// Collaborator Queries
// ============================================================================

pub fn query_validator(deps: Deps, consensus_address: String) -> StdResult<ValidatorResponse> {
    Ok(ValidatorResponse {
        validator: StoredValidatorRegistry::load(deps.storage, &consensus_address)?,
    })
}

pub fn query_validator_by_eth_address(
    deps: Deps,
    eth_address: String,
) -> StdResult<ValidatorResponse> {
    let eth = EthAddress::parse(&eth_address)?;
    let validator = match VALIDATOR_BY_ETH.may_load(deps.storage, eth.as_bytes())? {
        Some(consensus_address) => StoredValidatorRegistry::load(deps.storage, &consensus_address)?,
        None => None,
    };
    Ok(ValidatorResponse { validator })
}

pub fn query_price(deps: Deps, price_id: String) -> StdResult<PriceResponse> {
    Ok(PriceResponse {
        price: PRICES.may_load(deps.storage, &price_id)?,
    })
}

pub fn query_pending_batches(
    deps: Deps,
    token_contract: String,
) -> StdResult<PendingBatchesResponse> {
    let token = parse_token(&token_contract)?;
    Ok(PendingBatchesResponse {
        batches: StoredBatches.pending_batches(deps.storage, &token)?,
    })
}
