//! Operator-reported bridge activity.
//!
//! This module handles:
//! - Price updates for the hosted oracle
//! - Batch creation (rate limited) and confirmation (outflow)
//! - Deposit observation (mint ceiling, inflow)
//! - Valset checkpoint archiving

use common::{OutgoingTransferTx, OutgoingTxBatch, Valset};
use cosmwasm_std::{Decimal256, DepsMut, Env, MessageInfo, Response, Uint256};

use super::{ensure_operator, parse_eth_address};
use crate::error::ContractError;
use crate::guard::{
    check_absolute_limit, check_rate_limit, set_past_eth_signature_checkpoint,
    track_token_inflow, track_token_mint, track_token_outflow,
};
use crate::hash::{batch_checkpoint, bytes32_to_hex, string_to_bytes32, valset_checkpoint};
use crate::host::Host;
use crate::state::{OUTGOING_BATCHES, PRICES};

// ============================================================================
// Prices
// ============================================================================

/// Record the latest USD price for a feed.
pub fn execute_update_price(
    deps: DepsMut,
    info: MessageInfo,
    price_id: String,
    price: Decimal256,
) -> Result<Response, ContractError> {
    ensure_operator(deps.storage, &info.sender)?;

    if price_id.trim().is_empty() {
        return Err(ContractError::InvalidAmount {
            reason: "price id must not be empty".to_string(),
        });
    }
    if price.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "price must be positive".to_string(),
        });
    }

    PRICES.save(deps.storage, &price_id, &price)?;

    Ok(Response::new()
        .add_attribute("action", "update_price")
        .add_attribute("price_id", price_id)
        .add_attribute("price", price.to_string()))
}

// ============================================================================
// Batches
// ============================================================================

/// Build a withdrawal batch and archive its checkpoint for signing.
pub fn execute_create_batch(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token_contract: String,
    batch_nonce: u64,
    batch_timeout: u64,
    transactions: Vec<OutgoingTransferTx>,
) -> Result<Response, ContractError> {
    let config = ensure_operator(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_contract)?;
    if transactions.is_empty() {
        return Err(ContractError::EmptyBatch);
    }
    for tx in &transactions {
        let principal = parse_eth_address(&tx.erc20_token.contract)?;
        let fee = parse_eth_address(&tx.erc20_fee.contract)?;
        if principal != token || fee != token {
            return Err(ContractError::InvalidAddress {
                reason: format!("transaction {} is not denominated in {}", tx.id, token),
            });
        }
        parse_eth_address(&tx.dest_address)?;
    }
    if OUTGOING_BATCHES.has(deps.storage, (token.as_bytes(), batch_nonce)) {
        return Err(ContractError::BatchAlreadyExists {
            token: token.to_string(),
            nonce: batch_nonce,
        });
    }

    let host = Host::new(deps.api);
    let view = host.view(deps.storage, &config.peggy_id)?;
    check_rate_limit(&view, &token, &transactions)?;
    let peggy_id = view.peggy_id;

    let batch = OutgoingTxBatch {
        batch_nonce,
        batch_timeout,
        transactions,
        token_contract: token.to_string(),
        block: env.block.height,
    };
    let checkpoint = batch_checkpoint(&peggy_id, &batch)?;

    OUTGOING_BATCHES.save(deps.storage, (token.as_bytes(), batch_nonce), &batch)?;
    set_past_eth_signature_checkpoint(deps.storage, &checkpoint)?;

    Ok(Response::new()
        .add_attribute("action", "create_batch")
        .add_attribute("token", token.to_string())
        .add_attribute("batch_nonce", batch_nonce.to_string())
        .add_attribute("tx_count", batch.transactions.len().to_string())
        .add_attribute("checkpoint", bytes32_to_hex(&checkpoint)))
}

/// Settle an executed batch: drop it from the pending set and record the outflow.
pub fn execute_confirm_batch(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token_contract: String,
    batch_nonce: u64,
) -> Result<Response, ContractError> {
    let config = ensure_operator(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_contract)?;
    let batch = OUTGOING_BATCHES
        .may_load(deps.storage, (token.as_bytes(), batch_nonce))?
        .ok_or_else(|| ContractError::BatchNotFound {
            token: token.to_string(),
            nonce: batch_nonce,
        })?;
    OUTGOING_BATCHES.remove(deps.storage, (token.as_bytes(), batch_nonce));

    let mut total = Uint256::zero();
    for tx in &batch.transactions {
        total = total.checked_add(tx.total()?)?;
    }

    let host = Host::new(deps.api);
    let mut ctx = host.context(deps.storage, env.block.height, &config.peggy_id)?;
    let outcome = track_token_outflow(&mut ctx, &token, total)?;

    let mut response = Response::new()
        .add_attribute("action", "confirm_batch")
        .add_attribute("token", token.to_string())
        .add_attribute("batch_nonce", batch_nonce.to_string())
        .add_attribute("outflow", total.to_string())
        .add_attribute("tracked", outcome.is_some().to_string());
    if let Some(mint_amount) = outcome.and_then(|o| o.mint_amount) {
        response = response
            .add_attribute("mint_amount", mint_amount.to_string())
            .add_attribute("mint_amount_negative", mint_amount.is_negative().to_string());
    }

    Ok(response)
}

// ============================================================================
// Deposits
// ============================================================================

/// Credit a deposit observed on the EVM chain.
///
/// Bridged (non-native) tokens are minted here, so the absolute ceiling is
/// checked and the mint counter raised before the inflow is recorded.
pub fn execute_observe_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token_contract: String,
    amount: Uint256,
) -> Result<Response, ContractError> {
    let config = ensure_operator(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_contract)?;
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "deposit amount must be positive".to_string(),
        });
    }

    let host = Host::new(deps.api);
    let mut ctx = host.context(deps.storage, env.block.height, &config.peggy_id)?;

    let native = ctx
        .collaborators
        .tokens
        .is_native_originated(ctx.storage, &token)?;

    let mut response = Response::new()
        .add_attribute("action", "observe_deposit")
        .add_attribute("token", token.to_string())
        .add_attribute("amount", amount.to_string())
        .add_attribute("native", native.to_string());

    if !native {
        check_absolute_limit(&ctx.view(), &token, amount)?;
        let mint_amount = track_token_mint(&mut ctx, &token, amount)?;
        response = response
            .add_attribute("mint_amount", mint_amount.to_string())
            .add_attribute("mint_amount_negative", mint_amount.is_negative().to_string());
    }

    let tracked = track_token_inflow(&mut ctx, &token, amount)?;

    Ok(response.add_attribute("tracked", tracked.to_string()))
}

// ============================================================================
// Valsets
// ============================================================================

/// Archive the checkpoint of a validator set update requested for signing.
pub fn execute_record_valset(
    deps: DepsMut,
    info: MessageInfo,
    valset: Valset,
) -> Result<Response, ContractError> {
    let config = ensure_operator(deps.storage, &info.sender)?;

    if valset.members.is_empty() {
        return Err(ContractError::InvalidValset {
            reason: "valset has no members".to_string(),
        });
    }

    let peggy_id = string_to_bytes32(&config.peggy_id)?;
    let checkpoint =
        valset_checkpoint(&peggy_id, &valset).map_err(|e| ContractError::InvalidValset {
            reason: e.to_string(),
        })?;
    set_past_eth_signature_checkpoint(deps.storage, &checkpoint)?;

    Ok(Response::new()
        .add_attribute("action", "record_valset")
        .add_attribute("valset_nonce", valset.nonce.to_string())
        .add_attribute("members", valset.members.len().to_string())
        .add_attribute("checkpoint", bytes32_to_hex(&checkpoint)))
}
