//! USD-denominated withdrawal limits and the absolute mint ceiling.
//!
//! `check_rate_limit` values the worst-case drain of a token (net historical
//! outflow, plus everything already batched, plus the proposed transfers) at
//! the current oracle price and refuses once it reaches the configured cap. It
//! never writes; settlement paths record what actually moved through
//! `track_token_inflow` / `track_token_outflow`.

use common::{EthAddress, OutgoingTransferTx};
use cosmwasm_std::{Decimal256, Int256, Order, StdResult, Storage, Uint256};

use super::{GuardContext, GuardView};
use crate::error::ContractError;
use crate::state::{BridgeTransfer, RateLimit, MINT_AMOUNTS, RATE_LIMITS, USD_QUOTE};

/// Result of recording an outflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutflowOutcome {
    /// Mint counter after the decrement; `None` for native-originated tokens
    pub mint_amount: Option<Int256>,
}

// ============================================================================
// Checks
// ============================================================================

/// Refuse `new_txs` if the worst-case withdrawal notional reaches the USD cap.
pub fn check_rate_limit(
    view: &GuardView,
    token: &EthAddress,
    new_txs: &[OutgoingTransferTx],
) -> Result<(), ContractError> {
    let Some(rate_limit) = get_rate_limit(view.storage, token)? else {
        return Ok(()); // No limit configured
    };

    // 1. Net historical outflow, floored at zero
    let surplus = rate_limit
        .total_outflow()?
        .saturating_sub(rate_limit.total_inflow()?);

    // 2. Everything already batched for this token
    let pending = view
        .collaborators
        .batches
        .pending_batches(view.storage, token)?;
    let batched = pending.iter().flat_map(|batch| batch.transactions.iter());

    let price = view
        .collaborators
        .oracle
        .price(view.storage, &rate_limit.token_price_id, USD_QUOTE)?
        .ok_or_else(|| ContractError::OracleUnavailable {
            price_id: rate_limit.token_price_id.clone(),
        })?;

    // 3. Plus the proposed transfers. Overflow anywhere on the way means a
    // notional far past any representable cap.
    let exceeded = || ContractError::RateLimitExceeded {
        limit: rate_limit.rate_limit_usd,
    };
    let notional = worst_case_notional(
        surplus,
        batched.chain(new_txs),
        rate_limit.token_decimals,
        price,
    )
    .ok_or_else(exceeded)?;
    if notional >= rate_limit.rate_limit_usd {
        return Err(exceeded());
    }

    Ok(())
}

/// Refuse a mint that would push outstanding bridged supply past the ceiling.
pub fn check_absolute_limit(
    view: &GuardView,
    token: &EthAddress,
    amount: Uint256,
) -> Result<(), ContractError> {
    let Some(rate_limit) = get_rate_limit(view.storage, token)? else {
        return Ok(()); // No limit configured
    };

    let minted = get_mint_amount(view.storage, token)?;
    let limit = rate_limit.absolute_mint_limit;
    // A negative counter widens the headroom past the configured limit
    let remaining = if minted.is_negative() {
        limit.saturating_add(minted.unsigned_abs())
    } else {
        limit.saturating_sub(minted.unsigned_abs())
    };
    let over_limit = !minted.is_negative() && minted.unsigned_abs() > limit;
    if over_limit || remaining < amount {
        return Err(ContractError::AbsoluteMintLimitExceeded {
            limit: rate_limit.absolute_mint_limit,
            minted,
            requested: amount,
        });
    }

    Ok(())
}

// ============================================================================
// Tracking
// ============================================================================

/// Record a deposit into this chain. Deposits are never limit-checked.
pub fn track_token_inflow(
    ctx: &mut GuardContext,
    token: &EthAddress,
    amount: Uint256,
) -> Result<bool, ContractError> {
    append_transfer(ctx, token, amount, true)
}

/// Record a withdrawal out of this chain.
///
/// For tokens minted by the bridge the outflow also returns supply to its
/// origin, so the mint counter is reduced by the same amount. The counter is
/// not clamped at zero.
pub fn track_token_outflow(
    ctx: &mut GuardContext,
    token: &EthAddress,
    amount: Uint256,
) -> Result<Option<OutflowOutcome>, ContractError> {
    if !append_transfer(ctx, token, amount, false)? {
        return Ok(None);
    }

    let native = ctx
        .collaborators
        .tokens
        .is_native_originated(ctx.storage, token)?;
    if native {
        return Ok(Some(OutflowOutcome { mint_amount: None }));
    }

    let current = get_mint_amount(ctx.storage, token)?;
    let updated = current.checked_sub(to_signed(amount)?)?;
    MINT_AMOUNTS.save(ctx.storage, token.as_bytes(), &updated)?;

    Ok(Some(OutflowOutcome {
        mint_amount: Some(updated),
    }))
}

/// Add a bridge mint to the token's outstanding supply. Call only after
/// `check_absolute_limit` passed for the same amount.
pub fn track_token_mint(
    ctx: &mut GuardContext,
    token: &EthAddress,
    amount: Uint256,
) -> Result<Int256, ContractError> {
    let current = get_mint_amount(ctx.storage, token)?;
    let updated = current.checked_add(to_signed(amount)?)?;
    MINT_AMOUNTS.save(ctx.storage, token.as_bytes(), &updated)?;
    Ok(updated)
}

/// Append a transfer; `false` when the token has no rate limit.
fn append_transfer(
    ctx: &mut GuardContext,
    token: &EthAddress,
    amount: Uint256,
    is_deposit: bool,
) -> Result<bool, ContractError> {
    let Some(mut rate_limit) = get_rate_limit(ctx.storage, token)? else {
        return Ok(false);
    };

    rate_limit.transfers.push(BridgeTransfer {
        block_number: ctx.block_height,
        amount,
        is_deposit,
    });
    set_rate_limit(ctx.storage, token, &rate_limit)?;

    Ok(true)
}

// ============================================================================
// Store Operations
// ============================================================================

pub fn get_rate_limit(storage: &dyn Storage, token: &EthAddress) -> StdResult<Option<RateLimit>> {
    RATE_LIMITS.may_load(storage, token.as_bytes())
}

pub fn set_rate_limit(
    storage: &mut dyn Storage,
    token: &EthAddress,
    rate_limit: &RateLimit,
) -> StdResult<()> {
    RATE_LIMITS.save(storage, token.as_bytes(), rate_limit)
}

/// Remove a rate limit together with the token's mint counter.
pub fn delete_rate_limit(storage: &mut dyn Storage, token: &EthAddress) {
    RATE_LIMITS.remove(storage, token.as_bytes());
    MINT_AMOUNTS.remove(storage, token.as_bytes());
}

/// All rate limits in token-address order.
pub fn get_rate_limits(storage: &dyn Storage) -> StdResult<Vec<RateLimit>> {
    RATE_LIMITS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, rate_limit)| rate_limit))
        .collect()
}

pub fn get_mint_amount(storage: &dyn Storage, token: &EthAddress) -> StdResult<Int256> {
    Ok(MINT_AMOUNTS
        .may_load(storage, token.as_bytes())?
        .unwrap_or_else(Int256::zero))
}

// ============================================================================
// Arithmetic helpers
// ============================================================================

/// USD value of `surplus` plus every transfer's principal and fee; `None` on overflow.
fn worst_case_notional<'a>(
    surplus: Uint256,
    txs: impl Iterator<Item = &'a OutgoingTransferTx>,
    decimals: u32,
    price: Decimal256,
) -> Option<Decimal256> {
    let mut total = surplus;
    for tx in txs {
        total = total.checked_add(tx.total().ok()?).ok()?;
    }
    to_human_units(total, decimals).ok()?.checked_mul(price).ok()
}

/// `amount / 10^decimals`, truncated to 18 fractional digits.
fn to_human_units(amount: Uint256, decimals: u32) -> Result<Decimal256, ContractError> {
    let scale = Uint256::from(10u8).checked_pow(decimals)?;
    Decimal256::checked_from_ratio(amount, scale).map_err(|e| ContractError::Internal {
        reason: format!("converting {amount} with {decimals} decimals: {e}"),
    })
}

pub(crate) fn to_signed(amount: Uint256) -> Result<Int256, ContractError> {
    let bytes = amount.to_be_bytes();
    if bytes[0] & 0x80 != 0 {
        return Err(ContractError::Internal {
            reason: format!("amount {amount} exceeds signed 256-bit range"),
        });
    }
    Ok(Int256::from_be_bytes(bytes))
}
