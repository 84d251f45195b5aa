//! Rate limit management handlers.

use cosmwasm_std::{Decimal256, DepsMut, MessageInfo, Response, Uint256};

use super::{ensure_admin, parse_eth_address};
use crate::error::ContractError;
use crate::guard::{delete_rate_limit, get_rate_limit, set_rate_limit};
use crate::state::{RateLimit, MAX_TOKEN_DECIMALS};

/// Start rate limiting a token.
pub fn execute_create_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    token_address: String,
    token_decimals: u32,
    token_price_id: String,
    rate_limit_usd: Decimal256,
    absolute_mint_limit: Uint256,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_address)?;
    if get_rate_limit(deps.storage, &token)?.is_some() {
        return Err(ContractError::RateLimitAlreadyExists {
            token: token.to_string(),
        });
    }

    let rate_limit = RateLimit {
        token_address: token.to_string(),
        token_decimals,
        token_price_id,
        rate_limit_usd,
        absolute_mint_limit,
        transfers: vec![],
    };
    validate_rate_limit(&rate_limit)?;
    set_rate_limit(deps.storage, &token, &rate_limit)?;

    Ok(Response::new()
        .add_attribute("action", "create_rate_limit")
        .add_attribute("token", rate_limit.token_address)
        .add_attribute("token_decimals", token_decimals.to_string())
        .add_attribute("token_price_id", rate_limit.token_price_id)
        .add_attribute("rate_limit_usd", rate_limit_usd.to_string())
        .add_attribute("absolute_mint_limit", absolute_mint_limit.to_string()))
}

/// Change rate limit parameters, keeping the transfer ledger.
pub fn execute_update_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    token_address: String,
    token_price_id: Option<String>,
    rate_limit_usd: Option<Decimal256>,
    absolute_mint_limit: Option<Uint256>,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_address)?;
    let mut rate_limit =
        get_rate_limit(deps.storage, &token)?.ok_or_else(|| ContractError::RateLimitNotFound {
            token: token.to_string(),
        })?;

    if let Some(price_id) = token_price_id {
        rate_limit.token_price_id = price_id;
    }
    if let Some(cap) = rate_limit_usd {
        rate_limit.rate_limit_usd = cap;
    }
    if let Some(limit) = absolute_mint_limit {
        rate_limit.absolute_mint_limit = limit;
    }
    validate_rate_limit(&rate_limit)?;
    set_rate_limit(deps.storage, &token, &rate_limit)?;

    Ok(Response::new()
        .add_attribute("action", "update_rate_limit")
        .add_attribute("token", rate_limit.token_address)
        .add_attribute("token_price_id", rate_limit.token_price_id)
        .add_attribute("rate_limit_usd", rate_limit.rate_limit_usd.to_string())
        .add_attribute(
            "absolute_mint_limit",
            rate_limit.absolute_mint_limit.to_string(),
        )
        .add_attribute("transfers", rate_limit.transfers.len().to_string()))
}

/// Remove a rate limit and the token's mint counter.
pub fn execute_remove_rate_limit(
    deps: DepsMut,
    info: MessageInfo,
    token_address: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_address)?;
    if get_rate_limit(deps.storage, &token)?.is_none() {
        return Err(ContractError::RateLimitNotFound {
            token: token.to_string(),
        });
    }
    delete_rate_limit(deps.storage, &token);

    Ok(Response::new()
        .add_attribute("action", "remove_rate_limit")
        .add_attribute("token", token.to_string()))
}

fn validate_rate_limit(rate_limit: &RateLimit) -> Result<(), ContractError> {
    if rate_limit.token_price_id.trim().is_empty() {
        return Err(ContractError::InvalidRateLimit {
            reason: "token price id must not be empty".to_string(),
        });
    }
    if rate_limit.rate_limit_usd.is_zero() {
        return Err(ContractError::InvalidRateLimit {
            reason: "USD rate limit must be positive".to_string(),
        });
    }
    if rate_limit.token_decimals > MAX_TOKEN_DECIMALS {
        return Err(ContractError::InvalidRateLimit {
            reason: format!(
                "token decimals {} exceed maximum {}",
                rate_limit.token_decimals, MAX_TOKEN_DECIMALS
            ),
        });
    }
    Ok(())
}
