//! Admin handlers.
//!
//! This module handles:
//! - Admin transfer
//! - Operator management (add/remove)
//! - Validator registry (register/unjail)
//! - Native token registry

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use super::{ensure_admin, parse_eth_address};
use crate::error::ContractError;
use crate::state::{
    ValidatorInfo, CONFIG, NATIVE_TOKENS, OPERATORS, VALIDATORS, VALIDATOR_BY_ETH,
};

// ============================================================================
// Admin Transfer
// ============================================================================

/// Replace the admin address.
pub fn execute_update_admin(
    deps: DepsMut,
    info: MessageInfo,
    new_admin: String,
) -> Result<Response, ContractError> {
    let mut config = ensure_admin(deps.storage, &info.sender)?;

    config.admin = deps.api.addr_validate(&new_admin)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_admin")
        .add_attribute("old_admin", info.sender)
        .add_attribute("new_admin", config.admin))
}

// ============================================================================
// Operator Management
// ============================================================================

/// Add a new operator.
pub fn execute_add_operator(
    deps: DepsMut,
    info: MessageInfo,
    operator: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let operator_addr = deps.api.addr_validate(&operator)?;
    let existing = OPERATORS
        .may_load(deps.storage, &operator_addr)?
        .unwrap_or(false);
    if existing {
        return Err(ContractError::OperatorAlreadyRegistered);
    }

    OPERATORS.save(deps.storage, &operator_addr, &true)?;

    Ok(Response::new()
        .add_attribute("action", "add_operator")
        .add_attribute("operator", operator))
}

/// Remove an operator.
pub fn execute_remove_operator(
    deps: DepsMut,
    info: MessageInfo,
    operator: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let operator_addr = deps.api.addr_validate(&operator)?;
    let existing = OPERATORS
        .may_load(deps.storage, &operator_addr)?
        .unwrap_or(false);
    if !existing {
        return Err(ContractError::OperatorNotRegistered);
    }

    OPERATORS.remove(deps.storage, &operator_addr);

    Ok(Response::new()
        .add_attribute("action", "remove_operator")
        .add_attribute("operator", operator))
}

// ============================================================================
// Validator Registry
// ============================================================================

/// Register a bridge validator and index it by Ethereum signing address.
pub fn execute_register_validator(
    deps: DepsMut,
    info: MessageInfo,
    operator: String,
    consensus_address: String,
    eth_address: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    if operator.trim().is_empty() || consensus_address.trim().is_empty() {
        return Err(ContractError::InvalidAddress {
            reason: "operator and consensus address must not be empty".to_string(),
        });
    }
    let eth = parse_eth_address(&eth_address)?;

    if VALIDATORS.has(deps.storage, &consensus_address) {
        return Err(ContractError::ValidatorAlreadyRegistered { consensus_address });
    }
    if VALIDATOR_BY_ETH.has(deps.storage, eth.as_bytes()) {
        return Err(ContractError::EthAddressTaken {
            eth_address: eth.to_string(),
        });
    }

    let validator = ValidatorInfo {
        operator,
        consensus_address: consensus_address.clone(),
        eth_address: eth.to_string(),
        jailed: false,
    };
    VALIDATORS.save(deps.storage, &consensus_address, &validator)?;
    VALIDATOR_BY_ETH.save(deps.storage, eth.as_bytes(), &consensus_address)?;

    Ok(Response::new()
        .add_attribute("action", "register_validator")
        .add_attribute("operator", validator.operator)
        .add_attribute("consensus_address", consensus_address)
        .add_attribute("eth_address", validator.eth_address))
}

/// Clear a validator's jailed flag.
pub fn execute_unjail_validator(
    deps: DepsMut,
    info: MessageInfo,
    consensus_address: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let mut validator = VALIDATORS
        .may_load(deps.storage, &consensus_address)?
        .ok_or_else(|| ContractError::ValidatorNotFound {
            consensus_address: consensus_address.clone(),
        })?;
    if !validator.jailed {
        return Err(ContractError::ValidatorNotJailed { consensus_address });
    }

    validator.jailed = false;
    VALIDATORS.save(deps.storage, &consensus_address, &validator)?;

    Ok(Response::new()
        .add_attribute("action", "unjail_validator")
        .add_attribute("consensus_address", consensus_address))
}

// ============================================================================
// Native Token Registry
// ============================================================================

/// Register the ERC20 representation of a token that originates on this chain.
pub fn execute_register_native_token(
    deps: DepsMut,
    info: MessageInfo,
    token_address: String,
    denom: String,
) -> Result<Response, ContractError> {
    ensure_admin(deps.storage, &info.sender)?;

    let token = parse_eth_address(&token_address)?;
    if denom.trim().is_empty() {
        return Err(ContractError::InvalidAddress {
            reason: "denom must not be empty".to_string(),
        });
    }

    NATIVE_TOKENS.save(deps.storage, token.as_bytes(), &denom)?;

    Ok(Response::new()
        .add_attribute("action", "register_native_token")
        .add_attribute("token", token.to_string())
        .add_attribute("denom", denom))
}
