//! Execute handlers for the bridge guard contract.
//!
//! - `admin` - Admin transfer, operators, validator and native token registry
//! - `config` - Rate limit management
//! - `flow` - Operator-reported prices, batches, deposits and valsets
//! - `evidence` - Bad-signature evidence submission

mod admin;
mod config;
mod evidence;
mod flow;

pub use admin::*;
pub use config::*;
pub use evidence::*;
pub use flow::*;

use common::EthAddress;
use cosmwasm_std::{Addr, Storage};

use crate::error::ContractError;
use crate::state::{Config, CONFIG, OPERATORS};

/// Load config, failing unless `sender` is the admin.
pub(crate) fn ensure_admin(storage: &dyn Storage, sender: &Addr) -> Result<Config, ContractError> {
    let config = CONFIG.load(storage)?;
    if *sender != config.admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(config)
}

/// Load config, failing unless `sender` is an active operator or the admin.
pub(crate) fn ensure_operator(
    storage: &dyn Storage,
    sender: &Addr,
) -> Result<Config, ContractError> {
    let config = CONFIG.load(storage)?;
    let is_operator = OPERATORS.may_load(storage, sender)?.unwrap_or(false);
    if !is_operator && *sender != config.admin {
        return Err(ContractError::UnauthorizedOperator);
    }
    Ok(config)
}

pub(crate) fn parse_eth_address(input: &str) -> Result<EthAddress, ContractError> {
    EthAddress::parse(input).map_err(|e| ContractError::InvalidAddress {
        reason: e.to_string(),
    })
}
