//! Bridge Guard Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `guard/` - Rate limiter and evidence slasher engines
//! - `host` - Contract-hosted collaborators wired into the engines
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_add_operator, execute_confirm_batch, execute_create_batch, execute_create_rate_limit,
    execute_observe_deposit, execute_record_valset, execute_register_native_token,
    execute_register_validator, execute_remove_operator, execute_remove_rate_limit,
    execute_submit_bad_signature_evidence, execute_unjail_validator, execute_update_admin,
    execute_update_price, execute_update_rate_limit,
};
use crate::hash::string_to_bytes32;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_compute_checkpoint, query_config, query_is_slashed, query_mint_amount,
    query_operators, query_past_checkpoint, query_pending_batches, query_price, query_rate_limit,
    query_rate_limits, query_simulate_rate_limit, query_validator,
    query_validator_by_eth_address,
};
use crate::state::{Config, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, OPERATORS};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = deps.api.addr_validate(&msg.admin)?;

    // Bridge id must fit the bytes32 bound into every checkpoint
    if msg.peggy_id.trim().is_empty() {
        return Err(ContractError::InvalidPeggyId {
            reason: "peggy id must not be empty".to_string(),
        });
    }
    string_to_bytes32(&msg.peggy_id).map_err(|e| ContractError::InvalidPeggyId {
        reason: e.to_string(),
    })?;

    let config = Config {
        admin,
        peggy_id: msg.peggy_id,
    };
    CONFIG.save(deps.storage, &config)?;

    let mut operator_count = 0u32;
    for operator_str in msg.operators {
        let operator = deps.api.addr_validate(&operator_str)?;
        OPERATORS.save(deps.storage, &operator, &true)?;
        operator_count += 1;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("admin", config.admin)
        .add_attribute("peggy_id", config.peggy_id)
        .add_attribute("operator_count", operator_count.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Admin
        ExecuteMsg::UpdateAdmin { new_admin } => execute_update_admin(deps, info, new_admin),
        ExecuteMsg::AddOperator { operator } => execute_add_operator(deps, info, operator),
        ExecuteMsg::RemoveOperator { operator } => execute_remove_operator(deps, info, operator),

        // Rate limits
        ExecuteMsg::CreateRateLimit {
            token_address,
            token_decimals,
            token_price_id,
            rate_limit_usd,
            absolute_mint_limit,
        } => execute_create_rate_limit(
            deps,
            info,
            token_address,
            token_decimals,
            token_price_id,
            rate_limit_usd,
            absolute_mint_limit,
        ),
        ExecuteMsg::UpdateRateLimit {
            token_address,
            token_price_id,
            rate_limit_usd,
            absolute_mint_limit,
        } => execute_update_rate_limit(
            deps,
            info,
            token_address,
            token_price_id,
            rate_limit_usd,
            absolute_mint_limit,
        ),
        ExecuteMsg::RemoveRateLimit { token_address } => {
            execute_remove_rate_limit(deps, info, token_address)
        }

        // Registries
        ExecuteMsg::RegisterValidator {
            operator,
            consensus_address,
            eth_address,
        } => execute_register_validator(deps, info, operator, consensus_address, eth_address),
        ExecuteMsg::UnjailValidator { consensus_address } => {
            execute_unjail_validator(deps, info, consensus_address)
        }
        ExecuteMsg::RegisterNativeToken {
            token_address,
            denom,
        } => execute_register_native_token(deps, info, token_address, denom),

        // Operator reports
        ExecuteMsg::UpdatePrice { price_id, price } => {
            execute_update_price(deps, info, price_id, price)
        }
        ExecuteMsg::CreateBatch {
            token_contract,
            batch_nonce,
            batch_timeout,
            transactions,
        } => execute_create_batch(
            deps,
            env,
            info,
            token_contract,
            batch_nonce,
            batch_timeout,
            transactions,
        ),
        ExecuteMsg::ConfirmBatch {
            token_contract,
            batch_nonce,
        } => execute_confirm_batch(deps, env, info, token_contract, batch_nonce),
        ExecuteMsg::ObserveDeposit {
            token_contract,
            amount,
        } => execute_observe_deposit(deps, env, info, token_contract, amount),
        ExecuteMsg::RecordValset { valset } => execute_record_valset(deps, info, valset),

        // Evidence
        ExecuteMsg::SubmitBadSignatureEvidence { subject, signature } => {
            execute_submit_bad_signature_evidence(deps, env, info, subject, signature)
        }
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Operators {} => to_json_binary(&query_operators(deps)?),

        // Rate limits
        QueryMsg::RateLimit { token_address } => {
            to_json_binary(&query_rate_limit(deps, token_address)?)
        }
        QueryMsg::RateLimits { start_after, limit } => {
            to_json_binary(&query_rate_limits(deps, start_after, limit)?)
        }
        QueryMsg::MintAmount { token_address } => {
            to_json_binary(&query_mint_amount(deps, token_address)?)
        }
        QueryMsg::SimulateRateLimit {
            token_address,
            transactions,
        } => to_json_binary(&query_simulate_rate_limit(
            deps,
            token_address,
            transactions,
        )?),

        // Evidence
        QueryMsg::PastCheckpoint { checkpoint } => {
            to_json_binary(&query_past_checkpoint(deps, checkpoint)?)
        }
        QueryMsg::IsSlashed {
            checkpoint,
            consensus_address,
        } => to_json_binary(&query_is_slashed(deps, checkpoint, consensus_address)?),
        QueryMsg::ComputeCheckpoint { subject } => {
            to_json_binary(&query_compute_checkpoint(deps, subject)?)
        }

        // Collaborators
        QueryMsg::Validator { consensus_address } => {
            to_json_binary(&query_validator(deps, consensus_address)?)
        }
        QueryMsg::ValidatorByEthAddress { eth_address } => {
            to_json_binary(&query_validator_by_eth_address(deps, eth_address)?)
        }
        QueryMsg::Price { price_id } => to_json_binary(&query_price(deps, price_id)?),
        QueryMsg::PendingBatches { token_contract } => {
            to_json_binary(&query_pending_batches(deps, token_contract)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use cosmwasm_std::{from_json, Addr};

    use crate::msg::{ConfigResponse, OperatorsResponse};

    fn instantiate_msg(peggy_id: &str) -> InstantiateMsg {
        InstantiateMsg {
            admin: "guard1admin".to_string(),
            peggy_id: peggy_id.to_string(),
            operators: vec!["guard1operator".to_string()],
        }
    }

    #[test]
    fn test_instantiate() {
        let mut deps = mock_dependencies();
        let res = instantiate(
            deps.as_mut(),
            mock_env(),
            mock_info("creator", &[]),
            instantiate_msg("bridge-mainnet-1"),
        )
        .unwrap();
        assert_eq!(res.attributes[0].value, "instantiate");

        let config: ConfigResponse =
            from_json(query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap();
        assert_eq!(config.admin, Addr::unchecked("guard1admin"));
        assert_eq!(config.peggy_id, "bridge-mainnet-1");

        let operators: OperatorsResponse =
            from_json(query(deps.as_ref(), mock_env(), QueryMsg::Operators {}).unwrap()).unwrap();
        assert_eq!(operators.operators, vec![Addr::unchecked("guard1operator")]);

        let version = cw2::get_contract_version(&deps.storage).unwrap();
        assert_eq!(version.contract, CONTRACT_NAME);
        assert_eq!(version.version, CONTRACT_VERSION);
    }

    #[test]
    fn test_instantiate_rejects_bad_peggy_id() {
        let mut deps = mock_dependencies();

        let err = instantiate(
            deps.as_mut(),
            mock_env(),
            mock_info("creator", &[]),
            instantiate_msg(&"x".repeat(33)),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidPeggyId { .. }));

        let err = instantiate(
            deps.as_mut(),
            mock_env(),
            mock_info("creator", &[]),
            instantiate_msg(""),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidPeggyId { .. }));
    }

    #[test]
    fn test_migrate_restamps_version() {
        let mut deps = mock_dependencies();
        instantiate(
            deps.as_mut(),
            mock_env(),
            mock_info("creator", &[]),
            instantiate_msg("bridge"),
        )
        .unwrap();

        let res = migrate(deps.as_mut(), mock_env(), MigrateMsg {}).unwrap();
        assert_eq!(res.attributes[1].value, CONTRACT_VERSION);
    }
}
