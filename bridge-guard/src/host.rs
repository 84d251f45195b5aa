//! Contract-hosted collaborators.
//!
//! Everything the guard engines consult lives in this contract's own storage:
//! operators push prices and batches, the admin registers validators and
//! native tokens. Signer recovery goes through the host `Api`.

use common::{EthAddress, OutgoingTxBatch};
use cosmwasm_std::{Api, Decimal256, Order, StdError, StdResult, Storage};

use crate::guard::{
    BatchStore, Collaborators, GuardContext, GuardView, PriceOracle, SignatureRecovery,
    TokenRegistry, Validator, ValidatorRegistry,
};
use crate::hash::{eth_address_from_pubkey, eth_signed_message_hash, string_to_bytes32};
use crate::state::{
    ValidatorInfo, NATIVE_TOKENS, OUTGOING_BATCHES, PRICES, USD_QUOTE, VALIDATORS,
    VALIDATOR_BY_ETH,
};

// ============================================================================
// Price Oracle
// ============================================================================

/// Latest operator-reported USD price per feed.
pub struct StoredPriceOracle;

impl PriceOracle for StoredPriceOracle {
    fn price(
        &self,
        storage: &dyn Storage,
        price_id: &str,
        quote: &str,
    ) -> StdResult<Option<Decimal256>> {
        if quote != USD_QUOTE {
            return Ok(None);
        }
        PRICES.may_load(storage, price_id)
    }
}

// ============================================================================
// Validator Registry
// ============================================================================

/// Admin-registered bridge validators, indexed by Ethereum signing address.
pub struct StoredValidatorRegistry;

impl StoredValidatorRegistry {
    pub fn load(storage: &dyn Storage, consensus_address: &str) -> StdResult<Option<ValidatorInfo>> {
        VALIDATORS.may_load(storage, consensus_address)
    }
}

impl ValidatorRegistry for StoredValidatorRegistry {
    fn validator_for_eth_address(
        &self,
        storage: &dyn Storage,
        address: &EthAddress,
    ) -> StdResult<Option<Validator>> {
        let Some(consensus_address) = VALIDATOR_BY_ETH.may_load(storage, address.as_bytes())?
        else {
            return Ok(None);
        };
        Ok(Self::load(storage, &consensus_address)?.map(|info| Validator {
            operator: info.operator,
            consensus_address: info.consensus_address,
            jailed: info.jailed,
        }))
    }

    fn is_jailed(&self, storage: &dyn Storage, validator: &Validator) -> StdResult<bool> {
        Ok(Self::load(storage, &validator.consensus_address)?
            .map(|info| info.jailed)
            .unwrap_or(validator.jailed))
    }

    fn jail(&self, storage: &mut dyn Storage, consensus_address: &str) -> StdResult<()> {
        let mut info = Self::load(storage, consensus_address)?.ok_or_else(|| {
            StdError::not_found(format!("validator {consensus_address}"))
        })?;
        info.jailed = true;
        VALIDATORS.save(storage, consensus_address, &info)
    }
}

// ============================================================================
// Signature Recovery
// ============================================================================

/// secp256k1 signer recovery through the host crypto API.
pub struct ApiSignatureRecovery<'a> {
    pub api: &'a dyn Api,
}

impl SignatureRecovery for ApiSignatureRecovery<'_> {
    fn recover_address(&self, checkpoint: &[u8; 32], signature: &[u8]) -> StdResult<EthAddress> {
        if signature.len() != 65 {
            return Err(StdError::generic_err(format!(
                "signature must be 65 bytes, got {}",
                signature.len()
            )));
        }

        let recovery_id = match signature[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            v => {
                return Err(StdError::generic_err(format!(
                    "invalid recovery id {v}"
                )))
            }
        };

        let digest = eth_signed_message_hash(checkpoint);
        let pubkey = self
            .api
            .secp256k1_recover_pubkey(&digest, &signature[..64], recovery_id)
            .map_err(|e| StdError::generic_err(e.to_string()))?;

        eth_address_from_pubkey(&pubkey)
    }
}

// ============================================================================
// Batch Store
// ============================================================================

/// Operator-created batches awaiting confirmation from the EVM chain.
pub struct StoredBatches;

impl BatchStore for StoredBatches {
    fn pending_batches(
        &self,
        storage: &dyn Storage,
        token: &EthAddress,
    ) -> StdResult<Vec<OutgoingTxBatch>> {
        OUTGOING_BATCHES
            .prefix(token.as_bytes())
            .range(storage, None, None, Order::Ascending)
            .map(|item| item.map(|(_, batch)| batch))
            .collect()
    }
}

// ============================================================================
// Token Registry
// ============================================================================

/// Tokens registered as originating on this chain.
pub struct StoredTokenRegistry;

impl TokenRegistry for StoredTokenRegistry {
    fn is_native_originated(&self, storage: &dyn Storage, token: &EthAddress) -> StdResult<bool> {
        Ok(NATIVE_TOKENS.has(storage, token.as_bytes()))
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// One of each hosted collaborator.
pub struct Host<'a> {
    oracle: StoredPriceOracle,
    validators: StoredValidatorRegistry,
    recovery: ApiSignatureRecovery<'a>,
    batches: StoredBatches,
    tokens: StoredTokenRegistry,
}

impl<'a> Host<'a> {
    pub fn new(api: &'a dyn Api) -> Self {
        Self {
            oracle: StoredPriceOracle,
            validators: StoredValidatorRegistry,
            recovery: ApiSignatureRecovery { api },
            batches: StoredBatches,
            tokens: StoredTokenRegistry,
        }
    }

    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            oracle: &self.oracle,
            validators: &self.validators,
            recovery: &self.recovery,
            batches: &self.batches,
            tokens: &self.tokens,
        }
    }

    pub fn context<'s>(
        &'s self,
        storage: &'s mut dyn Storage,
        block_height: u64,
        peggy_id: &str,
    ) -> StdResult<GuardContext<'s>> {
        Ok(GuardContext {
            storage,
            block_height,
            peggy_id: string_to_bytes32(peggy_id)?,
            collaborators: self.collaborators(),
        })
    }

    pub fn view<'s>(&'s self, storage: &'s dyn Storage, peggy_id: &str) -> StdResult<GuardView<'s>> {
        Ok(GuardView {
            storage,
            peggy_id: string_to_bytes32(peggy_id)?,
            collaborators: self.collaborators(),
        })
    }
}
