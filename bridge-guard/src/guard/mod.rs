//! Bridge guard engines.
//!
//! - `rate_limit` - USD withdrawal caps and the absolute mint ceiling
//! - `evidence` - bad-signature evidence and idempotent jailing
//!
//! Both engines are plain functions over an explicit context. The context
//! carries the ledger store plus every collaborator the engines consult, so
//! the contract entry points and the unit tests wire in different
//! implementations without any global state.

use common::{EthAddress, OutgoingTxBatch};
use cosmwasm_std::{Decimal256, StdResult, Storage};

pub mod evidence;
pub mod rate_limit;

#[cfg(test)]
pub(crate) mod testing;

pub use evidence::{
    check_bad_signature_evidence, get_past_eth_signature_checkpoint, is_validator_slashed,
    set_past_eth_signature_checkpoint, BadSignatureEvidence, SignedSubject, SlashOutcome,
    SubjectAny, BATCH_TYPE_URL, VALSET_TYPE_URL,
};
pub use rate_limit::{
    check_absolute_limit, check_rate_limit, delete_rate_limit, get_mint_amount, get_rate_limit,
    get_rate_limits, set_rate_limit, track_token_inflow, track_token_mint, track_token_outflow,
    OutflowOutcome,
};

// ============================================================================
// Collaborators
// ============================================================================

/// USD price lookup by price-feed id.
pub trait PriceOracle {
    /// `None` when the feed has no usable price.
    fn price(
        &self,
        storage: &dyn Storage,
        price_id: &str,
        quote: &str,
    ) -> StdResult<Option<Decimal256>>;
}

/// A validator as resolved by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    pub operator: String,
    /// Empty when the registry cannot resolve a consensus key
    pub consensus_address: String,
    pub jailed: bool,
}

/// Ethereum-address-to-validator resolution and the jailing action.
pub trait ValidatorRegistry {
    fn validator_for_eth_address(
        &self,
        storage: &dyn Storage,
        address: &EthAddress,
    ) -> StdResult<Option<Validator>>;

    fn is_jailed(&self, storage: &dyn Storage, validator: &Validator) -> StdResult<bool>;

    fn jail(&self, storage: &mut dyn Storage, consensus_address: &str) -> StdResult<()>;
}

/// ECDSA signer recovery over a checkpoint.
pub trait SignatureRecovery {
    /// Recover the address that produced a 65-byte `[R || S || V]` signature.
    fn recover_address(&self, checkpoint: &[u8; 32], signature: &[u8]) -> StdResult<EthAddress>;
}

/// Batches built for the EVM chain but not yet executed there.
pub trait BatchStore {
    fn pending_batches(
        &self,
        storage: &dyn Storage,
        token: &EthAddress,
    ) -> StdResult<Vec<OutgoingTxBatch>>;
}

/// Token origin lookup.
pub trait TokenRegistry {
    /// `true` for tokens that originate on this chain, which the bridge never mints.
    fn is_native_originated(&self, storage: &dyn Storage, token: &EthAddress) -> StdResult<bool>;
}

/// The collaborator handles shared by every guard operation.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub oracle: &'a dyn PriceOracle,
    pub validators: &'a dyn ValidatorRegistry,
    pub recovery: &'a dyn SignatureRecovery,
    pub batches: &'a dyn BatchStore,
    pub tokens: &'a dyn TokenRegistry,
}

// ============================================================================
// Contexts
// ============================================================================

/// Context for operations that write to the ledger.
pub struct GuardContext<'a> {
    pub storage: &'a mut dyn Storage,
    /// Height stamped on tracked transfers
    pub block_height: u64,
    /// Bridge instance id as a bytes32
    pub peggy_id: [u8; 32],
    pub collaborators: Collaborators<'a>,
}

impl<'a> GuardContext<'a> {
    /// Read-only view over the same store and collaborators.
    pub fn view(&self) -> GuardView<'_> {
        GuardView {
            storage: &*self.storage,
            peggy_id: self.peggy_id,
            collaborators: self.collaborators,
        }
    }
}

/// Context for checks that only read the ledger.
pub struct GuardView<'a> {
    pub storage: &'a dyn Storage,
    pub peggy_id: [u8; 32],
    pub collaborators: Collaborators<'a>,
}
