//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

use common::{EthAddress, OutgoingTxBatch};
use cosmwasm_std::testing::MockStorage;
use cosmwasm_std::{Decimal256, StdError, StdResult, Storage};

use super::{
    BatchStore, Collaborators, GuardContext, GuardView, PriceOracle, SignatureRecovery,
    TokenRegistry, Validator, ValidatorRegistry,
};

pub const TEST_PEGGY_ID: [u8; 32] = *b"test-bridge\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";

#[derive(Default)]
pub struct MockOracle {
    pub prices: HashMap<String, Decimal256>,
}

impl PriceOracle for MockOracle {
    fn price(
        &self,
        _storage: &dyn Storage,
        price_id: &str,
        quote: &str,
    ) -> StdResult<Option<Decimal256>> {
        assert_eq!(quote, "USD");
        Ok(self.prices.get(price_id).copied())
    }
}

#[derive(Default)]
pub struct MockRegistry {
    pub by_eth: HashMap<EthAddress, Validator>,
    pub jailed: RefCell<BTreeSet<String>>,
    pub jail_calls: Cell<u32>,
    pub fail_jail: Cell<bool>,
}

impl MockRegistry {
    pub fn with_validator(eth: EthAddress, consensus_address: &str) -> Self {
        let mut registry = Self::default();
        registry.by_eth.insert(
            eth,
            Validator {
                operator: format!("valoper-{consensus_address}"),
                consensus_address: consensus_address.to_string(),
                jailed: false,
            },
        );
        registry
    }
}

impl ValidatorRegistry for MockRegistry {
    fn validator_for_eth_address(
        &self,
        _storage: &dyn Storage,
        address: &EthAddress,
    ) -> StdResult<Option<Validator>> {
        Ok(self.by_eth.get(address).cloned())
    }

    fn is_jailed(&self, _storage: &dyn Storage, validator: &Validator) -> StdResult<bool> {
        Ok(validator.jailed
            || self
                .jailed
                .borrow()
                .contains(&validator.consensus_address))
    }

    fn jail(&self, _storage: &mut dyn Storage, consensus_address: &str) -> StdResult<()> {
        self.jail_calls.set(self.jail_calls.get() + 1);
        if self.fail_jail.get() {
            return Err(StdError::generic_err("staking module unavailable"));
        }
        self.jailed.borrow_mut().insert(consensus_address.to_string());
        Ok(())
    }
}

/// Maps a signature's first byte to a signer.
#[derive(Default)]
pub struct MockRecovery {
    pub signers: HashMap<u8, EthAddress>,
}

impl SignatureRecovery for MockRecovery {
    fn recover_address(&self, _checkpoint: &[u8; 32], signature: &[u8]) -> StdResult<EthAddress> {
        if signature.len() != 65 {
            return Err(StdError::generic_err("signature must be 65 bytes"));
        }
        self.signers
            .get(&signature[0])
            .copied()
            .ok_or_else(|| StdError::generic_err("invalid signature"))
    }
}

#[derive(Default)]
pub struct MockBatches {
    pub batches: Vec<OutgoingTxBatch>,
}

impl BatchStore for MockBatches {
    fn pending_batches(
        &self,
        _storage: &dyn Storage,
        token: &EthAddress,
    ) -> StdResult<Vec<OutgoingTxBatch>> {
        Ok(self
            .batches
            .iter()
            .filter(|b| EthAddress::parse(&b.token_contract).ok().as_ref() == Some(token))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockTokens {
    pub native: BTreeSet<EthAddress>,
}

impl TokenRegistry for MockTokens {
    fn is_native_originated(&self, _storage: &dyn Storage, token: &EthAddress) -> StdResult<bool> {
        Ok(self.native.contains(token))
    }
}

/// Owns a store and one of each mock collaborator.
#[derive(Default)]
pub struct TestEnv {
    pub storage: MockStorage,
    pub oracle: MockOracle,
    pub registry: MockRegistry,
    pub recovery: MockRecovery,
    pub batches: MockBatches,
    pub tokens: MockTokens,
}

impl TestEnv {
    pub fn ctx(&mut self, block_height: u64) -> GuardContext<'_> {
        GuardContext {
            storage: &mut self.storage,
            block_height,
            peggy_id: TEST_PEGGY_ID,
            collaborators: Collaborators {
                oracle: &self.oracle,
                validators: &self.registry,
                recovery: &self.recovery,
                batches: &self.batches,
                tokens: &self.tokens,
            },
        }
    }

    pub fn view(&self) -> GuardView<'_> {
        GuardView {
            storage: &self.storage,
            peggy_id: TEST_PEGGY_ID,
            collaborators: Collaborators {
                oracle: &self.oracle,
                validators: &self.registry,
                recovery: &self.recovery,
                batches: &self.batches,
                tokens: &self.tokens,
            },
        }
    }
}
