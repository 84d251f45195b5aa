//! Subjects signed by bridge validators for submission to the EVM chain.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;

/// An ERC20 amount on the EVM side of the bridge.
#[cw_serde]
pub struct Erc20Token {
    /// ERC20 contract address (hex)
    pub contract: String,
    pub amount: Uint256,
}

/// A single withdrawal queued for release on the EVM chain.
#[cw_serde]
pub struct OutgoingTransferTx {
    pub id: u64,
    /// Sender on this chain
    pub sender: String,
    /// Recipient on the EVM chain (hex)
    pub dest_address: String,
    /// Principal being withdrawn
    pub erc20_token: Erc20Token,
    /// Fee paid to the relayer that submits the batch
    pub erc20_fee: Erc20Token,
}

impl OutgoingTransferTx {
    /// Principal plus fee.
    pub fn total(&self) -> Result<Uint256, cosmwasm_std::OverflowError> {
        self.erc20_token.amount.checked_add(self.erc20_fee.amount)
    }
}

/// A batch of withdrawals for one token, signed as a unit.
#[cw_serde]
pub struct OutgoingTxBatch {
    pub batch_nonce: u64,
    /// EVM block height after which the batch can no longer be submitted
    pub batch_timeout: u64,
    pub transactions: Vec<OutgoingTransferTx>,
    /// ERC20 contract address (hex) shared by every transaction in the batch
    pub token_contract: String,
    /// Block height on this chain at which the batch was created
    pub block: u64,
}

/// A validator as it appears in a signed validator set.
#[cw_serde]
pub struct BridgeValidator {
    pub power: u64,
    pub ethereum_address: String,
}

/// A validator set update signed for the EVM chain.
#[cw_serde]
pub struct Valset {
    pub nonce: u64,
    pub members: Vec<BridgeValidator>,
    pub height: u64,
    pub reward_amount: Uint256,
    /// Reward token (hex); empty means no reward
    pub reward_token: String,
}
