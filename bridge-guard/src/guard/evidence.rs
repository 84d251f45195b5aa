//! Bad-signature evidence.
//!
//! A validator that signs a checkpoint the bridge never asked for has signed a
//! forgery the EVM contract would accept. Anyone may submit the subject and
//! the signature; if the checkpoint is not in the archive of legitimately
//! requested checkpoints, the signer is jailed once per (checkpoint, validator).

use common::{OutgoingTxBatch, Valset};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Binary, StdResult, Storage};

use super::GuardContext;
use crate::error::ContractError;
use crate::hash::{batch_checkpoint, bytes32_to_hex, valset_checkpoint};
use crate::state::{MARKER, PAST_CHECKPOINTS, SLASHED_CHECKPOINTS};

pub const BATCH_TYPE_URL: &str = "/peggy.v1.OutgoingTxBatch";
pub const VALSET_TYPE_URL: &str = "/peggy.v1.Valset";

/// Type-url envelope around a JSON-encoded signed subject.
#[cw_serde]
pub struct SubjectAny {
    pub type_url: String,
    pub value: Binary,
}

/// Every subject a bridge validator signs for the EVM chain.
#[cw_serde]
pub enum SignedSubject {
    Batch(OutgoingTxBatch),
    Valset(Valset),
}

impl SignedSubject {
    /// Decode the envelope; unknown type urls (logic calls included) are refused.
    pub fn unpack(any: &SubjectAny) -> Result<Self, ContractError> {
        let invalid = |e: cosmwasm_std::StdError| ContractError::InvalidEvidenceSubject {
            reason: e.to_string(),
        };
        match any.type_url.as_str() {
            BATCH_TYPE_URL => Ok(Self::Batch(from_json(&any.value).map_err(invalid)?)),
            VALSET_TYPE_URL => Ok(Self::Valset(from_json(&any.value).map_err(invalid)?)),
            other => Err(ContractError::UnsupportedEvidenceSubject {
                type_url: other.to_string(),
            }),
        }
    }

    pub fn pack(&self) -> StdResult<SubjectAny> {
        Ok(match self {
            Self::Batch(batch) => SubjectAny {
                type_url: BATCH_TYPE_URL.to_string(),
                value: to_json_binary(batch)?,
            },
            Self::Valset(valset) => SubjectAny {
                type_url: VALSET_TYPE_URL.to_string(),
                value: to_json_binary(valset)?,
            },
        })
    }

    /// Canonical checkpoint under the given bridge id.
    pub fn checkpoint(&self, peggy_id: &[u8; 32]) -> Result<[u8; 32], ContractError> {
        let checkpoint = match self {
            Self::Batch(batch) => batch_checkpoint(peggy_id, batch),
            Self::Valset(valset) => valset_checkpoint(peggy_id, valset),
        };
        checkpoint.map_err(|e| ContractError::InvalidEvidenceSubject {
            reason: e.to_string(),
        })
    }
}

/// A claim that some validator signed `subject`.
#[cw_serde]
pub struct BadSignatureEvidence {
    pub subject: SubjectAny,
    /// Hex `[R || S || V]`, optional `0x` prefix
    pub signature: String,
}

/// What a successful evidence submission did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashOutcome {
    pub checkpoint: [u8; 32],
    pub operator: String,
    pub consensus_address: String,
    /// `false` when the validator was already jailed and only the mark was written
    pub jailed_now: bool,
}

/// Validate evidence of a forged signature and jail the signer.
///
/// Nothing is written until every check has passed. A failed jail leaves no
/// slash mark behind, so the same evidence can be resubmitted.
pub fn check_bad_signature_evidence(
    ctx: &mut GuardContext,
    evidence: &BadSignatureEvidence,
) -> Result<SlashOutcome, ContractError> {
    let subject = SignedSubject::unpack(&evidence.subject)?;

    // 1. Checkpoint under this bridge's id
    let checkpoint = subject.checkpoint(&ctx.peggy_id)?;
    let checkpoint_hex = bytes32_to_hex(&checkpoint);

    // 2. A requested checkpoint is not a forgery
    if get_past_eth_signature_checkpoint(ctx.storage, &checkpoint)? {
        return Err(ContractError::CheckpointExists {
            checkpoint: checkpoint_hex,
        });
    }

    // 3. Signature bytes
    let signature_hex = evidence
        .signature
        .strip_prefix("0x")
        .unwrap_or(&evidence.signature);
    let signature =
        hex::decode(signature_hex).map_err(|e| ContractError::InvalidSignatureEncoding {
            reason: e.to_string(),
        })?;

    // 4. Signer
    let eth_address = ctx
        .collaborators
        .recovery
        .recover_address(&checkpoint, &signature)
        .map_err(|e| ContractError::SignatureRecoveryFailed {
            checkpoint: checkpoint_hex.clone(),
            signature: evidence.signature.clone(),
            reason: e.to_string(),
        })?;

    // 5. Validator behind the signer
    let validator = ctx
        .collaborators
        .validators
        .validator_for_eth_address(ctx.storage, &eth_address)?
        .ok_or_else(|| ContractError::UnknownSigner {
            eth_address: eth_address.to_string(),
        })?;

    // 6. Consensus identity
    if validator.consensus_address.is_empty() {
        return Err(ContractError::MissingConsensusAddress {
            validator: validator.operator,
        });
    }
    let consensus_address = validator.consensus_address.clone();

    // 7. Once per (checkpoint, validator)
    if is_validator_slashed(ctx.storage, &checkpoint, &consensus_address)? {
        return Err(ContractError::AlreadySlashed {
            checkpoint: checkpoint_hex,
            signature: evidence.signature.clone(),
        });
    }

    // 8. Jail
    let already_jailed = ctx
        .collaborators
        .validators
        .is_jailed(ctx.storage, &validator)?;
    if !already_jailed {
        ctx.collaborators
            .validators
            .jail(ctx.storage, &consensus_address)
            .map_err(|e| ContractError::JailFailed {
                consensus_address: consensus_address.clone(),
                reason: e.to_string(),
            })?;
    }

    // 9. Mark
    SLASHED_CHECKPOINTS.save(
        ctx.storage,
        (checkpoint.as_slice(), consensus_address.as_str()),
        &MARKER,
    )?;

    Ok(SlashOutcome {
        checkpoint,
        operator: validator.operator,
        consensus_address,
        jailed_now: !already_jailed,
    })
}

// ============================================================================
// Checkpoint archive and slash marks
// ============================================================================

/// Archive a checkpoint the bridge legitimately asked validators to sign.
pub fn set_past_eth_signature_checkpoint(
    storage: &mut dyn Storage,
    checkpoint: &[u8; 32],
) -> StdResult<()> {
    PAST_CHECKPOINTS.save(storage, checkpoint.as_slice(), &MARKER)
}

pub fn get_past_eth_signature_checkpoint(
    storage: &dyn Storage,
    checkpoint: &[u8; 32],
) -> StdResult<bool> {
    Ok(PAST_CHECKPOINTS.has(storage, checkpoint.as_slice()))
}

pub fn is_validator_slashed(
    storage: &dyn Storage,
    checkpoint: &[u8; 32],
    consensus_address: &str,
) -> StdResult<bool> {
    Ok(SLASHED_CHECKPOINTS.has(storage, (checkpoint.as_slice(), consensus_address)))
}
