//! Bad-signature evidence handler.

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response};

use crate::error::ContractError;
use crate::guard::{check_bad_signature_evidence, BadSignatureEvidence, SubjectAny};
use crate::hash::bytes32_to_hex;
use crate::host::Host;
use crate::state::CONFIG;

/// Submit proof that a validator signed a checkpoint the bridge never requested.
///
/// Open to any sender. The signer is jailed at most once per checkpoint.
pub fn execute_submit_bad_signature_evidence(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    subject: SubjectAny,
    signature: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    let evidence = BadSignatureEvidence {
        subject,
        signature,
    };

    let host = Host::new(deps.api);
    let mut ctx = host.context(deps.storage, env.block.height, &config.peggy_id)?;
    let outcome = check_bad_signature_evidence(&mut ctx, &evidence)?;

    Ok(Response::new()
        .add_attribute("action", "submit_bad_signature_evidence")
        .add_attribute("submitter", info.sender)
        .add_attribute("subject_type", evidence.subject.type_url)
        .add_attribute("checkpoint", bytes32_to_hex(&outcome.checkpoint))
        .add_attribute("validator", outcome.operator)
        .add_attribute("consensus_address", outcome.consensus_address)
        .add_attribute("jailed", outcome.jailed_now.to_string()))
}
