//! Bad-signature evidence integration tests.
//!
//! Validators sign with real secp256k1 keys so signer recovery runs through
//! the host crypto API exactly as it does on chain.

use cosmwasm_std::{Addr, Decimal256, Uint256};
use cw_multi_test::{App, AppResponse, ContractWrapper, Executor};
use k256::ecdsa::SigningKey;

use bridge_guard::guard::{SignedSubject, SubjectAny};
use bridge_guard::hash::{
    eth_address_from_pubkey, eth_signed_message_hash, string_to_bytes32,
};
use bridge_guard::msg::{
    ComputeCheckpointResponse, ExecuteMsg, InstantiateMsg, IsSlashedResponse,
    PastCheckpointResponse, QueryMsg, ValidatorResponse,
};
use common::{BridgeValidator, Erc20Token, EthAddress, OutgoingTransferTx, OutgoingTxBatch, Valset};

const PEGGY_ID: &str = "bridge-testnet";
const TOKEN: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
const CONSENSUS: &str = "guardvalcons1alice";

// ============================================================================
// Test Setup
// ============================================================================

fn contract_guard() -> Box<dyn cw_multi_test::Contract<cosmwasm_std::Empty>> {
    let contract = ContractWrapper::new(
        bridge_guard::contract::execute,
        bridge_guard::contract::instantiate,
        bridge_guard::contract::query,
    );
    Box::new(contract)
}

struct TestEnv {
    app: App,
    contract_addr: Addr,
    admin: Addr,
    operator: Addr,
    reporter: Addr,
    validator_key: SigningKey,
}

fn eth_address(key: &SigningKey) -> EthAddress {
    let point = key.verifying_key().to_encoded_point(false);
    eth_address_from_pubkey(point.as_bytes()).unwrap()
}

/// `[R || S || V]` hex over the EIP-191 digest of `checkpoint`, V in {27, 28}.
fn sign_checkpoint(key: &SigningKey, checkpoint: &[u8; 32]) -> String {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&eth_signed_message_hash(checkpoint))
        .unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

fn setup() -> TestEnv {
    let mut app = App::default();
    let admin = Addr::unchecked("guard1admin");
    let operator = Addr::unchecked("guard1operator");
    let reporter = Addr::unchecked("guard1reporter");
    let validator_key = SigningKey::from_slice(&[0x11; 32]).unwrap();

    let code_id = app.store_code(contract_guard());
    let contract_addr = app
        .instantiate_contract(
            code_id,
            admin.clone(),
            &InstantiateMsg {
                admin: admin.to_string(),
                peggy_id: PEGGY_ID.to_string(),
                operators: vec![operator.to_string()],
            },
            &[],
            "bridge-guard",
            Some(admin.to_string()),
        )
        .unwrap();

    app.execute_contract(
        admin.clone(),
        contract_addr.clone(),
        &ExecuteMsg::RegisterValidator {
            operator: "guardvaloper1alice".to_string(),
            consensus_address: CONSENSUS.to_string(),
            eth_address: eth_address(&validator_key).to_string(),
        },
        &[],
    )
    .unwrap();

    TestEnv {
        app,
        contract_addr,
        admin,
        operator,
        reporter,
        validator_key,
    }
}

fn valset(nonce: u64) -> Valset {
    Valset {
        nonce,
        members: vec![BridgeValidator {
            power: 4_294_967_295,
            ethereum_address: "0x2222222222222222222222222222222222222222".to_string(),
        }],
        height: 77,
        reward_amount: Uint256::zero(),
        reward_token: String::new(),
    }
}

fn batch(nonce: u64) -> OutgoingTxBatch {
    OutgoingTxBatch {
        batch_nonce: nonce,
        batch_timeout: 10_000,
        transactions: vec![OutgoingTransferTx {
            id: 1,
            sender: "guard1user".to_string(),
            dest_address: "0x3333333333333333333333333333333333333333".to_string(),
            erc20_token: Erc20Token {
                contract: TOKEN.to_string(),
                amount: Uint256::from(1_000u128),
            },
            erc20_fee: Erc20Token {
                contract: TOKEN.to_string(),
                amount: Uint256::from(10u128),
            },
        }],
        token_contract: TOKEN.to_string(),
        block: 0,
    }
}

fn checkpoint_of(subject: &SignedSubject) -> [u8; 32] {
    subject
        .checkpoint(&string_to_bytes32(PEGGY_ID).unwrap())
        .unwrap()
}

fn submit(
    env: &mut TestEnv,
    subject: SubjectAny,
    signature: String,
) -> anyhow::Result<AppResponse> {
    env.app.execute_contract(
        env.reporter.clone(),
        env.contract_addr.clone(),
        &ExecuteMsg::SubmitBadSignatureEvidence { subject, signature },
        &[],
    )
}

fn is_slashed(env: &TestEnv, checkpoint: &[u8; 32]) -> bool {
    let res: IsSlashedResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract_addr,
            &QueryMsg::IsSlashed {
                checkpoint: hex::encode(checkpoint),
                consensus_address: CONSENSUS.to_string(),
            },
        )
        .unwrap();
    res.slashed
}

fn is_jailed(env: &TestEnv) -> bool {
    let res: ValidatorResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract_addr,
            &QueryMsg::Validator {
                consensus_address: CONSENSUS.to_string(),
            },
        )
        .unwrap();
    res.validator.unwrap().jailed
}

fn attribute<'a>(res: &'a AppResponse, key: &str) -> Option<&'a str> {
    res.events
        .iter()
        .flat_map(|e| e.attributes.iter())
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_forged_valset_signature_jails_once() {
    let mut env = setup();
    let subject = SignedSubject::Valset(valset(42));
    let checkpoint = checkpoint_of(&subject);
    let signature = sign_checkpoint(&env.validator_key, &checkpoint);

    let res = submit(&mut env, subject.pack().unwrap(), signature.clone()).unwrap();
    assert_eq!(attribute(&res, "consensus_address"), Some(CONSENSUS));
    assert_eq!(attribute(&res, "jailed"), Some("true"));
    assert!(is_jailed(&env));
    assert!(is_slashed(&env, &checkpoint));

    let res = submit(&mut env, subject.pack().unwrap(), signature);
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("Validator already slashed"), "got: {err_str}");
}

#[test]
fn test_requested_batch_is_not_evidence() {
    let mut env = setup();
    env.app
        .execute_contract(
            env.operator.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::CreateBatch {
                token_contract: TOKEN.to_string(),
                batch_nonce: 1,
                batch_timeout: 10_000,
                transactions: batch(1).transactions,
            },
            &[],
        )
        .unwrap();

    // creation height is not part of the checkpoint
    let subject = SignedSubject::Batch(batch(1));
    let checkpoint = checkpoint_of(&subject);

    let past: PastCheckpointResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract_addr,
            &QueryMsg::PastCheckpoint {
                checkpoint: format!("0x{}", hex::encode(checkpoint)),
            },
        )
        .unwrap();
    assert!(past.exists);

    let signature = sign_checkpoint(&env.validator_key, &checkpoint);
    let res = submit(&mut env, subject.pack().unwrap(), signature);
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("Checkpoint exists, cannot slash"), "got: {err_str}");
    assert!(!is_jailed(&env));
}

#[test]
fn test_requested_valset_is_not_evidence() {
    let mut env = setup();
    env.app
        .execute_contract(
            env.operator.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::RecordValset { valset: valset(5) },
            &[],
        )
        .unwrap();

    let subject = SignedSubject::Valset(valset(5));
    let signature = sign_checkpoint(&env.validator_key, &checkpoint_of(&subject));
    assert!(submit(&mut env, subject.pack().unwrap(), signature).is_err());
    assert!(!is_jailed(&env));

    // a different nonce was never requested
    let forged = SignedSubject::Valset(valset(6));
    let signature = sign_checkpoint(&env.validator_key, &checkpoint_of(&forged));
    submit(&mut env, forged.pack().unwrap(), signature).unwrap();
    assert!(is_jailed(&env));
}

#[test]
fn test_record_valset_validation() {
    let mut env = setup();

    let mut empty = valset(7);
    empty.members.clear();
    let err = env
        .app
        .execute_contract(
            env.operator.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::RecordValset { valset: empty },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Invalid valset: valset has no members"), "got: {err_str}");

    let mut malformed = valset(8);
    malformed.members[0].ethereum_address = "0x1234".to_string();
    let err = env
        .app
        .execute_contract(
            env.operator.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::RecordValset { valset: malformed },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.starts_with("Invalid valset"), "got: {err_str}");
}

#[test]
fn test_unknown_signer_is_rejected() {
    let mut env = setup();
    let stranger = SigningKey::from_slice(&[0x22; 32]).unwrap();
    let subject = SignedSubject::Valset(valset(1));
    let checkpoint = checkpoint_of(&subject);

    let res = submit(
        &mut env,
        subject.pack().unwrap(),
        sign_checkpoint(&stranger, &checkpoint),
    );
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(
        err_str.contains(&format!(
            "Did not find validator for eth address {}",
            eth_address(&stranger)
        )),
        "got: {err_str}"
    );
    assert!(!is_slashed(&env, &checkpoint));
    assert!(!is_jailed(&env));
}

#[test]
fn test_malformed_signatures() {
    let mut env = setup();
    let subject = SignedSubject::Valset(valset(1)).pack().unwrap();

    let res = submit(&mut env, subject.clone(), "0xnothex".to_string());
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("Signature decoding failed"), "got: {err_str}");

    let res = submit(&mut env, subject, format!("0x{}", "ab".repeat(64)));
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("Signature to eth address failed"), "got: {err_str}");
}

#[test]
fn test_logic_call_subject_is_rejected() {
    let mut env = setup();
    let res = submit(
        &mut env,
        SubjectAny {
            type_url: "/peggy.v1.OutgoingLogicCall".to_string(),
            value: cosmwasm_std::to_json_binary(&batch(1)).unwrap(),
        },
        format!("0x{}", "00".repeat(65)),
    );
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("must be over a batch or valset"), "got: {err_str}");
}

#[test]
fn test_jailed_validator_gets_new_slash_mark_without_rejail() {
    let mut env = setup();

    let first = SignedSubject::Valset(valset(100));
    let signature = sign_checkpoint(&env.validator_key, &checkpoint_of(&first));
    submit(&mut env, first.pack().unwrap(), signature).unwrap();

    let second = SignedSubject::Batch(batch(100));
    let checkpoint = checkpoint_of(&second);
    let signature = sign_checkpoint(&env.validator_key, &checkpoint);
    let res = submit(&mut env, second.pack().unwrap(), signature).unwrap();
    assert_eq!(attribute(&res, "jailed"), Some("false"));
    assert!(is_slashed(&env, &checkpoint));
}

#[test]
fn test_unjail_then_slash_again_for_new_evidence() {
    let mut env = setup();

    let forged = SignedSubject::Valset(valset(7));
    let signature = sign_checkpoint(&env.validator_key, &checkpoint_of(&forged));
    submit(&mut env, forged.pack().unwrap(), signature.clone()).unwrap();

    env.app
        .execute_contract(
            env.admin.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::UnjailValidator {
                consensus_address: CONSENSUS.to_string(),
            },
            &[],
        )
        .unwrap();
    assert!(!is_jailed(&env));

    // the old evidence stays spent
    assert!(submit(&mut env, forged.pack().unwrap(), signature).is_err());
    assert!(!is_jailed(&env));

    let res = env.app.execute_contract(
        env.admin.clone(),
        env.contract_addr.clone(),
        &ExecuteMsg::UnjailValidator {
            consensus_address: CONSENSUS.to_string(),
        },
        &[],
    );
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("not jailed"));
}

#[test]
fn test_validator_registry_uniqueness() {
    let mut env = setup();

    let res = env.app.execute_contract(
        env.admin.clone(),
        env.contract_addr.clone(),
        &ExecuteMsg::RegisterValidator {
            operator: "guardvaloper1bob".to_string(),
            consensus_address: "guardvalcons1bob".to_string(),
            eth_address: eth_address(&env.validator_key).to_string(),
        },
        &[],
    );
    let err_str = res.unwrap_err().root_cause().to_string();
    assert!(err_str.contains("already bound"), "got: {err_str}");

    let res: ValidatorResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract_addr,
            &QueryMsg::ValidatorByEthAddress {
                eth_address: eth_address(&env.validator_key).to_string(),
            },
        )
        .unwrap();
    assert_eq!(res.validator.unwrap().consensus_address, CONSENSUS);
}

#[test]
fn test_compute_checkpoint_query_matches_library() {
    let env = setup();
    let subject = SignedSubject::Batch(batch(3));

    let res: ComputeCheckpointResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.contract_addr,
            &QueryMsg::ComputeCheckpoint {
                subject: subject.pack().unwrap(),
            },
        )
        .unwrap();
    assert_eq!(res.checkpoint.as_slice(), checkpoint_of(&subject).as_slice());
    assert_eq!(
        res.checkpoint_hex,
        format!("0x{}", hex::encode(checkpoint_of(&subject)))
    );
}

#[test]
fn test_rate_limit_does_not_interfere_with_evidence() {
    let mut env = setup();
    env.app
        .execute_contract(
            env.admin.clone(),
            env.contract_addr.clone(),
            &ExecuteMsg::CreateRateLimit {
                token_address: TOKEN.to_string(),
                token_decimals: 18,
                token_price_id: "usdt-usd".to_string(),
                rate_limit_usd: Decimal256::one(),
                absolute_mint_limit: Uint256::zero(),
            },
            &[],
        )
        .unwrap();

    // forged batch for a rate-limited token is still slashable
    let forged = SignedSubject::Batch(batch(99));
    let signature = sign_checkpoint(&env.validator_key, &checkpoint_of(&forged));
    submit(&mut env, forged.pack().unwrap(), signature).unwrap();
    assert!(is_jailed(&env));
}
