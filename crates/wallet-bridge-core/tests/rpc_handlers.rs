mod common;

use serde_json::{json, Value};
use wallet_bridge_core::handlers::{
    get_calls_status, get_capabilities, request_accounts, switch_ethereum_chain,
};
use wallet_bridge_core::{BatchRecord, BatchStatus, BridgeError, RpcRequest};

use common::{context, other_account, receipt, user_op_hash, BASE_SEPOLIA};

fn batch() -> BatchRecord {
    BatchRecord {
        id: user_op_hash(0x11).to_string(),
        chain_id: BASE_SEPOLIA,
        user_op_hash: user_op_hash(0x11),
    }
}

#[test]
fn request_accounts_returns_authorized_in_order() {
    let ctx = context();
    assert_eq!(request_accounts(&ctx), ctx.authorized_accounts);

    let mut empty = context();
    empty.authorized_accounts.clear();
    assert!(request_accounts(&empty).is_empty());
}

#[test]
fn capabilities_for_empty_or_missing_chain_ids_is_empty_map() {
    let ctx = context();
    let addr = ctx.selected_account.expect("selected").to_string();

    let none = get_capabilities(Some(addr.as_str()), None, &ctx).expect("omitted chain ids");
    assert!(none.is_empty());
    let no_chains: &[String] = &[];
    let empty =
        get_capabilities(Some(addr.as_str()), Some(no_chains), &ctx).expect("empty chain ids");
    assert!(empty.is_empty());
    assert_eq!(serde_json::to_value(empty).expect("encode"), json!({}));
}

#[test]
fn capabilities_reject_mismatched_address_regardless_of_chain_ids() {
    let ctx = context();
    let other = other_account().to_string();
    let no_chains: &[String] = &[];
    let mixed = vec!["0x14a34".to_owned(), "not-a-chain".to_owned()];
    let chain_sets: [Option<&[String]>; 3] = [None, Some(no_chains), Some(mixed.as_slice())];
    for chain_ids in chain_sets {
        let err = get_capabilities(Some(other.as_str()), chain_ids, &ctx).expect_err("must fail");
        assert!(matches!(err, BridgeError::Unauthorized(_)));
        assert_eq!(err.code(), 4100);
    }

    let err = get_capabilities(Some("garbage"), None, &ctx).expect_err("unparsable address");
    assert!(matches!(err, BridgeError::Unauthorized(_)));
}

#[test]
fn capabilities_address_compare_ignores_case() {
    let ctx = context();
    let upper = format!(
        "0x{}",
        ctx.selected_account
            .expect("selected")
            .to_string()
            .trim_start_matches("0x")
            .to_ascii_uppercase()
    );
    let chains = vec!["0x1".to_owned()];
    let caps = get_capabilities(Some(upper.as_str()), Some(chains.as_slice()), &ctx)
        .expect("case-insensitive match");
    assert_eq!(caps.len(), 1);
}

#[test]
fn capabilities_advertise_atomic_for_every_requested_chain() {
    let ctx = context();
    let requested = ["0x014A34".to_owned(), "0x1".to_owned(), "0x2105".to_owned()];
    let caps = get_capabilities(None, Some(requested.as_slice()), &ctx).expect("capabilities");
    assert_eq!(caps.len(), 3);
    // keys echo the requested spelling
    assert!(caps.get("0x14a34").is_none());
    for key in ["0x014A34", "0x1", "0x2105"] {
        let per_chain = caps.get(key).expect("chain present");
        assert_eq!(per_chain.get("atomic"), Some(&json!({"status": "supported"})));
    }
}

#[test]
fn switch_chain_matches_supported_chains_exactly() {
    let ctx = context();
    assert_eq!(switch_ethereum_chain("0x14a34", &ctx).expect("supported"), 84532);
    assert_eq!(switch_ethereum_chain("0x14A34", &ctx).expect("upper hex"), 84532);

    for raw in ["0xdeadbeef", "84532", "0x", "base-sepolia", "0x+14a34"] {
        let err = switch_ethereum_chain(raw, &ctx).expect_err("unsupported");
        assert!(matches!(err, BridgeError::UnsupportedChain(_)), "{raw}");
    }
}

#[test]
fn calls_status_without_receipt_is_pending() {
    let status = get_calls_status(&batch(), None);
    assert_eq!(status.status, BatchStatus::Pending);
    assert!(status.receipts.is_none());
    assert!(status.atomic);
    assert_eq!(status.chain_id, "0x14a34");
    let wire = serde_json::to_value(&status).expect("encode");
    assert!(wire.get("receipts").is_none());
}

#[test]
fn calls_status_with_successful_receipt_is_confirmed() {
    let r = receipt(user_op_hash(0x11), true);
    let status = get_calls_status(&batch(), Some(&r));
    assert_eq!(status.status, BatchStatus::Confirmed);
    let receipts = status.receipts.expect("receipts");
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].status, "0x1");
    assert_eq!(receipts[0].transaction_hash, r.receipt.transaction_hash);
}

#[test]
fn calls_status_with_failed_receipt_is_chain_rules_failure() {
    let r = receipt(user_op_hash(0x11), false);
    let status = get_calls_status(&batch(), Some(&r));
    assert_eq!(status.status, BatchStatus::ChainRulesFailure);
    assert_eq!(status.status.code(), 500);
    let receipts = status.receipts.expect("receipts");
    assert!(!receipts.is_empty());
    assert_eq!(receipts[0].status, "0x0");
}

#[test]
fn positional_params_are_decoded_per_method() {
    let switch = RpcRequest::parse("wallet_switchEthereumChain", &json!([{"chainId": "0x14a34"}]))
        .expect("switch");
    assert_eq!(
        switch,
        RpcRequest::SwitchEthereumChain {
            chain_id: "0x14a34".to_owned()
        }
    );

    let caps = RpcRequest::parse("wallet_getCapabilities", &json!([null, ["0x1"]]))
        .expect("capabilities");
    assert_eq!(
        caps,
        RpcRequest::GetCapabilities {
            address: None,
            chain_ids: Some(vec!["0x1".to_owned()])
        }
    );

    let accounts = RpcRequest::parse("eth_requestAccounts", &Value::Null).expect("accounts");
    assert_eq!(accounts, RpcRequest::RequestAccounts);
}

#[test]
fn malformed_params_are_invalid() {
    let cases = [
        ("wallet_switchEthereumChain", json!([])),
        ("wallet_switchEthereumChain", json!([{"chain": "0x1"}])),
        ("wallet_getCallsStatus", json!([])),
        ("wallet_getCapabilities", json!([42])),
        ("eth_requestAccounts", json!({"not": "positional"})),
    ];
    for (method, params) in cases {
        let err = RpcRequest::parse(method, &params).expect_err("invalid params");
        assert!(matches!(err, BridgeError::InvalidParams(_)), "{method} {params}");
    }

    let err = RpcRequest::parse("eth_sign", &json!([])).expect_err("unsupported");
    assert!(matches!(err, BridgeError::UnsupportedMethod(_)));
}
