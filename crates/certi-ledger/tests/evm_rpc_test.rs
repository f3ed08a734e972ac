//! Contract tests for EvmRegistryLedger against a mocked JSON-RPC node.
//!
//! ## Calls Tested
//!
//! | JSON-RPC method | Contract function | Test |
//! |-----------------|-------------------|------|
//! | `eth_call` | `owner()` | `owner_of_*` |
//! | `eth_call` | `isIssuer(address)` | `is_issuer_*` |
//! | `eth_call` | `getDocumentCount(address)` | `document_count_*` |
//! | `eth_call` | `getDocument(address,uint256)` | `document_at_*` |
//! | `eth_sendTransaction` | `addDocument` / `verifyDocument` | `submit_*` |
//! | `eth_getTransactionReceipt` + `eth_blockNumber` | — | `status_*` |

use certi_core::{ContentRef, DocumentLabel, Identity};
use certi_ledger::abi::{self, Token};
use certi_ledger::{
    EvmRegistryConfig, EvmRegistryLedger, LedgerError, RegistryCall, RegistryLedger, TxHandle,
    TxStatus,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const REGISTRY: &str = "0x81298d0a12addc1d3e873169284f54c6dba1f460";
const SIGNER: &str = "0x00000000000000000000000000000000000000a1";
const USER: &str = "0x00000000000000000000000000000000000000b2";

fn identity(s: &str) -> Identity {
    Identity::parse(s).unwrap()
}

fn ledger(server: &MockServer, confirmations: u64) -> EvmRegistryLedger {
    let config = EvmRegistryConfig::new(server.uri().parse().unwrap(), identity(REGISTRY))
        .with_signer(identity(SIGNER))
        .with_confirmations(confirmations)
        .with_timeout_secs(5);
    EvmRegistryLedger::new(config).unwrap()
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(message: &str, data: Option<String>) -> ResponseTemplate {
    let mut error = json!({"code": 3, "message": message});
    if let Some(data) = data {
        error["data"] = Value::String(data);
    }
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "error": error}))
}

fn hex_result(params: &[Token<'_>]) -> ResponseTemplate {
    rpc_result(json!(format!("0x{}", hex::encode(abi::encode_params(params)))))
}

/// Matches an `eth_call` or `eth_sendTransaction` whose calldata starts with a selector.
struct Selector(&'static str);

impl Match for Selector {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| {
                body["params"][0]["data"]
                    .as_str()
                    .map(|data| data.starts_with(&format!("0x{}", self.0)))
            })
            .unwrap_or(false)
    }
}

fn request_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}

// ── eth_call reads ───────────────────────────────────────────────────

#[tokio::test]
async fn owner_of_decodes_address_word() {
    let server = MockServer::start().await;
    let owner = identity(SIGNER);
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_call"})))
        .and(Selector(abi::OWNER_SELECTOR))
        .respond_with(hex_result(&[Token::Address(&owner)]))
        .expect(1)
        .mount(&server)
        .await;

    let ledger = ledger(&server, 1);
    assert_eq!(ledger.owner_of().await.unwrap(), owner);

    let requests = server.received_requests().await.unwrap();
    let body = request_body(&requests[0]);
    assert_eq!(body["params"][0]["to"], REGISTRY);
    assert_eq!(body["params"][1], "latest");
}

#[tokio::test]
async fn is_issuer_decodes_bool() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(Selector(abi::IS_ISSUER_SELECTOR))
        .respond_with(hex_result(&[Token::Uint(1)]))
        .mount(&server)
        .await;

    let ledger = ledger(&server, 1);
    assert!(ledger.is_issuer(&identity(USER)).await.unwrap());
}

#[tokio::test]
async fn document_count_encodes_subject() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(Selector(abi::GET_DOCUMENT_COUNT_SELECTOR))
        .respond_with(hex_result(&[Token::Uint(4)]))
        .mount(&server)
        .await;

    let ledger = ledger(&server, 1);
    assert_eq!(ledger.document_count(&identity(USER)).await.unwrap(), 4);

    let requests = server.received_requests().await.unwrap();
    let data = request_body(&requests[0])["params"][0]["data"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(data.ends_with("b2"));
    assert_eq!(data.len(), 2 + 8 + 64);
}

#[tokio::test]
async fn document_at_maps_zero_attester_to_none() {
    let server = MockServer::start().await;
    let zero = Identity::zero();
    Mock::given(method("POST"))
        .and(Selector(abi::GET_DOCUMENT_SELECTOR))
        .respond_with(hex_result(&[
            Token::Str("QmDiploma"),
            Token::Str("Diploma"),
            Token::Address(&zero),
            Token::Uint(0),
        ]))
        .mount(&server)
        .await;

    let doc = ledger(&server, 1)
        .document_at(&identity(USER), 0)
        .await
        .unwrap();
    assert_eq!(doc.index, 0);
    assert_eq!(doc.content_ref.as_str(), "QmDiploma");
    assert_eq!(doc.label, "Diploma");
    assert_eq!(doc.attested_by, None);
    assert!(!doc.verified);
}

#[tokio::test]
async fn document_at_reports_attester_when_verified() {
    let server = MockServer::start().await;
    let issuer = identity(SIGNER);
    Mock::given(method("POST"))
        .and(Selector(abi::GET_DOCUMENT_SELECTOR))
        .respond_with(hex_result(&[
            Token::Str("QmDiploma"),
            Token::Str("Diploma"),
            Token::Address(&issuer),
            Token::Uint(1),
        ]))
        .mount(&server)
        .await;

    let doc = ledger(&server, 1)
        .document_at(&identity(USER), 2)
        .await
        .unwrap();
    assert_eq!(doc.index, 2);
    assert_eq!(doc.attested_by, Some(issuer));
    assert!(doc.verified);
}

#[tokio::test]
async fn document_at_past_count_is_index_out_of_range() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(Selector(abi::GET_DOCUMENT_SELECTOR))
        .respond_with(rpc_error("execution reverted", None))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(Selector(abi::GET_DOCUMENT_COUNT_SELECTOR))
        .respond_with(hex_result(&[Token::Uint(1)]))
        .mount(&server)
        .await;

    let err = ledger(&server, 1)
        .document_at(&identity(USER), 3)
        .await
        .unwrap_err();
    match err {
        LedgerError::IndexOutOfRange { index, count, .. } => {
            assert_eq!(index, 3);
            assert_eq!(count, 1);
        }
        other => panic!("expected IndexOutOfRange, got: {other:?}"),
    }
}

#[tokio::test]
async fn read_on_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = ledger(&server, 1).owner_of().await.unwrap_err();
    assert!(matches!(err, LedgerError::Unavailable(_)));
}

#[tokio::test]
async fn undecodable_result_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(Selector(abi::IS_ISSUER_SELECTOR))
        .respond_with(rpc_result(json!("0x")))
        .mount(&server)
        .await;

    let err = ledger(&server, 1)
        .is_issuer(&identity(USER))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Malformed { .. }));
    assert!(err.is_unavailable());
}

// ── eth_sendTransaction ──────────────────────────────────────────────

#[tokio::test]
async fn submit_sends_from_signer_to_registry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
        .and(Selector(abi::ADD_DOCUMENT_SELECTOR))
        .respond_with(rpc_result(json!("0xabc123")))
        .expect(1)
        .mount(&server)
        .await;

    let signer = identity(SIGNER);
    let handle = ledger(&server, 1)
        .submit(
            &signer,
            RegistryCall::AppendDocument {
                content_ref: ContentRef::new("QmDiploma"),
                label: DocumentLabel::new("Diploma").unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(handle, TxHandle::new("0xabc123"));

    let requests = server.received_requests().await.unwrap();
    let tx = &request_body(&requests[0])["params"][0];
    assert_eq!(tx["from"], SIGNER);
    assert_eq!(tx["to"], REGISTRY);
}

#[tokio::test]
async fn submit_from_other_identity_has_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!("0xabc123")))
        .expect(0)
        .mount(&server)
        .await;

    let err = ledger(&server, 1)
        .submit(
            &identity(USER),
            RegistryCall::AttestDocument {
                subject: identity(USER),
                index: 0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoSession { .. }));
}

#[tokio::test]
async fn submit_revert_carries_decoded_reason() {
    let server = MockServer::start().await;
    let mut revert = abi::ERROR_STRING_SELECTOR.to_vec();
    revert.extend(abi::encode_params(&[Token::Str("caller is not an issuer")]));
    Mock::given(method("POST"))
        .and(Selector(abi::VERIFY_DOCUMENT_SELECTOR))
        .respond_with(rpc_error(
            "execution reverted",
            Some(format!("0x{}", hex::encode(revert))),
        ))
        .mount(&server)
        .await;

    let err = ledger(&server, 1)
        .submit(
            &identity(SIGNER),
            RegistryCall::AttestDocument {
                subject: identity(USER),
                index: 0,
            },
        )
        .await
        .unwrap_err();
    match err {
        LedgerError::Rejected { reason } => assert_eq!(reason, "caller is not an issuer"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn submit_rpc_error_without_data_uses_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_error("insufficient funds for gas", None))
        .mount(&server)
        .await;

    let err = ledger(&server, 1)
        .submit(
            &identity(SIGNER),
            RegistryCall::RegisterIssuer {
                identity: identity(USER),
            },
        )
        .await
        .unwrap_err();
    match err {
        LedgerError::Rejected { reason } => assert_eq!(reason, "insufficient funds for gas"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

// ── status ───────────────────────────────────────────────────────────

async fn mount_receipt(server: &MockServer, receipt: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_result(receipt))
        .mount(server)
        .await;
}

async fn mount_block_number(server: &MockServer, block: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_blockNumber"})))
        .respond_with(rpc_result(json!(block)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn status_null_receipt_is_pending() {
    let server = MockServer::start().await;
    mount_receipt(&server, Value::Null).await;

    let status = ledger(&server, 1)
        .status(&TxHandle::new("0xabc123"))
        .await
        .unwrap();
    assert_eq!(status, TxStatus::Pending);
}

#[tokio::test]
async fn status_failed_receipt_is_reverted() {
    let server = MockServer::start().await;
    mount_receipt(&server, json!({"status": "0x0", "blockNumber": "0x10"})).await;

    let status = ledger(&server, 1)
        .status(&TxHandle::new("0xabc123"))
        .await
        .unwrap();
    assert!(matches!(status, TxStatus::Reverted { .. }));
}

#[tokio::test]
async fn status_mined_receipt_is_finalized_at_one_confirmation() {
    let server = MockServer::start().await;
    mount_receipt(&server, json!({"status": "0x1", "blockNumber": "0x10"})).await;
    mount_block_number(&server, "0x10").await;

    let status = ledger(&server, 1)
        .status(&TxHandle::new("0xabc123"))
        .await
        .unwrap();
    assert_eq!(status, TxStatus::Finalized { block: 16 });
}

#[tokio::test]
async fn status_waits_for_configured_confirmations() {
    let server = MockServer::start().await;
    mount_receipt(&server, json!({"status": "0x1", "blockNumber": "0x10"})).await;
    mount_block_number(&server, "0x11").await;

    let handle = TxHandle::new("0xabc123");
    assert_eq!(
        ledger(&server, 3).status(&handle).await.unwrap(),
        TxStatus::Pending
    );
    assert_eq!(
        ledger(&server, 2).status(&handle).await.unwrap(),
        TxStatus::Finalized { block: 16 }
    );
}
