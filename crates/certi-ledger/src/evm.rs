//! # EVM JSON-RPC Registry Ledger
//!
//! Talks to the deployed registry contract over JSON-RPC.
//!
//! ## How It Works
//!
//! 1. Reads are `eth_call` against the `latest` block with ABI-encoded
//!    calldata (see [`crate::abi`]).
//! 2. Writes are `eth_sendTransaction` with `from` set to the configured
//!    signer. The node holds the key; this adapter never sees one.
//! 3. Status polls use `eth_getTransactionReceipt` and `eth_blockNumber`.
//!    A transition is finalized once the chain has grown `confirmations`
//!    blocks counting the one that includes it.
//!
//! ## Error Mapping
//!
//! | Failure                                 | LedgerError                |
//! |-----------------------------------------|----------------------------|
//! | transport, timeout, non-2xx, bad JSON   | `Unavailable`              |
//! | JSON-RPC error on a read                | `Unavailable`              |
//! | JSON-RPC error on `eth_sendTransaction` | `Rejected` (revert reason) |
//! | reverted `getDocument` past the count   | `IndexOutOfRange`          |
//! | result that does not decode             | `Malformed`                |
//! | submitter is not the signer             | `NoSession`                |

use async_trait::async_trait;
use certi_core::{Document, Identity};
use serde_json::{json, Value};

use crate::abi::{self, Token};
use crate::config::EvmRegistryConfig;
use crate::error::LedgerError;
use crate::ledger::{RegistryCall, RegistryLedger};
use crate::tx::{TxHandle, TxStatus};

/// Reason reported for a mined transaction whose receipt status is `0x0`.
pub const RECEIPT_REVERTED: &str = "execution reverted";

/// Why a JSON-RPC call did not produce a result.
#[derive(Debug)]
enum RpcFailure {
    /// The node could not be reached or answered unusably.
    Transport(String),
    /// The node answered with a JSON-RPC error object.
    Rpc {
        message: String,
        data: Option<String>,
    },
}

impl RpcFailure {
    fn into_read_error(self, operation: &str) -> LedgerError {
        match self {
            Self::Transport(detail) => LedgerError::Unavailable(detail),
            Self::Rpc { message, .. } => {
                LedgerError::Unavailable(format!("{operation} failed: {message}"))
            }
        }
    }
}

/// Registry ledger backed by an EVM node.
#[derive(Debug)]
pub struct EvmRegistryLedger {
    client: reqwest::Client,
    config: EvmRegistryConfig,
}

impl EvmRegistryLedger {
    /// Build the adapter and its HTTP client.
    pub fn new(config: EvmRegistryConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &EvmRegistryConfig {
        &self.config
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        tracing::debug!(method, "json-rpc call");

        let resp = self
            .client
            .post(self.config.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcFailure::Transport(format!("{method}: request timed out"))
                } else {
                    RpcFailure::Transport(format!("{method}: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            return Err(RpcFailure::Transport(format!(
                "{method}: HTTP {}",
                resp.status()
            )));
        }

        let mut json: Value = resp
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("{method}: invalid JSON response: {e}")))?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            let data = error.get("data").and_then(Value::as_str).map(str::to_string);
            tracing::debug!(method, %message, "json-rpc error");
            return Err(RpcFailure::Rpc { message, data });
        }

        match json.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(RpcFailure::Transport(format!(
                "{method}: JSON-RPC response missing 'result' field"
            ))),
        }
    }

    /// `eth_call` the registry and return the raw return data.
    async fn call(&self, operation: &str, calldata: String) -> Result<Vec<u8>, RpcFailure> {
        let request = json!({
            "to": self.config.registry_address.as_str(),
            "data": calldata,
        });
        let result = self.rpc_call("eth_call", json!([request, "latest"])).await?;
        let hex = result.as_str().ok_or_else(|| {
            RpcFailure::Transport(format!("{operation}: eth_call returned a non-string result"))
        })?;
        abi::decode_hex(hex).map_err(|e| RpcFailure::Transport(format!("{operation}: {e}")))
    }

    async fn read(&self, operation: &str, calldata: String) -> Result<Vec<u8>, LedgerError> {
        self.call(operation, calldata)
            .await
            .map_err(|failure| failure.into_read_error(operation))
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        let result = self
            .rpc_call("eth_blockNumber", json!([]))
            .await
            .map_err(|f| f.into_read_error("eth_blockNumber"))?;
        parse_quantity(&result).ok_or_else(|| malformed("eth_blockNumber", "not a hex quantity"))
    }

    fn encode(call: &RegistryCall) -> String {
        match call {
            RegistryCall::RegisterIssuer { identity } => {
                abi::encode_call(abi::ADD_ISSUER_SELECTOR, &[Token::Address(identity)])
            }
            RegistryCall::AppendDocument { content_ref, label } => abi::encode_call(
                abi::ADD_DOCUMENT_SELECTOR,
                &[Token::Str(content_ref.as_str()), Token::Str(label.as_str())],
            ),
            RegistryCall::AttestDocument { subject, index } => abi::encode_call(
                abi::VERIFY_DOCUMENT_SELECTOR,
                &[Token::Address(subject), Token::Uint(*index)],
            ),
        }
    }
}

fn malformed(operation: &str, detail: impl ToString) -> LedgerError {
    LedgerError::Malformed {
        operation: operation.to_string(),
        detail: detail.to_string(),
    }
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_quantity(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    u64::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}

#[async_trait]
impl RegistryLedger for EvmRegistryLedger {
    async fn owner_of(&self) -> Result<Identity, LedgerError> {
        let data = self
            .read("owner", abi::encode_call(abi::OWNER_SELECTOR, &[]))
            .await?;
        abi::decode_address(&data, 0).map_err(|e| malformed("owner", e))
    }

    async fn is_issuer(&self, identity: &Identity) -> Result<bool, LedgerError> {
        let calldata = abi::encode_call(abi::IS_ISSUER_SELECTOR, &[Token::Address(identity)]);
        let data = self.read("isIssuer", calldata).await?;
        abi::decode_bool(&data, 0).map_err(|e| malformed("isIssuer", e))
    }

    async fn document_count(&self, subject: &Identity) -> Result<u64, LedgerError> {
        let calldata =
            abi::encode_call(abi::GET_DOCUMENT_COUNT_SELECTOR, &[Token::Address(subject)]);
        let data = self.read("getDocumentCount", calldata).await?;
        abi::decode_uint(&data, 0).map_err(|e| malformed("getDocumentCount", e))
    }

    async fn document_at(&self, subject: &Identity, index: u64) -> Result<Document, LedgerError> {
        let calldata = abi::encode_call(
            abi::GET_DOCUMENT_SELECTOR,
            &[Token::Address(subject), Token::Uint(index)],
        );
        let data = match self.call("getDocument", calldata).await {
            Ok(data) => data,
            Err(RpcFailure::Rpc { message, .. }) => {
                // A revert here is usually an out-of-range index; confirm against the count.
                let count = self.document_count(subject).await?;
                if index >= count {
                    return Err(LedgerError::IndexOutOfRange {
                        subject: subject.clone(),
                        index,
                        count,
                    });
                }
                return Err(LedgerError::Unavailable(format!(
                    "getDocument failed: {message}"
                )));
            }
            Err(failure) => return Err(failure.into_read_error("getDocument")),
        };
        let tuple = abi::decode_document_tuple(&data).map_err(|e| malformed("getDocument", e))?;
        Ok(Document::from_ledger(
            index,
            tuple.ipfs_hash,
            tuple.name,
            tuple.verified_by,
            tuple.is_verified,
        ))
    }

    async fn submit(
        &self,
        submitter: &Identity,
        call: RegistryCall,
    ) -> Result<TxHandle, LedgerError> {
        let signer = match &self.config.signer {
            Some(signer) if signer == submitter => signer,
            _ => {
                return Err(LedgerError::NoSession {
                    submitter: submitter.clone(),
                })
            }
        };

        let tx = json!({
            "from": signer.as_str(),
            "to": self.config.registry_address.as_str(),
            "data": Self::encode(&call),
        });

        match self.rpc_call("eth_sendTransaction", json!([tx])).await {
            Ok(result) => result
                .as_str()
                .map(TxHandle::new)
                .ok_or_else(|| malformed("eth_sendTransaction", "non-string transaction hash")),
            Err(RpcFailure::Transport(detail)) => Err(LedgerError::Unavailable(detail)),
            Err(RpcFailure::Rpc { message, data }) => {
                let reason = data
                    .as_deref()
                    .and_then(|hex| abi::decode_hex(hex).ok())
                    .and_then(|bytes| abi::decode_revert_reason(&bytes))
                    .unwrap_or(message);
                tracing::debug!(call = call.name(), %reason, "submission rejected by node");
                Err(LedgerError::Rejected { reason })
            }
        }
    }

    async fn status(&self, handle: &TxHandle) -> Result<TxStatus, LedgerError> {
        let receipt = self
            .rpc_call("eth_getTransactionReceipt", json!([handle.as_str()]))
            .await
            .map_err(|f| f.into_read_error("eth_getTransactionReceipt"))?;

        if receipt.is_null() {
            return Ok(TxStatus::Pending);
        }

        if receipt.get("status").and_then(Value::as_str) == Some("0x0") {
            return Ok(TxStatus::Reverted {
                reason: RECEIPT_REVERTED.to_string(),
            });
        }

        let tx_block = receipt
            .get("blockNumber")
            .and_then(parse_quantity)
            .ok_or_else(|| malformed("eth_getTransactionReceipt", "missing blockNumber"))?;
        let current_block = self.block_number().await?;
        let confirmations = current_block.saturating_sub(tx_block) + 1;

        if confirmations >= self.config.confirmations {
            Ok(TxStatus::Finalized { block: tx_block })
        } else {
            Ok(TxStatus::Pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_REGISTRY_ADDRESS;
    use certi_core::{ContentRef, DocumentLabel};
    use url::Url;

    fn config() -> EvmRegistryConfig {
        EvmRegistryConfig::new(
            Url::parse("http://127.0.0.1:8545").unwrap(),
            Identity::parse(DEFAULT_REGISTRY_ADDRESS).unwrap(),
        )
    }

    #[test]
    fn quantities_parse_from_hex() {
        assert_eq!(parse_quantity(&json!("0x10")), Some(16));
        assert_eq!(parse_quantity(&json!("0x0")), Some(0));
        assert_eq!(parse_quantity(&json!("16")), None);
        assert_eq!(parse_quantity(&json!(16)), None);
    }

    #[test]
    fn append_encodes_reference_before_name() {
        let data = EvmRegistryLedger::encode(&RegistryCall::AppendDocument {
            content_ref: ContentRef::new("QmRef"),
            label: DocumentLabel::new("Diploma").unwrap(),
        });
        assert!(data.starts_with("0x4d2b1978"));
        let params = abi::decode_hex(&data[10..]).unwrap();
        assert_eq!(abi::decode_string(&params, 0).unwrap(), "QmRef");
        assert_eq!(abi::decode_string(&params, 1).unwrap(), "Diploma");
    }

    #[tokio::test]
    async fn submission_without_signer_has_no_session() {
        let ledger = EvmRegistryLedger::new(config()).unwrap();
        let who = Identity::parse("0x00000000000000000000000000000000000000aa").unwrap();
        let err = ledger
            .submit(&who, RegistryCall::RegisterIssuer { identity: who.clone() })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoSession { .. }));
        assert!(err.is_unavailable());
    }

    #[test]
    fn ledger_is_debug() {
        let ledger = EvmRegistryLedger::new(config()).unwrap();
        assert!(format!("{ledger:?}").contains("EvmRegistryLedger"));
    }
}
