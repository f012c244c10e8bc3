//! Per-method translation from wallet state to JSON-RPC results.
//!
//! Every function here is pure over its inputs; I/O (bundler lookups, chain
//! selection) is done by the orchestrator around them.

use std::collections::BTreeMap;

use alloy::primitives::{Address, B256};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::{
    format_chain_id, parse_hex_chain_id, BatchRecord, BatchStatus, CallReceipt, CallsStatus,
    Capabilities, RpcMethod, UserOperationReceipt, WalletContext, CALLS_STATUS_VERSION,
};
use crate::error::BridgeError;

/// A call with its positional params decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcRequest {
    RequestAccounts,
    Accounts,
    ChainId,
    SwitchEthereumChain {
        chain_id: String,
    },
    GetCapabilities {
        address: Option<String>,
        chain_ids: Option<Vec<String>>,
    },
    GetCallsStatus {
        id: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwitchEthereumChainParameter {
    chain_id: String,
}

impl RpcRequest {
    pub fn parse(method: &str, params: &Value) -> Result<Self, BridgeError> {
        let method = RpcMethod::from_rpc_name(method)
            .ok_or_else(|| BridgeError::UnsupportedMethod(method.to_owned()))?;
        let args: &[Value] = match params {
            Value::Null => &[],
            Value::Array(items) => items,
            other => {
                return Err(BridgeError::InvalidParams(format!(
                    "{} expects positional params, got {other}",
                    method.rpc_name()
                )))
            }
        };

        let request = match method {
            RpcMethod::EthRequestAccounts => Self::RequestAccounts,
            RpcMethod::EthAccounts => Self::Accounts,
            RpcMethod::EthChainId => Self::ChainId,
            RpcMethod::WalletSwitchEthereumChain => {
                let first = args.first().ok_or_else(|| {
                    BridgeError::InvalidParams("missing switch chain parameter".to_owned())
                })?;
                let param: SwitchEthereumChainParameter = serde_json::from_value(first.clone())
                    .map_err(|e| BridgeError::InvalidParams(format!("switch chain: {e}")))?;
                Self::SwitchEthereumChain {
                    chain_id: param.chain_id,
                }
            }
            RpcMethod::WalletGetCapabilities => {
                let address = match args.first() {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => {
                        return Err(BridgeError::InvalidParams(format!(
                            "capabilities address must be a string, got {other}"
                        )))
                    }
                };
                let chain_ids = match args.get(1) {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(
                        serde_json::from_value::<Vec<String>>(value.clone()).map_err(|e| {
                            BridgeError::InvalidParams(format!("capabilities chain ids: {e}"))
                        })?,
                    ),
                };
                Self::GetCapabilities { address, chain_ids }
            }
            RpcMethod::WalletGetCallsStatus => {
                let id = args.first().and_then(Value::as_str).ok_or_else(|| {
                    BridgeError::InvalidParams("calls status expects a batch id string".to_owned())
                })?;
                Self::GetCallsStatus { id: id.to_owned() }
            }
        };
        Ok(request)
    }

    pub fn method(&self) -> RpcMethod {
        match self {
            Self::RequestAccounts => RpcMethod::EthRequestAccounts,
            Self::Accounts => RpcMethod::EthAccounts,
            Self::ChainId => RpcMethod::EthChainId,
            Self::SwitchEthereumChain { .. } => RpcMethod::WalletSwitchEthereumChain,
            Self::GetCapabilities { .. } => RpcMethod::WalletGetCapabilities,
            Self::GetCallsStatus { .. } => RpcMethod::WalletGetCallsStatus,
        }
    }
}

/// Addresses authorized for the embedding page, in wallet order.
pub fn request_accounts(ctx: &WalletContext) -> Vec<Address> {
    ctx.authorized_accounts.clone()
}

pub fn accounts_value(accounts: &[Address]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|a| Value::String(a.to_checksum(None)))
            .collect(),
    )
}

pub fn chain_id(ctx: &WalletContext) -> String {
    format_chain_id(ctx.chain_id)
}

/// Resolves the requested hex chain id against the supported chains.
pub fn switch_ethereum_chain(requested: &str, ctx: &WalletContext) -> Result<u64, BridgeError> {
    let chain_id = parse_hex_chain_id(requested)
        .ok_or_else(|| BridgeError::UnsupportedChain(requested.to_owned()))?;
    if !ctx.supports_chain(chain_id) {
        return Err(BridgeError::UnsupportedChain(requested.to_owned()));
    }
    Ok(chain_id)
}

pub fn get_capabilities(
    address: Option<&str>,
    chain_ids: Option<&[String]>,
    ctx: &WalletContext,
) -> Result<Capabilities, BridgeError> {
    if let Some(raw) = address {
        let requested: Option<Address> = raw.parse().ok();
        if requested.is_none() || requested != ctx.selected_account {
            return Err(BridgeError::Unauthorized(format!(
                "{raw} is not the selected account"
            )));
        }
    }

    let mut capabilities = Capabilities::new();
    for raw in chain_ids.unwrap_or_default() {
        if parse_hex_chain_id(raw).is_none() {
            return Err(BridgeError::InvalidParams(format!("invalid chain id {raw}")));
        }
        // keyed as requested so callers can index with their own string
        let mut per_chain = BTreeMap::new();
        per_chain.insert("atomic".to_owned(), json!({ "status": "supported" }));
        capabilities.insert(raw.clone(), per_chain);
    }
    Ok(capabilities)
}

/// Batch ids are user operation hashes.
pub fn parse_batch_id(id: &str) -> Result<B256, BridgeError> {
    id.parse()
        .map_err(|e| BridgeError::InvalidParams(format!("batch id {id}: {e}")))
}

/// EIP-5792 status of `batch` given the bundler's receipt, if any.
pub fn get_calls_status(batch: &BatchRecord, receipt: Option<&UserOperationReceipt>) -> CallsStatus {
    let (status, receipts) = match receipt {
        None => (BatchStatus::Pending, None),
        Some(r) => {
            let status = if r.success {
                BatchStatus::Confirmed
            } else {
                BatchStatus::ChainRulesFailure
            };
            (status, Some(vec![call_receipt(r)]))
        }
    };
    CallsStatus {
        version: CALLS_STATUS_VERSION.to_owned(),
        id: batch.id.clone(),
        chain_id: format_chain_id(batch.chain_id),
        status,
        atomic: true,
        receipts,
    }
}

fn call_receipt(r: &UserOperationReceipt) -> CallReceipt {
    CallReceipt {
        logs: r.logs.clone(),
        status: if r.success { "0x1" } else { "0x0" }.to_owned(),
        block_hash: r.receipt.block_hash,
        block_number: r.receipt.block_number,
        gas_used: r.receipt.gas_used,
        transaction_hash: r.receipt.transaction_hash,
    }
}
