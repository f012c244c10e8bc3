use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{format_chain_id, parse_hex_chain_id};
use crate::error::{BridgeError, RpcError};

/// Exactly one of `value` / `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcOutcome {
    Value(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub chain_id: String,
}

/// `{ result, data }` envelope returned to the embedding page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub result: RpcOutcome,
    pub data: ResponseData,
}

impl RpcResponse {
    pub fn success(value: Value, chain_id: u64) -> Self {
        Self {
            result: RpcOutcome::Value(value),
            data: ResponseData {
                chain_id: format_chain_id(chain_id),
            },
        }
    }

    pub fn failure(error: &BridgeError, chain_id: u64) -> Self {
        Self {
            result: RpcOutcome::Error(error.to_rpc_error()),
            data: ResponseData {
                chain_id: format_chain_id(chain_id),
            },
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.result {
            RpcOutcome::Value(v) => Some(v),
            RpcOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.result {
            RpcOutcome::Value(_) => None,
            RpcOutcome::Error(e) => Some(e),
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        parse_hex_chain_id(&self.data.chain_id)
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.result {
            RpcOutcome::Value(v) => Ok(v),
            RpcOutcome::Error(e) => Err(e),
        }
    }
}
