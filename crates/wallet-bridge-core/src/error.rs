use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ports::PortError;

/// EIP-1193 and JSON-RPC error codes surfaced to embedding pages.
pub mod codes {
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const UNKNOWN_BUNDLE_ID: i64 = 5730;
}

/// Every failure the bridge can report. Built where the failure happens,
/// never inferred from a message afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("popup window was blocked")]
    PopupBlocked,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unrecognized chain id: {0}")]
    UnsupportedChain(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("user rejected the request")]
    UserRejected,
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unknown bundle id: {0}")]
    UnknownBundleId(String),
    #[error("request lifecycle violation: {0}")]
    Lifecycle(String),
}

impl BridgeError {
    pub fn code(&self) -> i64 {
        match self {
            Self::PopupBlocked | Self::Upstream(_) | Self::Lifecycle(_) => codes::INTERNAL,
            Self::Unauthorized(_) => codes::UNAUTHORIZED,
            Self::UnsupportedChain(_) => codes::UNRECOGNIZED_CHAIN,
            Self::UserRejected => codes::USER_REJECTED,
            Self::UnsupportedMethod(_) => codes::UNSUPPORTED_METHOD,
            Self::InvalidParams(_) => codes::INVALID_PARAMS,
            Self::UnknownBundleId(_) => codes::UNKNOWN_BUNDLE_ID,
        }
    }

    pub fn to_rpc_error(&self) -> RpcError {
        RpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<PortError> for BridgeError {
    fn from(err: PortError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Wire form of a structured error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
