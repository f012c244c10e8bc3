use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use alloy::primitives::B256;
use serde_json::Value;
use tracing::debug;

use wallet_bridge_core::{BundlerPort, PortError, UserOperationReceipt};

use crate::BridgeAdapterConfig;

/// ERC-4337 bundler client. Talks JSON-RPC to one bundler per chain, or
/// serves receipts from memory in development.
#[derive(Debug, Clone)]
pub struct BundlerAdapter {
    mode: BundlerMode,
    receipts: Arc<Mutex<HashMap<(u64, B256), UserOperationReceipt>>>,
}

#[derive(Debug, Clone)]
enum BundlerMode {
    Disabled(String),
    InMemory,
    #[cfg(not(target_arch = "wasm32"))]
    Http(HttpRuntime),
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct HttpRuntime {
    endpoints: BTreeMap<u64, String>,
    client: reqwest::blocking::Client,
}

impl Default for BundlerAdapter {
    fn default() -> Self {
        Self::with_config(&BridgeAdapterConfig::from_env())
    }
}

impl BundlerAdapter {
    pub fn in_memory() -> Self {
        Self {
            mode: BundlerMode::InMemory,
            receipts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_config(config: &BridgeAdapterConfig) -> Self {
        let mode = Self::select_mode(config);
        Self {
            mode,
            receipts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn select_mode(config: &BridgeAdapterConfig) -> BundlerMode {
        if config.bundler_urls.is_empty() {
            return if config.strict_runtime_required() {
                BundlerMode::Disabled(
                    "bundler endpoints not configured in production runtime profile".to_owned(),
                )
            } else {
                BundlerMode::InMemory
            };
        }

        let timeout = std::time::Duration::from_millis(config.bundler_timeout_ms);
        match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => BundlerMode::Http(HttpRuntime {
                endpoints: config.bundler_urls.clone(),
                client,
            }),
            Err(e) if config.strict_runtime_required() => BundlerMode::Disabled(format!(
                "failed to initialize bundler client in production profile: {e}"
            )),
            Err(_) => BundlerMode::InMemory,
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn select_mode(config: &BridgeAdapterConfig) -> BundlerMode {
        // TODO: route receipt lookups through fetch once the wasm host is async end to end.
        if config.strict_runtime_required() {
            BundlerMode::Disabled("blocking bundler client unavailable on wasm32".to_owned())
        } else {
            BundlerMode::InMemory
        }
    }

    /// Seeds a receipt for in-memory mode.
    pub fn insert_receipt(
        &self,
        chain_id: u64,
        receipt: UserOperationReceipt,
    ) -> Result<(), PortError> {
        let mut g = self
            .receipts
            .lock()
            .map_err(|e| PortError::Transport(format!("bundler lock poisoned: {e}")))?;
        g.insert((chain_id, receipt.user_op_hash), receipt);
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn rpc_call(&self, chain_id: u64, method: &str, params: Value) -> Result<Value, PortError> {
        let http = match &self.mode {
            BundlerMode::Http(http) => http,
            BundlerMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            BundlerMode::InMemory => {
                return Err(PortError::NotImplemented("bundler http runtime not enabled"))
            }
        };
        let url = http
            .endpoints
            .get(&chain_id)
            .ok_or_else(|| PortError::NotFound(format!("no bundler for chain {chain_id}")))?;

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!(chain_id, method, "bundler request");
        let response = http
            .client
            .post(url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("bundler request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("bundler json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "bundler status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(PortError::Transport(format!("bundler returned error: {err}")));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("bundler response missing result".to_owned()))
    }
}

impl BundlerPort for BundlerAdapter {
    fn user_operation_receipt(
        &self,
        chain_id: u64,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, PortError> {
        match &self.mode {
            BundlerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            BundlerMode::InMemory => {
                let g = self
                    .receipts
                    .lock()
                    .map_err(|e| PortError::Transport(format!("bundler lock poisoned: {e}")))?;
                Ok(g.get(&(chain_id, user_op_hash)).cloned())
            }
            #[cfg(not(target_arch = "wasm32"))]
            BundlerMode::Http(_) => {
                let result = self.rpc_call(
                    chain_id,
                    "eth_getUserOperationReceipt",
                    serde_json::json!([user_op_hash]),
                )?;
                if result.is_null() {
                    return Ok(None);
                }
                serde_json::from_value(result)
                    .map(Some)
                    .map_err(|e| PortError::Validation(format!("invalid receipt: {e}")))
            }
        }
    }
}
