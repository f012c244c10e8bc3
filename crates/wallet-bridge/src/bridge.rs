//! Bridge between the stdio host and the bridge workspace crates.
//! This must remain the only host-facing boundary for provider operations.

use std::sync::Arc;

use serde_json::Value;

use wallet_bridge_adapters::{
    BridgeAdapterConfig, BundlerAdapter, HeadlessPopupAdapter, WalletStoreAdapter,
};
use wallet_bridge_core::{
    BatchRecord, BridgeCommand, BridgeError, CommandResult, Orchestrator, PendingResponse,
    PortError, RequestId, RequestStatus,
};

type BridgeOrchestrator = Orchestrator<HeadlessPopupAdapter, BundlerAdapter, WalletStoreAdapter>;

#[derive(Clone)]
pub struct WalletBridge {
    orchestrator: Arc<BridgeOrchestrator>,
}

impl WalletBridge {
    pub fn from_config(config: &BridgeAdapterConfig) -> Result<Self, PortError> {
        Ok(Self {
            orchestrator: Arc::new(Orchestrator::new(
                HeadlessPopupAdapter::with_config(config),
                config.popup_config()?,
                BundlerAdapter::with_config(config),
                WalletStoreAdapter::with_config(config),
            )),
        })
    }

    pub fn request(&self, method: &str, params: Value) -> PendingResponse {
        self.orchestrator.request(method, params)
    }

    pub fn is_awaiting_user(&self, id: RequestId) -> bool {
        self.orchestrator
            .queue
            .get(id)
            .is_some_and(|r| r.status == RequestStatus::AwaitingUser)
    }

    pub fn active_popup(&self) -> Option<String> {
        self.orchestrator
            .popup
            .active()
            .map(|handle| handle.name().to_owned())
    }

    pub fn approve(&self, request_id: RequestId) -> Result<CommandResult, BridgeError> {
        self.orchestrator
            .handle(BridgeCommand::Approve { request_id })
    }

    pub fn deny(&self, request_id: RequestId) -> Result<CommandResult, BridgeError> {
        self.orchestrator.handle(BridgeCommand::Deny { request_id })
    }

    pub fn popup_closed(&self) -> Result<CommandResult, BridgeError> {
        self.orchestrator.handle(BridgeCommand::PopupClosed)
    }

    pub fn record_batch(&self, record: BatchRecord) -> Result<CommandResult, BridgeError> {
        self.orchestrator
            .handle(BridgeCommand::RecordBatch { record })
    }

    pub fn forget_batch(&self, id: String) -> Result<CommandResult, BridgeError> {
        self.orchestrator.handle(BridgeCommand::ForgetBatch { id })
    }

    pub fn poll_popup(&self) -> Result<CommandResult, BridgeError> {
        self.orchestrator.poll_popup()
    }

    pub fn chain_id(&self) -> Result<u64, BridgeError> {
        self.orchestrator.current_chain_id()
    }
}
