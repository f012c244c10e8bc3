use serde_json::Value;
use tracing::{debug, info, warn};

use crate::batches::BatchRegistry;
use crate::domain::{BatchRecord, RequestId};
use crate::envelope::RpcResponse;
use crate::error::BridgeError;
use crate::handlers::{self, RpcRequest};
use crate::popup::{PopupConfig, PopupTransport};
use crate::ports::{BundlerPort, PopupPort, WalletStatePort};
use crate::queue::{PendingRequestQueue, PendingResponse};

/// Actions taken by the user in the wallet popup, or by the host on its behalf.
#[derive(Debug, Clone)]
pub enum BridgeCommand {
    Approve { request_id: RequestId },
    Deny { request_id: RequestId },
    PopupClosed,
    RecordBatch { record: BatchRecord },
    /// Drops a batch once the page no longer tracks it.
    ForgetBatch { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub settled: Vec<RequestId>,
    pub popup_closed: bool,
}

pub struct Orchestrator<P, B, W>
where
    P: PopupPort,
    B: BundlerPort,
    W: WalletStatePort,
{
    pub popup: PopupTransport<P>,
    pub bundler: B,
    pub wallet: W,
    pub queue: PendingRequestQueue,
    pub batches: BatchRegistry,
}

impl<P, B, W> Orchestrator<P, B, W>
where
    P: PopupPort,
    B: BundlerPort,
    W: WalletStatePort,
{
    pub fn new(popup: P, popup_config: PopupConfig, bundler: B, wallet: W) -> Self {
        Self {
            popup: PopupTransport::new(popup, popup_config),
            bundler,
            wallet,
            queue: PendingRequestQueue::default(),
            batches: BatchRegistry::default(),
        }
    }

    /// Entry point for calls from the embedding page.
    ///
    /// Read-only methods settle before this returns. Methods that need the
    /// user stay queued until a [`BridgeCommand`] settles them or the popup
    /// closes.
    pub fn request(&self, method: &str, params: Value) -> PendingResponse {
        // a popup closed since the last poll takes its waiting requests with it
        if let Err(e) = self.poll_popup() {
            warn!(error = %e, "popup poll failed");
        }
        let (id, response) = self.queue.enqueue(method, params.clone());

        let request = match RpcRequest::parse(method, &params) {
            Ok(request) => request,
            Err(e) => {
                self.settle(id, Err(e));
                return response;
            }
        };

        if !request.method().requires_approval() {
            let outcome = self.execute(&request);
            self.settle(id, outcome);
            return response;
        }

        match self.preflight(&request) {
            Ok(None) => {}
            Ok(Some(early)) => {
                self.settle(id, Ok(early));
                return response;
            }
            Err(e) => {
                self.settle(id, Err(e));
                return response;
            }
        }

        match self.popup.ensure_open() {
            Ok(handle) => {
                if let Err(e) = self.queue.mark_routed(id) {
                    warn!(request_id = %id, error = %e, "could not route request");
                }
                info!(request_id = %id, method, popup = %handle.name(), "awaiting user approval");
            }
            Err(e) => {
                self.settle(id, Err(e));
                self.close_popup_if_idle();
            }
        }
        response
    }

    pub fn handle(&self, command: BridgeCommand) -> Result<CommandResult, BridgeError> {
        match command {
            BridgeCommand::Approve { request_id } => {
                let pending = self.queue.get(request_id).ok_or_else(|| {
                    BridgeError::Lifecycle(format!("{request_id} is not pending"))
                })?;
                let outcome = RpcRequest::parse(&pending.method, &pending.params)
                    .and_then(|request| self.execute(&request));
                self.settle_checked(request_id, outcome)?;
                let popup_closed = self.close_popup_if_idle();
                Ok(CommandResult {
                    settled: vec![request_id],
                    popup_closed,
                })
            }
            BridgeCommand::Deny { request_id } => {
                self.settle_checked(request_id, Err(BridgeError::UserRejected))?;
                let popup_closed = self.close_popup_if_idle();
                Ok(CommandResult {
                    settled: vec![request_id],
                    popup_closed,
                })
            }
            BridgeCommand::PopupClosed => {
                self.popup.close_active();
                let settled = self.queue.reject_all(&BridgeError::UserRejected);
                if !settled.is_empty() {
                    info!(count = settled.len(), "popup closed; pending requests rejected");
                }
                Ok(CommandResult {
                    settled,
                    popup_closed: true,
                })
            }
            BridgeCommand::RecordBatch { record } => {
                handlers::parse_batch_id(&record.id)?;
                self.batches.record(record);
                Ok(CommandResult::default())
            }
            BridgeCommand::ForgetBatch { id } => {
                self.batches
                    .remove(&id)
                    .ok_or(BridgeError::UnknownBundleId(id))?;
                Ok(CommandResult::default())
            }
        }
    }

    /// Rejects everything outstanding if the user closed the popup.
    pub fn poll_popup(&self) -> Result<CommandResult, BridgeError> {
        if self.popup.poll_closed() {
            return self.handle(BridgeCommand::PopupClosed);
        }
        if self.popup.active().is_none() && self.queue.awaiting_user() > 0 {
            // window went away without being observed as closed
            return self.handle(BridgeCommand::PopupClosed);
        }
        Ok(CommandResult::default())
    }

    /// Current chain, for wrapping rejections at the boundary.
    pub fn current_chain_id(&self) -> Result<u64, BridgeError> {
        Ok(self.wallet.snapshot()?.chain_id)
    }

    fn execute(&self, request: &RpcRequest) -> Result<RpcResponse, BridgeError> {
        let ctx = self.wallet.snapshot()?;
        match request {
            RpcRequest::RequestAccounts | RpcRequest::Accounts => {
                let accounts = handlers::request_accounts(&ctx);
                Ok(RpcResponse::success(
                    handlers::accounts_value(&accounts),
                    ctx.chain_id,
                ))
            }
            RpcRequest::ChainId => Ok(RpcResponse::success(
                Value::String(handlers::chain_id(&ctx)),
                ctx.chain_id,
            )),
            RpcRequest::SwitchEthereumChain { chain_id } => {
                let target = handlers::switch_ethereum_chain(chain_id, &ctx)?;
                if target != ctx.chain_id {
                    self.wallet.select_chain(target)?;
                    info!(from = ctx.chain_id, to = target, "chain switched");
                }
                Ok(RpcResponse::success(Value::Null, target))
            }
            RpcRequest::GetCapabilities { address, chain_ids } => {
                let capabilities =
                    handlers::get_capabilities(address.as_deref(), chain_ids.as_deref(), &ctx)?;
                let value = serde_json::to_value(capabilities)
                    .map_err(|e| BridgeError::Upstream(format!("capabilities encode: {e}")))?;
                Ok(RpcResponse::success(value, ctx.chain_id))
            }
            RpcRequest::GetCallsStatus { id } => {
                let batch = self
                    .batches
                    .get(id)
                    .ok_or_else(|| BridgeError::UnknownBundleId(id.clone()))?;
                debug!(batch_id = %batch.id, chain_id = batch.chain_id, "fetching user operation receipt");
                let receipt = self
                    .bundler
                    .user_operation_receipt(batch.chain_id, batch.user_op_hash)?;
                let status = handlers::get_calls_status(&batch, receipt.as_ref());
                let value = serde_json::to_value(status)
                    .map_err(|e| BridgeError::Upstream(format!("calls status encode: {e}")))?;
                Ok(RpcResponse::success(value, batch.chain_id))
            }
        }
    }

    /// Answers approval methods that need no user input, or fails them early.
    fn preflight(&self, request: &RpcRequest) -> Result<Option<RpcResponse>, BridgeError> {
        if let RpcRequest::SwitchEthereumChain { chain_id } = request {
            let ctx = self.wallet.snapshot()?;
            let target = handlers::switch_ethereum_chain(chain_id, &ctx)?;
            if target == ctx.chain_id {
                return Ok(Some(RpcResponse::success(Value::Null, target)));
            }
        }
        Ok(None)
    }

    fn settle(&self, id: RequestId, outcome: Result<RpcResponse, BridgeError>) {
        if let Err(e) = self.settle_checked(id, outcome) {
            warn!(request_id = %id, error = %e, "settlement failed");
        }
    }

    fn settle_checked(
        &self,
        id: RequestId,
        outcome: Result<RpcResponse, BridgeError>,
    ) -> Result<(), BridgeError> {
        match outcome {
            Ok(response) => self.queue.resolve(id, response),
            Err(e) => {
                debug!(request_id = %id, code = e.code(), error = %e, "rejecting request");
                self.queue.reject(id, e)
            }
        }
    }

    fn close_popup_if_idle(&self) -> bool {
        if self.queue.awaiting_user() > 0 {
            return false;
        }
        if self.popup.active().is_none() {
            return false;
        }
        self.popup.close_active();
        true
    }
}
