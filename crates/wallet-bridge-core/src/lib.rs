/// Acquire mutex lock, recovering from poisoned state if necessary.
macro_rules! lock_or_recover {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    };
}

pub mod batches;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod popup;
pub mod ports;
pub mod queue;
pub mod state_machine;

pub use batches::BatchRegistry;
pub use domain::{
    format_chain_id, parse_hex_chain_id, BatchRecord, BatchStatus, CallReceipt, CallsStatus,
    Capabilities, Log, PopupGeometry, RequestId, RpcMethod, ScreenFrame, TransactionReceipt,
    UserOperationReceipt, WalletContext, WindowRef, WindowRequest, CALLS_STATUS_VERSION,
    ENTRY_POINT_V07,
};
pub use envelope::{ResponseData, RpcOutcome, RpcResponse};
pub use error::{codes, BridgeError, RpcError};
pub use handlers::RpcRequest;
pub use orchestrator::{BridgeCommand, CommandResult, Orchestrator};
pub use popup::{centered_geometry, PopupConfig, PopupHandle, PopupTransport};
pub use ports::{BundlerPort, PopupPort, PortError, WalletStatePort};
pub use queue::{PendingRequest, PendingRequestQueue, PendingResponse};
pub use state_machine::{request_transition, RequestAction, RequestStatus};
