use alloy::primitives::B256;
use thiserror::Error;

use crate::domain::{ScreenFrame, UserOperationReceipt, WalletContext, WindowRef, WindowRequest};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

/// Host that can create and observe wallet windows.
pub trait PopupPort {
    /// Position and size of the window issuing the request.
    fn caller_frame(&self) -> Result<ScreenFrame, PortError>;
    /// `Ok(None)` means the host refused to create the window.
    fn open_window(&self, request: &WindowRequest) -> Result<Option<WindowRef>, PortError>;
    fn close_window(&self, window: &WindowRef) -> Result<(), PortError>;
    fn is_window_closed(&self, window: &WindowRef) -> Result<bool, PortError>;
}

pub trait BundlerPort {
    fn user_operation_receipt(
        &self,
        chain_id: u64,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, PortError>;
}

/// Account and chain selection owned outside the bridge.
pub trait WalletStatePort {
    fn snapshot(&self) -> Result<WalletContext, PortError>;
    fn select_chain(&self, chain_id: u64) -> Result<(), PortError>;
}
