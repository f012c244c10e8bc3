use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    AwaitingUser,
    Resolved,
    Rejected,
}

impl RequestStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Route,
    Resolve,
    Reject,
}

pub fn request_transition(
    from: RequestStatus,
    action: RequestAction,
) -> Result<(RequestStatus, &'static str), BridgeError> {
    use RequestAction as A;
    use RequestStatus as S;

    let next = match (from, action) {
        (S::Pending, A::Route) => (S::AwaitingUser, "routed to wallet popup"),
        (S::Pending, A::Resolve) => (S::Resolved, "answered without approval"),
        (S::AwaitingUser, A::Resolve) => (S::Resolved, "approved in wallet popup"),
        (S::Pending | S::AwaitingUser, A::Reject) => (S::Rejected, "rejected"),
        _ => {
            return Err(BridgeError::Lifecycle(format!(
                "illegal request transition {from:?} --{action:?}-->"
            )))
        }
    };
    Ok(next)
}
