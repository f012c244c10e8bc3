use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::RequestId;
use crate::envelope::RpcResponse;
use crate::error::BridgeError;
use crate::state_machine::{request_transition, RequestAction, RequestStatus};

type Settlement = Result<RpcResponse, BridgeError>;

/// Bookkeeping view of a queued call.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub method: String,
    pub params: Value,
    pub status: RequestStatus,
}

struct Entry {
    request: PendingRequest,
    sender: oneshot::Sender<Settlement>,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    entries: BTreeMap<RequestId, Entry>,
}

/// Outstanding calls and their continuations. Method and params are stored
/// as received and never interpreted here.
#[derive(Default)]
pub struct PendingRequestQueue {
    inner: Mutex<QueueState>,
}

impl PendingRequestQueue {
    pub fn enqueue(&self, method: impl Into<String>, params: Value) -> (RequestId, PendingResponse) {
        let (sender, receiver) = oneshot::channel();
        let mut g = lock_or_recover!(self.inner);
        g.next_id = g.next_id.saturating_add(1);
        let id = RequestId(g.next_id);
        let request = PendingRequest {
            id,
            method: method.into(),
            params,
            status: RequestStatus::Pending,
        };
        debug!(request_id = %id, method = %request.method, "request enqueued");
        g.entries.insert(id, Entry { request, sender });
        (id, PendingResponse { id, receiver })
    }

    pub fn mark_routed(&self, id: RequestId) -> Result<(), BridgeError> {
        let mut g = lock_or_recover!(self.inner);
        let entry = g
            .entries
            .get_mut(&id)
            .ok_or_else(|| BridgeError::Lifecycle(format!("{id} is not pending")))?;
        let (next, reason) = request_transition(entry.request.status, RequestAction::Route)?;
        entry.request.status = next;
        debug!(request_id = %id, reason, "request routed");
        Ok(())
    }

    pub fn resolve(&self, id: RequestId, response: RpcResponse) -> Result<(), BridgeError> {
        self.settle(id, RequestAction::Resolve, Ok(response))
    }

    pub fn reject(&self, id: RequestId, error: BridgeError) -> Result<(), BridgeError> {
        self.settle(id, RequestAction::Reject, Err(error))
    }

    /// Rejects every outstanding request with `error`; returns the settled ids.
    pub fn reject_all(&self, error: &BridgeError) -> Vec<RequestId> {
        let drained = {
            let mut g = lock_or_recover!(self.inner);
            std::mem::take(&mut g.entries)
        };
        let mut settled = Vec::with_capacity(drained.len());
        for (id, entry) in drained {
            debug!(request_id = %id, %error, "request rejected in bulk");
            if entry.sender.send(Err(error.clone())).is_err() {
                debug!(request_id = %id, "caller dropped before settlement");
            }
            settled.push(id);
        }
        settled
    }

    pub fn get(&self, id: RequestId) -> Option<PendingRequest> {
        let g = lock_or_recover!(self.inner);
        g.entries.get(&id).map(|e| e.request.clone())
    }

    pub fn pending(&self) -> Vec<PendingRequest> {
        let g = lock_or_recover!(self.inner);
        g.entries.values().map(|e| e.request.clone()).collect()
    }

    pub fn awaiting_user(&self) -> usize {
        let g = lock_or_recover!(self.inner);
        g.entries
            .values()
            .filter(|e| e.request.status == RequestStatus::AwaitingUser)
            .count()
    }

    pub fn len(&self) -> usize {
        lock_or_recover!(self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn settle(
        &self,
        id: RequestId,
        action: RequestAction,
        outcome: Settlement,
    ) -> Result<(), BridgeError> {
        let entry = {
            let mut g = lock_or_recover!(self.inner);
            let entry = g.entries.get(&id).ok_or_else(|| {
                BridgeError::Lifecycle(format!("{id} is unknown or already settled"))
            })?;
            let (next, reason) = request_transition(entry.request.status, action)?;
            debug!(request_id = %id, ?next, reason, "request settled");
            g.entries.remove(&id)
        };
        if let Some(entry) = entry {
            if entry.sender.send(outcome).is_err() {
                debug!(request_id = %id, "caller dropped before settlement");
            }
        }
        Ok(())
    }
}

/// Resolves once the matching request is settled.
#[derive(Debug)]
pub struct PendingResponse {
    id: RequestId,
    receiver: oneshot::Receiver<Settlement>,
}

impl PendingResponse {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Non-blocking check; `None` while the request is still outstanding.
    pub fn try_settled(&mut self) -> Option<Settlement> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(dropped(self.id))),
        }
    }
}

impl Future for PendingResponse {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|_| Err(dropped(id))))
    }
}

fn dropped(id: RequestId) -> BridgeError {
    BridgeError::Lifecycle(format!("{id} was dropped without settlement"))
}
