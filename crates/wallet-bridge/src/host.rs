use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use eyre::{Result, WrapErr};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use wallet_bridge_core::{
    BatchRecord, BridgeError, CommandResult, PendingResponse, RequestId, RpcResponse,
};

use crate::bridge::WalletBridge;

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;

/// Provider call from the embedding page.
#[derive(Debug, Deserialize)]
struct ProviderRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Actions the wallet popup would otherwise send.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
enum HostCommand {
    #[serde(rename_all = "camelCase")]
    Approve { request_id: u64 },
    #[serde(rename_all = "camelCase")]
    Deny { request_id: u64 },
    PopupClosed,
    RecordBatch(BatchRecord),
    ForgetBatch { id: String },
}

#[derive(Debug)]
enum HostMessage {
    Request(ProviderRequest),
    Command(HostCommand),
}

fn parse_message(line: &str) -> std::result::Result<HostMessage, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;
    if value.get("command").is_some() {
        serde_json::from_value(value).map(HostMessage::Command)
    } else {
        serde_json::from_value(value).map(HostMessage::Request)
    }
}

/// Line-delimited stdio loop around a [`WalletBridge`].
pub struct Host {
    bridge: WalletBridge,
    auto_approve: bool,
    inflight: BTreeMap<RequestId, (Value, PendingResponse)>,
    last_chain_id: u64,
}

impl Host {
    pub fn new(bridge: WalletBridge, auto_approve: bool) -> Self {
        let mut last_chain_id = 0;
        chain_id_or_last(bridge.chain_id(), &mut last_chain_id);
        Self {
            bridge,
            auto_approve,
            inflight: BTreeMap::new(),
            last_chain_id,
        }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        for line in input.lines() {
            let line = line.wrap_err("failed to read stdin")?;
            self.handle_line(&line, &mut out)?;
        }
        if !self.inflight.is_empty() {
            info!(count = self.inflight.len(), "input closed with requests still pending");
        }
        Ok(())
    }

    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        match parse_message(line) {
            Ok(HostMessage::Request(request)) => self.submit(request, out)?,
            Ok(HostMessage::Command(command)) => self.command(command, out)?,
            Err(e) => {
                warn!(error = %e, "rejecting malformed input line");
                let code = if e.is_syntax() || e.is_eof() {
                    PARSE_ERROR
                } else {
                    INVALID_REQUEST
                };
                let id = serde_json::from_str::<Value>(line)
                    .ok()
                    .and_then(|v| v.get("id").cloned())
                    .unwrap_or(Value::Null);
                emit(
                    out,
                    &json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": code, "message": e.to_string()},
                    }),
                )?;
            }
        }

        let polled = self.bridge.poll_popup()?;
        if polled.popup_closed {
            info!(settled = polled.settled.len(), "popup closed by user");
        }
        self.flush_settled(out)
    }

    fn submit<W: Write>(&mut self, request: ProviderRequest, out: &mut W) -> Result<()> {
        let pending = self.bridge.request(&request.method, request.params);
        let request_id = pending.id();
        debug!(%request_id, method = %request.method, "provider request submitted");
        let caller_id = request.id;

        if self.bridge.is_awaiting_user(request_id) {
            if self.auto_approve {
                if let Err(e) = self.bridge.approve(request_id) {
                    warn!(%request_id, error = %e, "auto-approve failed");
                }
            } else {
                emit(
                    out,
                    &json!({
                        "jsonrpc": "2.0",
                        "method": "bridge_awaitingApproval",
                        "params": {
                            "requestId": request_id.0,
                            "id": caller_id,
                            "method": request.method,
                            "popup": self.bridge.active_popup(),
                        },
                    }),
                )?;
            }
        }
        self.inflight.insert(request_id, (caller_id, pending));
        Ok(())
    }

    fn command<W: Write>(&mut self, command: HostCommand, out: &mut W) -> Result<()> {
        let outcome = match command {
            HostCommand::Approve { request_id } => self.bridge.approve(RequestId(request_id)),
            HostCommand::Deny { request_id } => self.bridge.deny(RequestId(request_id)),
            HostCommand::PopupClosed => self.bridge.popup_closed(),
            HostCommand::RecordBatch(record) => self.bridge.record_batch(record),
            HostCommand::ForgetBatch { id } => self.bridge.forget_batch(id),
        };
        emit(out, &command_line(outcome))
    }

    fn flush_settled<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut settled = Vec::new();
        for (request_id, (caller_id, pending)) in self.inflight.iter_mut() {
            if let Some(outcome) = pending.try_settled() {
                settled.push((*request_id, caller_id.clone(), outcome));
            }
        }

        for (request_id, caller_id, outcome) in settled {
            self.inflight.remove(&request_id);
            let envelope = match outcome {
                Ok(envelope) => envelope,
                Err(e) => {
                    let current = self.bridge.chain_id();
                    let chain_id = chain_id_or_last(current, &mut self.last_chain_id);
                    RpcResponse::failure(&e, chain_id)
                }
            };
            emit(
                out,
                &json!({
                    "jsonrpc": "2.0",
                    "id": caller_id,
                    "result": envelope.result,
                    "data": envelope.data,
                }),
            )?;
        }
        Ok(())
    }
}

/// Current chain if the wallet can report it, else the last one seen.
fn chain_id_or_last(current: std::result::Result<u64, BridgeError>, last: &mut u64) -> u64 {
    match current {
        Ok(chain_id) => {
            *last = chain_id;
            chain_id
        }
        Err(e) => {
            warn!(error = %e, fallback = *last, "chain id unavailable; using last known");
            *last
        }
    }
}

fn command_line(outcome: std::result::Result<CommandResult, BridgeError>) -> Value {
    match outcome {
        Ok(result) => json!({
            "jsonrpc": "2.0",
            "method": "bridge_commandResult",
            "params": {
                "settled": result.settled.iter().map(|id| id.0).collect::<Vec<_>>(),
                "popupClosed": result.popup_closed,
            },
        }),
        Err(e) => json!({
            "jsonrpc": "2.0",
            "method": "bridge_commandError",
            "params": {"error": e.to_rpc_error()},
        }),
    }
}

fn emit<W: Write>(out: &mut W, line: &Value) -> Result<()> {
    writeln!(out, "{line}").wrap_err("failed to write response")?;
    out.flush().wrap_err("failed to flush response")
}
