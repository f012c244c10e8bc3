mod common;

use serde_json::json;
use wallet_bridge_core::{codes, BridgeCommand, BridgeError, PopupPort, WindowRef};

use common::{new_orchestrator, settled};

#[test]
fn blocked_popup_rejects_and_leaves_queue_empty() {
    let orch = new_orchestrator();
    orch.popup.port().set_blocked(true).expect("block");

    let err = settled(orch.request("eth_requestAccounts", json!([]))).expect_err("blocked");
    assert_eq!(err, BridgeError::PopupBlocked);
    assert_eq!(err.to_rpc_error().code, codes::INTERNAL);
    assert!(orch.queue.is_empty());
    assert!(orch.popup.port().windows().expect("windows").is_empty());

    // the next attempt can open once the blocker is lifted
    orch.popup.port().set_blocked(false).expect("unblock");
    let pending = orch.request("eth_requestAccounts", json!([]));
    assert_eq!(orch.queue.awaiting_user(), 1);
    assert_eq!(orch.popup.port().open_windows().expect("windows").len(), 1);
    drop(pending);
}

#[test]
fn popup_is_centered_over_caller_frame() {
    let orch = new_orchestrator();
    let _pending = orch.request("eth_requestAccounts", json!([]));

    let windows = orch.popup.port().open_windows().expect("windows");
    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    // default caller frame is 1440x900 at the origin
    assert_eq!((window.geometry.left, window.geometry.top), (510, 90));
    assert_eq!((window.geometry.width, window.geometry.height), (420, 720));
    assert_eq!(window.url, orch.popup.config().wallet_url);
    assert!(window.name.starts_with("wallet-popup-"));
    assert!(window.name.ends_with("-1"));
}

#[test]
fn user_closing_popup_rejects_every_pending_request() {
    let orch = new_orchestrator();
    let first = orch.request("eth_requestAccounts", json!([]));
    let second = orch.request("wallet_switchEthereumChain", json!([{"chainId": "0x14a34"}]));
    assert_eq!(orch.popup.port().open_windows().expect("windows").len(), 1);

    let name = orch.popup.active().expect("active popup").name().to_owned();
    orch.popup
        .port()
        .simulate_user_close(&name)
        .expect("user close");

    let result = orch.poll_popup().expect("poll");
    assert!(result.popup_closed);
    assert_eq!(result.settled, vec![first.id(), second.id()]);
    assert_eq!(settled(first).expect_err("closed"), BridgeError::UserRejected);
    assert_eq!(settled(second).expect_err("closed"), BridgeError::UserRejected);
    assert!(orch.queue.is_empty());

    // a second poll sees nothing new
    assert_eq!(orch.poll_popup().expect("poll"), Default::default());
}

#[test]
fn closing_is_idempotent() {
    let orch = new_orchestrator();
    let pending = orch.request("eth_requestAccounts", json!([]));
    let handle = orch.popup.active().expect("active popup");

    orch.popup.close(Some(&handle));
    orch.popup.close(Some(&handle));
    orch.popup.close(None);
    orch.popup.close_active();
    assert!(orch.popup.active().is_none());
    assert!(orch
        .popup
        .port()
        .is_window_closed(&WindowRef {
            name: handle.name().to_owned()
        })
        .expect("closed check"));

    // the request stays queued until the host reports the close
    assert_eq!(orch.queue.awaiting_user(), 1);
    let result = orch.handle(BridgeCommand::PopupClosed).expect("closed");
    assert_eq!(result.settled, vec![pending.id()]);
}

#[test]
fn new_popup_gets_fresh_name_after_previous_closed() {
    let orch = new_orchestrator();
    let first = orch.request("eth_requestAccounts", json!([]));
    orch.handle(BridgeCommand::Deny {
        request_id: first.id(),
    })
    .expect("deny");
    assert!(orch.popup.active().is_none());

    let _second = orch.request("eth_requestAccounts", json!([]));
    let windows = orch.popup.port().windows().expect("windows");
    assert_eq!(windows.len(), 2);
    assert_ne!(windows[0].name, windows[1].name);
    assert_eq!(orch.popup.port().open_windows().expect("open").len(), 1);
}
