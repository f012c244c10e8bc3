use wallet_bridge_core::{request_transition, BridgeError, RequestAction, RequestStatus};

#[test]
fn approval_path_transitions() {
    let (s1, _) =
        request_transition(RequestStatus::Pending, RequestAction::Route).expect("pending -> routed");
    assert_eq!(s1, RequestStatus::AwaitingUser);
    let (s2, _) = request_transition(s1, RequestAction::Resolve).expect("awaiting -> resolved");
    assert_eq!(s2, RequestStatus::Resolved);
    assert!(s2.is_settled());
}

#[test]
fn read_only_path_resolves_directly() {
    let (s1, _) = request_transition(RequestStatus::Pending, RequestAction::Resolve)
        .expect("pending -> resolved");
    assert_eq!(s1, RequestStatus::Resolved);
}

#[test]
fn rejection_is_allowed_before_settlement() {
    for from in [RequestStatus::Pending, RequestStatus::AwaitingUser] {
        let (to, _) = request_transition(from, RequestAction::Reject).expect("reject");
        assert_eq!(to, RequestStatus::Rejected);
    }
}

#[test]
fn settled_requests_cannot_settle_again() {
    for from in [RequestStatus::Resolved, RequestStatus::Rejected] {
        for action in [
            RequestAction::Route,
            RequestAction::Resolve,
            RequestAction::Reject,
        ] {
            let err = request_transition(from, action).expect_err("must fail");
            assert!(matches!(err, BridgeError::Lifecycle(_)));
            assert!(err.to_string().contains("illegal request transition"));
        }
    }
}

#[test]
fn routing_twice_is_rejected() {
    let err = request_transition(RequestStatus::AwaitingUser, RequestAction::Route)
        .expect_err("must fail");
    assert!(matches!(err, BridgeError::Lifecycle(_)));
}
