#![allow(dead_code)]

use alloy::primitives::{Address, B256, U256, U64};

use wallet_bridge_adapters::{
    BridgeAdapterConfig, BundlerAdapter, HeadlessPopupAdapter, WalletStoreAdapter,
};
use wallet_bridge_core::{
    BridgeError, Orchestrator, PendingResponse, RpcResponse, TransactionReceipt,
    UserOperationReceipt, ENTRY_POINT_V07,
};

pub type TestOrchestrator = Orchestrator<HeadlessPopupAdapter, BundlerAdapter, WalletStoreAdapter>;

pub fn new_orchestrator() -> TestOrchestrator {
    let config = BridgeAdapterConfig::default();
    let wallet = WalletStoreAdapter::with_config(&config);
    wallet
        .connect_accounts(vec![owner_address(), second_address()])
        .expect("connect accounts");
    Orchestrator::new(
        HeadlessPopupAdapter::with_config(&config),
        config.popup_config().expect("popup config"),
        BundlerAdapter::in_memory(),
        wallet,
    )
}

pub fn owner_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid owner address")
}

pub fn second_address() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid second address")
}

pub fn sample_receipt(hash: B256, success: bool) -> UserOperationReceipt {
    UserOperationReceipt {
        user_op_hash: hash,
        entry_point: ENTRY_POINT_V07,
        sender: owner_address(),
        nonce: U256::from(3),
        success,
        actual_gas_cost: U256::from(1_000_000u64),
        actual_gas_used: U256::from(90_000u64),
        paymaster: None,
        reason: None,
        logs: vec![],
        receipt: TransactionReceipt {
            transaction_hash: B256::repeat_byte(0xaa),
            block_hash: B256::repeat_byte(0xbb),
            block_number: U64::from(77),
            gas_used: U256::from(120_000u64),
            logs: vec![],
        },
    }
}

/// Settlement of a request that must already be settled.
pub fn settled(mut response: PendingResponse) -> Result<RpcResponse, BridgeError> {
    response
        .try_settled()
        .expect("request should be settled by now")
}
