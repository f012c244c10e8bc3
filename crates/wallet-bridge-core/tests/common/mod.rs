#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256, U64};

use wallet_bridge_core::{
    BundlerPort, Orchestrator, PopupConfig, PopupPort, PortError, ScreenFrame, TransactionReceipt,
    UserOperationReceipt, WalletContext, WalletStatePort, WindowRef, WindowRequest,
    ENTRY_POINT_V07,
};

pub const BASE_SEPOLIA: u64 = 84532;
pub const SEPOLIA: u64 = 11155111;

#[derive(Debug, Clone, Default)]
pub struct FakePopup {
    inner: Arc<Mutex<FakePopupState>>,
}

#[derive(Debug, Default)]
pub struct FakePopupState {
    pub blocked: bool,
    pub opened: Vec<WindowRequest>,
    pub closed: HashSet<String>,
    pub close_calls: usize,
}

impl FakePopup {
    pub fn blocked() -> Self {
        let popup = Self::default();
        popup.inner.lock().expect("popup lock").blocked = true;
        popup
    }

    pub fn user_closes(&self, name: &str) {
        self.inner
            .lock()
            .expect("popup lock")
            .closed
            .insert(name.to_owned());
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakePopupState> {
        self.inner.lock().expect("popup lock")
    }
}

impl PopupPort for FakePopup {
    fn caller_frame(&self) -> Result<ScreenFrame, PortError> {
        Ok(ScreenFrame {
            x: 0,
            y: 0,
            width: 1440,
            height: 900,
        })
    }

    fn open_window(&self, request: &WindowRequest) -> Result<Option<WindowRef>, PortError> {
        let mut g = self.inner.lock().expect("popup lock");
        if g.blocked {
            return Ok(None);
        }
        g.opened.push(request.clone());
        Ok(Some(WindowRef {
            name: request.name.clone(),
        }))
    }

    fn close_window(&self, window: &WindowRef) -> Result<(), PortError> {
        let mut g = self.inner.lock().expect("popup lock");
        g.close_calls += 1;
        g.closed.insert(window.name.clone());
        Ok(())
    }

    fn is_window_closed(&self, window: &WindowRef) -> Result<bool, PortError> {
        Ok(self
            .inner
            .lock()
            .expect("popup lock")
            .closed
            .contains(&window.name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBundler {
    receipts: Arc<Mutex<HashMap<(u64, B256), UserOperationReceipt>>>,
    pub lookups: Arc<Mutex<Vec<(u64, B256)>>>,
    pub fail: bool,
}

impl FakeBundler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, chain_id: u64, receipt: UserOperationReceipt) {
        self.receipts
            .lock()
            .expect("bundler lock")
            .insert((chain_id, receipt.user_op_hash), receipt);
    }
}

impl BundlerPort for FakeBundler {
    fn user_operation_receipt(
        &self,
        chain_id: u64,
        user_op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, PortError> {
        self.lookups
            .lock()
            .expect("lookups lock")
            .push((chain_id, user_op_hash));
        if self.fail {
            return Err(PortError::Transport("bundler unreachable".to_owned()));
        }
        Ok(self
            .receipts
            .lock()
            .expect("bundler lock")
            .get(&(chain_id, user_op_hash))
            .cloned())
    }
}

#[derive(Debug, Clone)]
pub struct FakeWallet {
    inner: Arc<Mutex<WalletContext>>,
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(context())),
        }
    }
}

impl FakeWallet {
    pub fn chain_id(&self) -> u64 {
        self.inner.lock().expect("wallet lock").chain_id
    }
}

impl WalletStatePort for FakeWallet {
    fn snapshot(&self) -> Result<WalletContext, PortError> {
        Ok(self.inner.lock().expect("wallet lock").clone())
    }

    fn select_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.inner.lock().expect("wallet lock").chain_id = chain_id;
        Ok(())
    }
}

pub type TestOrchestrator = Orchestrator<FakePopup, FakeBundler, FakeWallet>;

pub fn new_orchestrator() -> TestOrchestrator {
    orchestrator_with(FakePopup::default(), FakeBundler::default())
}

pub fn orchestrator_with(popup: FakePopup, bundler: FakeBundler) -> TestOrchestrator {
    Orchestrator::new(popup, PopupConfig::default(), bundler, FakeWallet::default())
}

pub fn account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn other_account() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid account")
}

pub fn context() -> WalletContext {
    WalletContext {
        chain_id: SEPOLIA,
        selected_account: Some(account()),
        authorized_accounts: vec![account(), other_account()],
        supported_chains: vec![SEPOLIA, BASE_SEPOLIA],
        entry_point: ENTRY_POINT_V07,
    }
}

pub fn user_op_hash(seed: u8) -> B256 {
    B256::repeat_byte(seed)
}

pub fn receipt(hash: B256, success: bool) -> UserOperationReceipt {
    UserOperationReceipt {
        user_op_hash: hash,
        entry_point: ENTRY_POINT_V07,
        sender: account(),
        nonce: U256::from(1),
        success,
        actual_gas_cost: U256::from(21_000u64 * 1_000_000_000),
        actual_gas_used: U256::from(21_000),
        paymaster: None,
        reason: None,
        logs: vec![],
        receipt: TransactionReceipt {
            transaction_hash: B256::repeat_byte(0xaa),
            block_hash: B256::repeat_byte(0xbb),
            block_number: U64::from(1_234),
            gas_used: U256::from(60_000),
            logs: vec![],
        },
    }
}
