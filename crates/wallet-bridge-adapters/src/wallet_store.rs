use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use tracing::info;

use wallet_bridge_core::{PortError, WalletContext, WalletStatePort};

use crate::BridgeAdapterConfig;

/// Account and chain selection held in memory for the page session.
#[derive(Debug, Clone)]
pub struct WalletStoreAdapter {
    inner: Arc<Mutex<WalletContext>>,
}

impl Default for WalletStoreAdapter {
    fn default() -> Self {
        Self::with_config(&BridgeAdapterConfig::default())
    }
}

impl WalletStoreAdapter {
    pub fn with_config(config: &BridgeAdapterConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WalletContext {
                chain_id: config.initial_chain_id,
                selected_account: config.accounts.first().copied(),
                authorized_accounts: config.accounts.clone(),
                supported_chains: config.supported_chains.clone(),
                entry_point: config.entry_point,
            })),
        }
    }

    /// Replaces the accounts authorized for the embedding page. The first
    /// one becomes the selected account.
    pub fn connect_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.selected_account = accounts.first().copied();
        g.authorized_accounts = accounts;
        Ok(())
    }

    pub fn select_account(&self, account: Address) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if !g.authorized_accounts.contains(&account) {
            return Err(PortError::Validation(format!(
                "account {account} is not connected"
            )));
        }
        g.selected_account = Some(account);
        Ok(())
    }

    pub fn disconnect(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.selected_account = None;
        g.authorized_accounts.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, WalletContext>, PortError> {
        self.inner
            .lock()
            .map_err(|e| PortError::Transport(format!("wallet store lock poisoned: {e}")))
    }
}

impl WalletStatePort for WalletStoreAdapter {
    fn snapshot(&self) -> Result<WalletContext, PortError> {
        Ok(self.lock()?.clone())
    }

    fn select_chain(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if !g.supports_chain(chain_id) {
            return Err(PortError::Validation(format!(
                "chain {chain_id} is not supported"
            )));
        }
        if g.chain_id != chain_id {
            info!(from = g.chain_id, to = chain_id, "selected chain changed");
            g.chain_id = chain_id;
        }
        Ok(())
    }
}
