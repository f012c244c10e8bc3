use std::collections::BTreeMap;

use alloy::primitives::Address;
use tracing::warn;

use wallet_bridge_core::{PopupConfig, PortError, ScreenFrame, ENTRY_POINT_V07};

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11_155_111;
pub const BASE: u64 = 8_453;
pub const BASE_SEPOLIA: u64 = 84_532;
pub const ARBITRUM_SEPOLIA: u64 = 421_614;
pub const OPTIMISM_SEPOLIA: u64 = 11_155_420;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct BridgeAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub wallet_url: String,
    pub popup_width: u32,
    pub popup_height: u32,
    /// Caller window assumed by the headless popup host.
    pub caller_frame: ScreenFrame,
    pub supported_chains: Vec<u64>,
    pub initial_chain_id: u64,
    /// Accounts connected at startup; the first is selected.
    pub accounts: Vec<Address>,
    pub entry_point: Address,
    pub bundler_urls: BTreeMap<u64, String>,
    pub bundler_timeout_ms: u64,
    pub auto_approve: bool,
}

impl Default for BridgeAdapterConfig {
    fn default() -> Self {
        let defaults = PopupConfig::default();
        Self {
            runtime_profile: RuntimeProfile::Development,
            wallet_url: defaults.wallet_url,
            popup_width: defaults.width,
            popup_height: defaults.height,
            caller_frame: ScreenFrame {
                x: 0,
                y: 0,
                width: 1440,
                height: 900,
            },
            supported_chains: vec![SEPOLIA, BASE_SEPOLIA, ARBITRUM_SEPOLIA, OPTIMISM_SEPOLIA],
            initial_chain_id: SEPOLIA,
            accounts: Vec::new(),
            entry_point: ENTRY_POINT_V07,
            bundler_urls: BTreeMap::new(),
            bundler_timeout_ms: 15_000,
            auto_approve: false,
        }
    }
}

impl BridgeAdapterConfig {
    /// Reads `WALLET_BRIDGE_*` variables over the defaults. Malformed values
    /// are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(profile) = env_var("WALLET_BRIDGE_PROFILE") {
            match profile.to_ascii_lowercase().as_str() {
                "production" | "prod" => cfg.runtime_profile = RuntimeProfile::Production,
                "development" | "dev" => cfg.runtime_profile = RuntimeProfile::Development,
                other => warn!(value = other, "unknown WALLET_BRIDGE_PROFILE"),
            }
        }
        if let Some(url) = env_var("WALLET_BRIDGE_WALLET_URL") {
            cfg.wallet_url = url;
        }
        if let Some(v) = env_parse::<u32>("WALLET_BRIDGE_POPUP_WIDTH") {
            cfg.popup_width = v;
        }
        if let Some(v) = env_parse::<u32>("WALLET_BRIDGE_POPUP_HEIGHT") {
            cfg.popup_height = v;
        }
        if let Some(raw) = env_var("WALLET_BRIDGE_SUPPORTED_CHAINS") {
            match parse_chain_list(&raw) {
                Ok(chains) if !chains.is_empty() => cfg.supported_chains = chains,
                Ok(_) => warn!("WALLET_BRIDGE_SUPPORTED_CHAINS is empty; keeping defaults"),
                Err(e) => warn!(error = %e, "invalid WALLET_BRIDGE_SUPPORTED_CHAINS"),
            }
        }
        if let Some(v) = env_parse::<u64>("WALLET_BRIDGE_CHAIN_ID") {
            cfg.initial_chain_id = v;
        }
        if let Some(raw) = env_var("WALLET_BRIDGE_ACCOUNTS") {
            match parse_account_list(&raw) {
                Ok(accounts) => cfg.accounts = accounts,
                Err(e) => warn!(error = %e, "invalid WALLET_BRIDGE_ACCOUNTS"),
            }
        }
        if let Some(raw) = env_var("WALLET_BRIDGE_BUNDLER_URLS") {
            match parse_bundler_urls(&raw) {
                Ok(urls) => cfg.bundler_urls = urls,
                Err(e) => warn!(error = %e, "invalid WALLET_BRIDGE_BUNDLER_URLS"),
            }
        }
        if let Some(v) = env_parse::<u64>("WALLET_BRIDGE_BUNDLER_TIMEOUT_MS") {
            cfg.bundler_timeout_ms = v;
        }
        if let Some(v) = env_var("WALLET_BRIDGE_AUTO_APPROVE") {
            cfg.auto_approve = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    /// Popup settings with a random window-name prefix, so windows from
    /// different bridge instances never share a name.
    pub fn popup_config(&self) -> Result<PopupConfig, PortError> {
        let mut tag = [0u8; 4];
        getrandom::getrandom(&mut tag)
            .map_err(|e| PortError::Transport(format!("popup tag generation failed: {e}")))?;
        Ok(PopupConfig {
            wallet_url: self.wallet_url.clone(),
            width: self.popup_width,
            height: self.popup_height,
            name_prefix: format!("wallet-popup-{}", alloy::hex::encode(tag)),
        })
    }
}

/// `"11155111,0x14a34"`; decimal or `0x` hex entries.
pub fn parse_chain_list(raw: &str) -> Result<Vec<u64>, PortError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_chain_id_str)
        .collect()
}

pub fn parse_account_list(raw: &str) -> Result<Vec<Address>, PortError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| PortError::Validation(format!("invalid account {s}: {e}")))
        })
        .collect()
}

/// `"84532=https://bundler.example/base-sepolia,11155111=https://..."`.
pub fn parse_bundler_urls(raw: &str) -> Result<BTreeMap<u64, String>, PortError> {
    let mut urls = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (chain, url) = entry
            .split_once('=')
            .ok_or_else(|| PortError::Validation(format!("expected chain=url, got {entry}")))?;
        urls.insert(parse_chain_id_str(chain.trim())?, url.trim().to_owned());
    }
    Ok(urls)
}

pub(crate) fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(PortError::Validation(format!("invalid chain id {raw}")));
    }
    u64::from_str_radix(digits, radix)
        .map_err(|e| PortError::Validation(format!("invalid chain id {raw}: {e}")))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_var(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed setting");
            None
        }
    }
}
