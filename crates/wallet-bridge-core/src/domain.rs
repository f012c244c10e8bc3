use std::collections::BTreeMap;
use std::fmt;

use alloy::primitives::{address, Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// ERC-4337 v0.7 entry point, the same address on every supported chain.
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

/// EIP-5792 response version reported by `wallet_getCallsStatus`.
pub const CALLS_STATUS_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    EthRequestAccounts,
    EthAccounts,
    EthChainId,
    WalletSwitchEthereumChain,
    WalletGetCapabilities,
    WalletGetCallsStatus,
}

impl RpcMethod {
    pub fn from_rpc_name(name: &str) -> Option<Self> {
        match name {
            "eth_requestAccounts" => Some(Self::EthRequestAccounts),
            "eth_accounts" => Some(Self::EthAccounts),
            "eth_chainId" => Some(Self::EthChainId),
            "wallet_switchEthereumChain" => Some(Self::WalletSwitchEthereumChain),
            "wallet_getCapabilities" => Some(Self::WalletGetCapabilities),
            "wallet_getCallsStatus" => Some(Self::WalletGetCallsStatus),
            _ => None,
        }
    }

    pub fn rpc_name(self) -> &'static str {
        match self {
            Self::EthRequestAccounts => "eth_requestAccounts",
            Self::EthAccounts => "eth_accounts",
            Self::EthChainId => "eth_chainId",
            Self::WalletSwitchEthereumChain => "wallet_switchEthereumChain",
            Self::WalletGetCapabilities => "wallet_getCapabilities",
            Self::WalletGetCallsStatus => "wallet_getCallsStatus",
        }
    }

    /// Methods answered only after the user acts in the wallet popup.
    pub fn requires_approval(self) -> bool {
        matches!(
            self,
            Self::EthRequestAccounts | Self::WalletSwitchEthereumChain
        )
    }
}

pub fn format_chain_id(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

/// Parses a `0x`-prefixed hex chain id. Prefix and digits are case-insensitive.
pub fn parse_hex_chain_id(raw: &str) -> Option<u64> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Snapshot of the wallet state a handler runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletContext {
    pub chain_id: u64,
    pub selected_account: Option<Address>,
    pub authorized_accounts: Vec<Address>,
    pub supported_chains: Vec<u64>,
    pub entry_point: Address,
}

impl WalletContext {
    pub fn supports_chain(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenFrame {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupGeometry {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl PopupGeometry {
    /// `window.open` feature string.
    pub fn features(&self) -> String {
        format!(
            "width={},height={},left={},top={}",
            self.width, self.height, self.left, self.top
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub url: String,
    pub name: String,
    pub geometry: PopupGeometry,
}

/// Host-side reference to an opened window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: String,
    pub chain_id: u64,
    pub user_op_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_hash: B256,
    pub block_number: U64,
    pub gas_used: U256,
    #[serde(default)]
    pub logs: Vec<Log>,
}

/// `eth_getUserOperationReceipt` result as returned by ERC-4337 bundlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    pub entry_point: Address,
    pub sender: Address,
    pub nonce: U256,
    pub success: bool,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
    #[serde(default)]
    pub paymaster: Option<Address>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
    pub receipt: TransactionReceipt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Pending,
    Confirmed,
    ChainRulesFailure,
}

impl BatchStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::Pending => 100,
            Self::Confirmed => 200,
            Self::ChainRulesFailure => 500,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(Self::Pending),
            200 => Some(Self::Confirmed),
            500 => Some(Self::ChainRulesFailure),
            _ => None,
        }
    }
}

impl Serialize for BatchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

impl<'de> Deserialize<'de> for BatchStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u16::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown batch status {code}")))
    }
}

/// EIP-5792 call receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReceipt {
    pub logs: Vec<Log>,
    pub status: String,
    pub block_hash: B256,
    pub block_number: U64,
    pub gas_used: U256,
    pub transaction_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsStatus {
    pub version: String,
    pub id: String,
    pub chain_id: String,
    pub status: BatchStatus,
    pub atomic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipts: Option<Vec<CallReceipt>>,
}

/// Chain id (hex) to capability name to capability value.
pub type Capabilities = BTreeMap<String, BTreeMap<String, Value>>;
