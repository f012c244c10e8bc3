#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod bundler;
pub mod config;
pub mod popup;
pub mod wallet_store;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserPopupAdapter;
pub use bundler::BundlerAdapter;
pub use config::{BridgeAdapterConfig, RuntimeProfile};
pub use popup::{HeadlessPopupAdapter, HeadlessWindow};
pub use wallet_store::WalletStoreAdapter;
