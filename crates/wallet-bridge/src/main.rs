//! wallet-bridge: drives the embedded wallet provider bridge over stdin/stdout

use std::io;

use eyre::WrapErr;
use wallet_bridge_adapters::BridgeAdapterConfig;

mod bridge;
mod host;

fn main() -> eyre::Result<()> {
    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = BridgeAdapterConfig::from_env();
    tracing::info!(
        profile = ?config.runtime_profile,
        chain_id = config.initial_chain_id,
        auto_approve = config.auto_approve,
        "Starting wallet-bridge"
    );

    let bridge = bridge::WalletBridge::from_config(&config).wrap_err("bridge setup failed")?;
    let mut host = host::Host::new(bridge, config.auto_approve);

    let stdin = io::stdin();
    let stdout = io::stdout();
    host.run(stdin.lock(), stdout.lock())
}
