// # mcoordd - Multicast Coordination Daemon
//
// Thin integration layer: reads configuration from environment variables,
// initializes tracing, wires the collaborators, and runs the coordination
// engine until a shutdown signal. All coordination logic lives in
// mcoord-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `MCOORD_SCRIPT`: path of the external notification handler (required)
// - `MCOORD_NODE_ID`: local node identity, hex string (default "01")
// - `MCOORD_LOCAL_ADDRESS`: local IPv6 address to advertise (optional;
//   without it the node observes elections but never asserts candidacy)
// - `MCOORD_RP_DELAY_MS`: RP-election debounce in milliseconds
// - `MCOORD_BP_DELAY_MS`: BP-update debounce in milliseconds
// - `MCOORD_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export MCOORD_SCRIPT=/usr/libexec/mcoord-handler
// export MCOORD_NODE_ID=0a01
// export MCOORD_LOCAL_ADDRESS=2001:db8::1
//
// mcoordd
// ```

use anyhow::Result;
use mcoord_core::{
    CoordConfig, CoordEngine, IdleIfaceMonitor, MemoryStateStore, NodeId, StaticAddressProvider,
};
use mcoord_notify_exec::ExecNotifier;
use std::env;
use std::net::Ipv6Addr;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum McoordExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<McoordExitCode> for ExitCode {
    fn from(code: McoordExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    script: String,
    node_id: Vec<u8>,
    local_address: Option<Ipv6Addr>,
    rp_delay_ms: Option<u64>,
    bp_delay_ms: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            script: env::var("MCOORD_SCRIPT")
                .map_err(|_| anyhow::anyhow!("MCOORD_SCRIPT is required"))?,
            node_id: parse_hex(&env::var("MCOORD_NODE_ID").unwrap_or_else(|_| "01".to_string()))?,
            local_address: env::var("MCOORD_LOCAL_ADDRESS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("MCOORD_LOCAL_ADDRESS is not an IPv6 address: {e}"))?,
            rp_delay_ms: env::var("MCOORD_RP_DELAY_MS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("MCOORD_RP_DELAY_MS is not a number: {e}"))?,
            bp_delay_ms: env::var("MCOORD_BP_DELAY_MS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("MCOORD_BP_DELAY_MS is not a number: {e}"))?,
            log_level: env::var("MCOORD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.script.is_empty() {
            anyhow::bail!("MCOORD_SCRIPT cannot be empty");
        }
        if self.node_id.is_empty() {
            anyhow::bail!("MCOORD_NODE_ID cannot be empty");
        }
        if self.rp_delay_ms == Some(0) {
            anyhow::bail!("MCOORD_RP_DELAY_MS must be > 0");
        }
        if self.bp_delay_ms == Some(0) {
            anyhow::bail!("MCOORD_BP_DELAY_MS must be > 0");
        }
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "MCOORD_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
        Ok(())
    }

    fn coord_config(&self) -> CoordConfig {
        let mut config = CoordConfig::default();
        if let Some(ms) = self.rp_delay_ms {
            config.engine.rp_election_delay_ms = ms;
        }
        if let Some(ms) = self.bp_delay_ms {
            config.engine.bp_update_delay_ms = ms;
        }
        config
    }
}

/// Parse a hex string into identity bytes
fn parse_hex(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() || s.len() % 2 != 0 {
        anyhow::bail!("MCOORD_NODE_ID must be a non-empty even-length hex string");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| anyhow::anyhow!("MCOORD_NODE_ID is not valid hex: {s}"))
        })
        .collect()
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return McoordExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return McoordExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return McoordExitCode::ConfigError.into();
    }

    info!("Starting mcoordd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return McoordExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            McoordExitCode::RuntimeError
        } else {
            McoordExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let store = MemoryStateStore::new(NodeId::new(config.node_id.clone()));
    let addresses = match config.local_address {
        Some(address) => StaticAddressProvider::new(address),
        None => StaticAddressProvider::unavailable(),
    };
    let notifier = ExecNotifier::new(&config.script);

    info!("Notification handler: {}", config.script);
    match config.local_address {
        Some(address) => info!("Local address: {}", address),
        None => info!("No local address configured; observing elections only"),
    }

    let (mut engine, mut events) = CoordEngine::new(
        Box::new(store),
        Box::new(IdleIfaceMonitor),
        Box::new(addresses),
        Box::new(notifier),
        config.coord_config(),
    )?;

    // Surface engine events in the log
    let observer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!("engine event: {:?}", event);
        }
    });

    info!("Starting coordination engine");
    engine.run().await?;
    observer.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("0a01").unwrap(), vec![0x0a, 0x01]);
        assert!(parse_hex("").is_err());
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
