//! Configuration types for the multicast coordination system

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce for the RP-election timer, in milliseconds.
///
/// No churn in the candidate set for this long -> run an election round.
pub const DEFAULT_RP_ELECTION_DELAY_MS: u64 = 1000;

/// Default debounce for the BP-update timer, in milliseconds.
///
/// No churn in local external-connection state for this long -> re-evaluate
/// whether this node should advertise itself as border proxy.
pub const DEFAULT_BP_UPDATE_DELAY_MS: u64 = 1000;

/// Main coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordConfig {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl CoordConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.engine.rp_election_delay_ms == 0 {
            return Err(crate::Error::config("RP election delay must be > 0"));
        }
        if self.engine.bp_update_delay_ms == 0 {
            return Err(crate::Error::config("BP update delay must be > 0"));
        }
        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for CoordConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Debounce delay for the RP-election timer (milliseconds)
    pub rp_election_delay_ms: u64,

    /// Debounce delay for the BP-update timer (milliseconds)
    pub bp_update_delay_ms: u64,

    /// Capacity of the monitoring event channel
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// RP-election debounce as a `Duration`
    pub fn rp_election_delay(&self) -> Duration {
        Duration::from_millis(self.rp_election_delay_ms)
    }

    /// BP-update debounce as a `Duration`
    pub fn bp_update_delay(&self) -> Duration {
        Duration::from_millis(self.bp_update_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rp_election_delay_ms: DEFAULT_RP_ELECTION_DELAY_MS,
            bp_update_delay_ms: DEFAULT_BP_UPDATE_DELAY_MS,
            event_channel_capacity: 64,
        }
    }
}
