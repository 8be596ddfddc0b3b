// # mcoord-core
//
// Core library for multicast role coordination over a replicated,
// eventually-consistent node-state store.
//
// ## Architecture Overview
//
// - **SharedStateStore**: trait over the replicated record store (enumerate
//   nodes and records, publish/remove own records, watch changes)
// - **IfaceMonitor**: trait over interface state/address change monitoring
// - **AddressProvider**: trait supplying a usable local IPv6 address
// - **Notifier**: trait over the external notification handler
// - **CoordEngine**: debounce-driven engine that elects the rendezvous
//   point, maintains the border proxy advertisement, and notifies on change
//
// ## Design Principles
//
// 1. **Separation of Concerns**: the flooding protocol, interface
//    monitoring, and handler invocation are collaborators behind traits
// 2. **Event-Driven**: record and interface churn arm debounce timers; no
//    polling
// 3. **Own-Records-Only**: the engine never mutates another node's records
// 4. **Self-Correcting**: every evaluation round is idempotent and converges
//    under stale or duplicate observations

pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{CoordConfig, EngineConfig};
pub use engine::{BusyHandle, CoordEngine, EngineEvent};
pub use error::{Error, Result};
pub use state::MemoryStateStore;
pub use traits::{
    AddressProvider, IdleIfaceMonitor, IfaceEvent, IfaceMonitor, NodeId, Notification, Notifier,
    PublishedRecord, RecordEvent, RecordType, SharedStateStore, StaticAddressProvider,
};
