//! Core traits for the multicast coordination system
//!
//! This module defines the abstract interfaces to the four external
//! collaborators:
//!
//! - [`SharedStateStore`]: the replicated, eventually-consistent node-state
//!   store the engine reads and writes
//! - [`IfaceMonitor`]: interface internal/external state and address changes
//! - [`AddressProvider`]: a usable local IPv6 address, when one exists
//! - [`Notifier`]: the side-effect boundary toward the external handler

pub mod address_provider;
pub mod iface_monitor;
pub mod notifier;
pub mod state_store;

pub use address_provider::{AddressProvider, StaticAddressProvider};
pub use iface_monitor::{IdleIfaceMonitor, IfaceEvent, IfaceMonitor, Prefix};
pub use notifier::{Notification, Notifier};
pub use state_store::{NodeId, PublishedRecord, RecordEvent, RecordType, SharedStateStore};
