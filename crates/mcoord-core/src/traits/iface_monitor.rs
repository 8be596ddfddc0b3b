// # Interface Monitor Trait
//
// Defines the interface to the collaborator that observes local network
// interfaces: which are internal vs. external, and when their address sets
// change.
//
// ## Implementations
//
// - Platform monitors (netlink on Linux) live in their own crates.
// - Tests drive the engine with a channel-backed monitor.
//
// Interface monitors are observers only: they report, the engine decides.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::pin::Pin;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// An address prefix reported alongside interface address changes.
///
/// Carried through for completeness of the monitor contract; the
/// coordination engine reacts to the fact of the change, not its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// An IPv4 prefix
    V4(Ipv4Addr, u8),
    /// An IPv6 prefix
    V6(Ipv6Addr, u8),
}

/// An interface change observed by the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfaceEvent {
    /// The interface transitioned between internal and external
    StateChanged {
        /// Interface name
        ifname: String,
        /// `true` if the interface is now internal, `false` if external
        internal: bool,
    },
    /// The interface's address set changed (any address family)
    AddressesChanged {
        /// Interface name
        ifname: String,
        /// Current IPv6 prefix, if any
        prefix6: Option<Prefix>,
        /// Current IPv4 prefix, if any
        prefix4: Option<Prefix>,
    },
}

/// Trait for interface monitor implementations
pub trait IfaceMonitor: Send + Sync {
    /// Watch for interface changes.
    ///
    /// Registering a listener is calling this method; unregistering is
    /// dropping the stream. Events are delivered in observation order.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = IfaceEvent> + Send + 'static>>;
}

/// Interface monitor whose stream never yields
///
/// For deployments without a platform monitor wired in, and for tests
/// without interface churn. The engine then relies on record churn alone
/// to drive re-evaluation and emits no ifstate notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleIfaceMonitor;

impl IfaceMonitor for IdleIfaceMonitor {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = IfaceEvent> + Send + 'static>> {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}
