// # Notifier Trait
//
// The single side-effect boundary of the coordination engine: whenever an
// elected role or interface state changes, the engine hands the change to a
// `Notifier` as a structured notification with a fixed positional argument
// schema.
//
// ## Implementations
//
// - Script execution: `mcoord-notify-exec` crate
// - Tests record notifications in memory
//
// Invocation is fire-and-forget from the engine's perspective: a notifier
// failure is logged and never fails the evaluation round that produced it.

use async_trait::async_trait;
use std::net::Ipv6Addr;

/// A role or interface state change reported to the external handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An interface transitioned between internal and external
    IfaceState {
        /// Interface name
        ifname: String,
        /// `true` for internal, `false` for external
        internal: bool,
    },
    /// A border proxy advertisement appeared or disappeared, on any node
    BorderProxy {
        /// `true` if the advertisement appeared, `false` if it was removed
        added: bool,
        /// `true` if the advertising node is the local node
        local: bool,
        /// The advertised address
        address: Ipv6Addr,
    },
    /// The elected rendezvous point changed
    RendezvousPoint {
        /// `true` if the elected node is the local node
        local: bool,
        /// The newly elected RP address
        address: Ipv6Addr,
        /// The previously reported RP address (unspecified on first report)
        previous: Ipv6Addr,
    },
}

impl Notification {
    /// The fixed positional argument list passed to the external handler.
    ///
    /// One of:
    /// - `["ifstate", <ifname>, "int"|"ext"]`
    /// - `["bp", "add"|"remove", "local"|"remote", <ipv6>]`
    /// - `["rpa", "local"|"remote", <new-ipv6>, <previous-ipv6>]`
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Notification::IfaceState { ifname, internal } => vec![
                "ifstate".to_string(),
                ifname.clone(),
                (if *internal { "int" } else { "ext" }).to_string(),
            ],
            Notification::BorderProxy {
                added,
                local,
                address,
            } => vec![
                "bp".to_string(),
                (if *added { "add" } else { "remove" }).to_string(),
                (if *local { "local" } else { "remote" }).to_string(),
                address.to_string(),
            ],
            Notification::RendezvousPoint {
                local,
                address,
                previous,
            } => vec![
                "rpa".to_string(),
                (if *local { "local" } else { "remote" }).to_string(),
                address.to_string(),
                previous.to_string(),
            ],
        }
    }
}

/// Trait for notification handler implementations
///
/// Implementations must be thread-safe. The engine awaits the invocation
/// but ignores its outcome beyond logging; exit status of an external
/// handler is not inspected.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to the external handler
    async fn notify(&self, notification: &Notification) -> Result<(), crate::Error>;
}
