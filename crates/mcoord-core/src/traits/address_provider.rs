// # Address Provider Trait
//
// Supplies a usable local IPv6 address for the records this node publishes
// (RP candidacy, BP advertisement). Address availability is allowed to come
// and go; the engine retries on the next churn-driven evaluation round
// rather than polling.

use async_trait::async_trait;
use std::net::Ipv6Addr;

/// Trait for local address provider implementations
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// A usable local IPv6 address, or `None` if none is currently available
    async fn ipv6_address(&self) -> Option<Ipv6Addr>;
}

/// Address provider backed by a fixed address
///
/// Useful for deployments with a stable, externally-configured address and
/// for tests.
#[derive(Debug, Clone)]
pub struct StaticAddressProvider {
    address: Option<Ipv6Addr>,
}

impl StaticAddressProvider {
    /// Provider that always returns the given address
    pub fn new(address: Ipv6Addr) -> Self {
        Self {
            address: Some(address),
        }
    }

    /// Provider that never has an address available
    pub fn unavailable() -> Self {
        Self { address: None }
    }
}

#[async_trait]
impl AddressProvider for StaticAddressProvider {
    async fn ipv6_address(&self) -> Option<Ipv6Addr> {
        self.address
    }
}
