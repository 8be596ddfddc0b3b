//! Multicast role coordination engine
//!
//! The CoordEngine is responsible for:
//! - Electing a single rendezvous point (RP) among all nodes sharing the
//!   replicated state store
//! - Advertising the local node as a border proxy (BP) when it has an
//!   externally-connected multicast source
//! - Reporting role and interface state changes to the Notifier
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  record events   ┌──────────────┐
//! │ SharedStateStore │─────────────────▶│              │
//! └──────────────────┘                  │              │
//! ┌──────────────────┐  iface events    │  CoordEngine │──▶ Notifier
//! │   IfaceMonitor   │─────────────────▶│              │
//! └──────────────────┘                  │              │──▶ Events
//! ┌──────────────────┐  local address   │              │    (monitoring)
//! │ AddressProvider  │─────────────────▶│              │
//! └──────────────────┘                  └──────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Record churn and interface churn arm two independent debounce timers
//! 2. Timer expiry triggers an RP election round or a BP advertisement round
//! 3. A round reads the store, reconciles the local node's own records, and
//!    notifies when the observed role actually changed
//!
//! Everything runs on one logical thread of control (one `select!` loop), so
//! no evaluation ever observes another evaluation mid-flight. The store's
//! replication is eventually consistent; rounds are written to be idempotent
//! and self-correcting rather than to assume a consistent snapshot.

pub mod debounce;

use crate::config::CoordConfig;
use crate::error::Result;
use crate::traits::{
    AddressProvider, IfaceEvent, IfaceMonitor, Notification, Notifier, RecordEvent, RecordType,
    SharedStateStore,
};
use debounce::Debounce;
use std::cmp::Ordering;
use std::net::Ipv6Addr;
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Events emitted by the CoordEngine for external monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started,

    /// Engine stopped
    Stopped {
        reason: String,
    },

    /// The elected rendezvous point changed
    RpChanged {
        address: Ipv6Addr,
        local: bool,
        previous: Ipv6Addr,
    },

    /// The local node published a border proxy advertisement
    BpAdvertised {
        address: Ipv6Addr,
    },

    /// The local node withdrew its border proxy advertisement
    BpWithdrawn,
}

/// Observer over the engine's pending-work state.
///
/// The engine is busy while either debounce timer has a round scheduled.
/// The handle stays valid across the engine being moved into a task; once
/// the engine finishes it reports the final state (false after a clean
/// shutdown, which cancels both timers).
#[derive(Debug, Clone)]
pub struct BusyHandle {
    rx: watch::Receiver<bool>,
}

impl BusyHandle {
    /// Whether a debounced evaluation round is currently scheduled
    pub fn busy(&self) -> bool {
        *self.rx.borrow()
    }
}

/// The last RP reported to the notifier.
///
/// Notification fires only when the newly computed address differs from
/// this cache; the zero address means "no RP known yet".
#[derive(Debug, Clone, Copy)]
struct CurrentRp {
    address: Ipv6Addr,
    local: bool,
}

/// Multicast role coordination engine
///
/// ## Lifecycle
///
/// 1. Create with [`CoordEngine::new()`]
/// 2. Start with [`CoordEngine::run()`]
/// 3. Engine runs until shutdown, then withdraws this node's own records
///    so peers converge without waiting for implicit expiry
///
/// ## Threading
///
/// All callbacks (record changes, interface changes, timer expiries) are
/// dispatched from a single `select!` loop; no internal locking is needed.
pub struct CoordEngine {
    /// Replicated node-state store
    store: Box<dyn SharedStateStore>,

    /// Interface state and address change monitor
    iface: Box<dyn IfaceMonitor>,

    /// Local address provider
    addresses: Box<dyn AddressProvider>,

    /// Side-effect boundary toward the external handler
    notifier: Box<dyn Notifier>,

    /// RP-election debounce timer
    rp_timer: Debounce,

    /// BP-update debounce timer
    bp_timer: Debounce,

    /// Last RP reported to the notifier
    current_rp: CurrentRp,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,

    /// Publishes the pending-timer state to [`BusyHandle`]s
    busy_tx: watch::Sender<bool>,
}

impl CoordEngine {
    /// Create a new coordination engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events for monitoring.
    pub fn new(
        store: Box<dyn SharedStateStore>,
        iface: Box<dyn IfaceMonitor>,
        addresses: Box<dyn AddressProvider>,
        notifier: Box<dyn Notifier>,
        config: CoordConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            store,
            iface,
            addresses,
            notifier,
            rp_timer: Debounce::new(config.engine.rp_election_delay()),
            bp_timer: Debounce::new(config.engine.bp_update_delay()),
            current_rp: CurrentRp {
                address: Ipv6Addr::UNSPECIFIED,
                local: false,
            },
            event_tx: tx,
            busy_tx: watch::channel(false).0,
        };

        Ok((engine, rx))
    }

    /// Whether either debounce timer is currently pending
    pub fn busy(&self) -> bool {
        self.rp_timer.pending() || self.bp_timer.pending()
    }

    /// A cloneable observer over [`busy`](Self::busy), usable after the
    /// engine has been moved into [`run()`](Self::run)
    pub fn busy_handle(&self) -> BusyHandle {
        BusyHandle {
            rx: self.busy_tx.subscribe(),
        }
    }

    /// Arm a timer and republish the busy state
    fn arm_rp_timer(&mut self) {
        self.rp_timer.arm();
        self.update_busy();
    }

    fn arm_bp_timer(&mut self) {
        self.bp_timer.arm();
        self.update_busy();
    }

    /// Cancel a timer and republish the busy state
    fn clear_rp_timer(&mut self) {
        self.rp_timer.cancel();
        self.update_busy();
    }

    fn clear_bp_timer(&mut self) {
        self.bp_timer.cancel();
        self.update_busy();
    }

    fn update_busy(&self) {
        self.busy_tx
            .send_replace(self.rp_timer.pending() || self.bp_timer.pending());
    }

    /// The last RP address reported to the notifier, with its locality,
    /// or `None` if no RP has been reported yet
    pub fn current_rp(&self) -> Option<(Ipv6Addr, bool)> {
        if self.current_rp.address == Ipv6Addr::UNSPECIFIED {
            None
        } else {
            Some((self.current_rp.address, self.current_rp.local))
        }
    }

    /// Run the engine until a shutdown signal (SIGINT) is received
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Test-only helper to run the engine with a controlled shutdown signal
    ///
    /// **TESTING ONLY**: contract tests require controlled shutdown.
    /// Production code should use `run()`, which shuts down on OS signals.
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &mut self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started);

        let mut records = self.store.watch();
        let mut ifaces = self.iface.watch();
        let mut iface_done = false;

        // Even if we're alone, we may want to be RP.
        self.arm_rp_timer();

        if let Some(mut rx) = shutdown_rx {
            loop {
                let rp_deadline = self.rp_timer.deadline();
                let bp_deadline = self.bp_timer.deadline();
                tokio::select! {
                    maybe = records.next() => match maybe {
                        Some(event) => self.handle_record_event(event).await,
                        None => break,
                    },
                    maybe = ifaces.next(), if !iface_done => match maybe {
                        Some(event) => self.handle_iface_event(event).await,
                        None => iface_done = true,
                    },
                    _ = debounce::sleep_until_opt(rp_deadline) => {
                        self.clear_rp_timer();
                        if let Err(e) = self.evaluate_rp().await {
                            warn!("RP election round failed: {}", e);
                        }
                    }
                    _ = debounce::sleep_until_opt(bp_deadline) => {
                        self.clear_bp_timer();
                        if let Err(e) = self.evaluate_bp().await {
                            warn!("BP update round failed: {}", e);
                        }
                    }
                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            loop {
                let rp_deadline = self.rp_timer.deadline();
                let bp_deadline = self.bp_timer.deadline();
                tokio::select! {
                    maybe = records.next() => match maybe {
                        Some(event) => self.handle_record_event(event).await,
                        None => break,
                    },
                    maybe = ifaces.next(), if !iface_done => match maybe {
                        Some(event) => self.handle_iface_event(event).await,
                        None => iface_done = true,
                    },
                    _ = debounce::sleep_until_opt(rp_deadline) => {
                        self.clear_rp_timer();
                        if let Err(e) = self.evaluate_rp().await {
                            warn!("RP election round failed: {}", e);
                        }
                    }
                    _ = debounce::sleep_until_opt(bp_deadline) => {
                        self.clear_bp_timer();
                        if let Err(e) = self.evaluate_bp().await {
                            warn!("BP update round failed: {}", e);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }

        self.shutdown().await
    }

    /// Withdraw this node's own records and cancel pending timers
    async fn shutdown(&mut self) -> Result<()> {
        self.clear_rp_timer();
        self.clear_bp_timer();
        self.store.remove_local(RecordType::RpaCandidate).await?;
        self.store.remove_local(RecordType::BorderProxy).await?;
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Own records withdrawn, engine stopped");
        Ok(())
    }

    /// Dispatch one record change from the store's watch feed
    async fn handle_record_event(&mut self, event: RecordEvent) {
        let is_local = event.node == self.store.local_node();
        match event.record.record_type {
            RecordType::ExternalConnection => {
                // Only local connectivity affects local BP candidacy
                if is_local {
                    self.arm_bp_timer();
                }
            }
            RecordType::BorderProxy => match ipv6_from_payload(&event.record.payload) {
                Some(address) => {
                    self.send_notification(&Notification::BorderProxy {
                        added: event.added,
                        local: is_local,
                        address,
                    })
                    .await;
                }
                None => {
                    debug!(
                        "ignoring border proxy record with payload length {}",
                        event.record.payload.len()
                    );
                }
            },
            RecordType::RpaCandidate => {
                // Candidate churn anywhere may change the winner; coalesce
                // bursts through the debounced election round
                self.arm_rp_timer();
            }
        }
    }

    /// Dispatch one interface change from the monitor
    async fn handle_iface_event(&mut self, event: IfaceEvent) {
        match event {
            IfaceEvent::StateChanged { ifname, internal } => {
                self.send_notification(&Notification::IfaceState { ifname, internal })
                    .await;
            }
            IfaceEvent::AddressesChanged { .. } => {
                // Address churn may invalidate both roles
                self.arm_rp_timer();
                self.arm_bp_timer();
            }
        }
    }

    /// Run one RP election round.
    ///
    /// Scans every node's RP candidate records, picks the record whose owner
    /// is greatest under the store's node order, reconciles the local
    /// candidacy against the winner, and notifies if the elected address
    /// changed. Exposed as the timer-expiry entry point for embedders and
    /// contract tests; production code reaches it through `run()`.
    pub async fn evaluate_rp(&mut self) -> Result<()> {
        let local = self.store.local_node();

        let mut winner: Option<(crate::traits::NodeId, Ipv6Addr)> = None;
        for node in self.store.nodes().await? {
            for record in self
                .store
                .records_of(&node, RecordType::RpaCandidate)
                .await?
            {
                let Some(address) = ipv6_from_payload(&record.payload) else {
                    debug!(
                        "ignoring RP candidate with payload length {}",
                        record.payload.len()
                    );
                    continue;
                };
                let better = match &winner {
                    Some((best, _)) => self.store.node_cmp(&node, best) == Ordering::Greater,
                    None => true,
                };
                if better {
                    winner = Some((node.clone(), address));
                }
            }
        }

        if let Some((winning_node, address)) = winner {
            match self.store.node_cmp(&winning_node, &local) {
                Ordering::Greater => {
                    // A stronger candidate exists; a node that is not the
                    // true winner must not keep competing
                    self.store.remove_local(RecordType::RpaCandidate).await?;
                    self.notify_rp(address, false).await;
                    return Ok(());
                }
                Ordering::Less => {
                    self.notify_rp(address, false).await;
                    return Ok(());
                }
                Ordering::Equal => {
                    // Our own record won. Refresh it if the local address
                    // moved since it was published; otherwise leave it be.
                    if let Some(current) = self.addresses.ipv6_address().await
                        && current != address
                    {
                        self.store.remove_local(RecordType::RpaCandidate).await?;
                        self.store
                            .publish(RecordType::RpaCandidate, current.octets().to_vec())
                            .await?;
                        self.notify_rp(current, true).await;
                        return Ok(());
                    }
                    self.notify_rp(address, true).await;
                    return Ok(());
                }
            }
        }

        // No valid candidate anywhere. We may be racing ahead of
        // propagation; publish our own candidacy and let the next round's
        // comparison resolve the true winner.
        self.store.remove_local(RecordType::RpaCandidate).await?;
        let Some(address) = self.addresses.ipv6_address().await else {
            debug!("RP election: no local IPv6 address available");
            return Ok(());
        };
        self.store
            .publish(RecordType::RpaCandidate, address.octets().to_vec())
            .await?;
        self.notify_rp(address, true).await;
        Ok(())
    }

    /// Run one BP advertisement round.
    ///
    /// The local node advertises itself as border proxy iff it currently
    /// has an external-connection marker and a usable address. Notification
    /// of presence/absence is driven by the record watch feed, which fires
    /// for any node's advertisement, this one included. Exposed as the
    /// timer-expiry entry point for embedders and contract tests.
    pub async fn evaluate_bp(&mut self) -> Result<()> {
        let local = self.store.local_node();
        let current = self
            .store
            .records_of(&local, RecordType::BorderProxy)
            .await?;

        let has_marker = !self
            .store
            .records_of(&local, RecordType::ExternalConnection)
            .await?
            .is_empty();
        if !has_marker {
            if !current.is_empty() {
                self.store.remove_local(RecordType::BorderProxy).await?;
                self.emit_event(EngineEvent::BpWithdrawn);
            }
            return Ok(());
        }

        let Some(address) = self.addresses.ipv6_address().await else {
            debug!("BP update: no local IPv6 address available");
            if !current.is_empty() {
                self.store.remove_local(RecordType::BorderProxy).await?;
                self.emit_event(EngineEvent::BpWithdrawn);
            }
            return Ok(());
        };

        let payload = address.octets().to_vec();
        if current.len() == 1 && current[0].payload == payload {
            // Already advertising this address; rewriting would only flap
            // remove/add notifications on every round
            return Ok(());
        }

        self.store.remove_local(RecordType::BorderProxy).await?;
        self.store
            .publish(RecordType::BorderProxy, payload)
            .await?;
        self.emit_event(EngineEvent::BpAdvertised { address });
        Ok(())
    }

    /// Report a newly elected RP, gated by the current-RP cache
    async fn notify_rp(&mut self, address: Ipv6Addr, local: bool) {
        if address == self.current_rp.address {
            return;
        }
        let previous = self.current_rp.address;
        self.current_rp = CurrentRp { address, local };
        self.send_notification(&Notification::RendezvousPoint {
            local,
            address,
            previous,
        })
        .await;
        self.emit_event(EngineEvent::RpChanged {
            address,
            local,
            previous,
        });
    }

    /// Invoke the notifier, fire-and-forget
    async fn send_notification(&self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!("notification handler failed: {}", e);
        }
    }

    /// Emit an engine event, dropping it if the channel is full
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping engine event");
        }
    }
}

/// Parse a 16-byte record payload into an IPv6 address.
///
/// Any other length is malformed and yields `None`.
fn ipv6_from_payload(payload: &[u8]) -> Option<Ipv6Addr> {
    let octets: [u8; 16] = payload.try_into().ok()?;
    Some(Ipv6Addr::from(octets))
}
