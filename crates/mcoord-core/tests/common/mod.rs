//! Test doubles and common utilities for coordination contract tests

use async_trait::async_trait;
use mcoord_core::error::Result;
use mcoord_core::traits::{IfaceEvent, IfaceMonitor, Notification, Notifier};
use mcoord_core::{CoordConfig, MemoryStateStore, NodeId};
use std::net::Ipv6Addr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub use mcoord_core::traits::IdleIfaceMonitor;

/// A notifier that records every notification it receives
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    /// Notifications whose argv starts with the given role tag
    pub fn seen_role(&self, role: &str) -> Vec<Notification> {
        self.seen()
            .into_iter()
            .filter(|n| n.to_args()[0] == role)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.seen.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// A controlled interface monitor that emits events on demand
pub struct ControlledIfaceMonitor {
    engine_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<IfaceEvent>>>>,
}

impl ControlledIfaceMonitor {
    /// Create a monitor plus the sender a test uses to inject events
    pub fn new() -> (Self, mpsc::UnboundedSender<IfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = Self {
            engine_rx: Arc::new(Mutex::new(Some(rx))),
        };
        (monitor, tx)
    }
}

impl IfaceMonitor for ControlledIfaceMonitor {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = IfaceEvent> + Send + 'static>> {
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Configuration with short debounces so contract tests run quickly
pub fn test_config() -> CoordConfig {
    let mut config = CoordConfig::default();
    config.engine.rp_election_delay_ms = 50;
    config.engine.bp_update_delay_ms = 50;
    config
}

/// A documentation-prefix address distinguished by its last group
pub fn addr(last: u16) -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, last)
}

/// A store whose local node identity is the single byte `id`
pub fn store_with_local(id: u8) -> MemoryStateStore {
    MemoryStateStore::new(NodeId::new([id]))
}

/// Sleep long enough for a 50 ms debounce round to have fired
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
}
