// # Memory State Store
//
// In-memory implementation of SharedStateStore.
//
// ## Purpose
//
// Holds this node's local view of the replicated record set: the local
// node's own records plus the remote records a flooding transport has
// synchronized in. Used directly in tests and embedded single-process
// deployments; a transport adapter drives the `remote_*` mutators as peer
// node state arrives.
//
// ## Semantics
//
// - Write access through the trait is local-only, per the store contract.
// - Publishing a payload identical to one already published is a no-op and
//   produces no watch event (mirrors the flooding protocol's dedupe of
//   republished identical records).
// - Node ordering is byte-lexicographic over the identity, which is total
//   because identities are unique.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use async_trait::async_trait;

use crate::Error;
use crate::traits::state_store::{
    NodeId, PublishedRecord, RecordEvent, RecordType, SharedStateStore,
};

/// In-memory state store implementation
///
/// Cloning yields a handle to the same store, so a test or a transport
/// adapter can mutate the view the engine observes.
#[derive(Clone)]
pub struct MemoryStateStore {
    local: NodeId,
    records: Arc<RwLock<HashMap<NodeId, Vec<PublishedRecord>>>>,
    watchers: Arc<Mutex<Vec<mpsc::UnboundedSender<RecordEvent>>>>,
}

impl MemoryStateStore {
    /// Create an empty store whose local identity is `local`
    pub fn new(local: NodeId) -> Self {
        Self {
            local,
            records: Arc::new(RwLock::new(HashMap::new())),
            watchers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Apply a record published by a remote node, as synchronized in by the
    /// flooding transport
    pub async fn remote_publish(
        &self,
        node: NodeId,
        record_type: RecordType,
        payload: Vec<u8>,
    ) -> Result<(), Error> {
        if node == self.local {
            return Err(Error::state_store(
                "remote_publish may not target the local node",
            ));
        }
        self.add_record(node, record_type, payload).await
    }

    /// Remove a remote node's records of the given type, as synchronized in
    /// by the flooding transport
    pub async fn remote_remove(&self, node: &NodeId, record_type: RecordType) -> Result<(), Error> {
        if *node == self.local {
            return Err(Error::state_store(
                "remote_remove may not target the local node",
            ));
        }
        self.remove_records(node, record_type).await
    }

    /// Drop a remote node from the view entirely (peer departed)
    pub async fn remote_forget(&self, node: &NodeId) -> Result<(), Error> {
        let removed = {
            let mut guard = self.records.write().await;
            guard.remove(node)
        };
        for record in removed.into_iter().flatten() {
            self.emit(RecordEvent {
                node: node.clone(),
                record,
                added: false,
            });
        }
        Ok(())
    }

    async fn add_record(
        &self,
        node: NodeId,
        record_type: RecordType,
        payload: Vec<u8>,
    ) -> Result<(), Error> {
        let record = PublishedRecord::new(record_type, payload);
        {
            let mut guard = self.records.write().await;
            let records = guard.entry(node.clone()).or_default();
            if records.contains(&record) {
                // Identical republish, no net change
                return Ok(());
            }
            records.push(record.clone());
        }
        self.emit(RecordEvent {
            node,
            record,
            added: true,
        });
        Ok(())
    }

    async fn remove_records(&self, node: &NodeId, record_type: RecordType) -> Result<(), Error> {
        let removed: Vec<PublishedRecord> = {
            let mut guard = self.records.write().await;
            match guard.get_mut(node) {
                Some(records) => {
                    let (gone, kept) = std::mem::take(records)
                        .into_iter()
                        .partition(|r| r.record_type == record_type);
                    *records = kept;
                    gone
                }
                None => Vec::new(),
            }
        };
        for record in removed {
            self.emit(RecordEvent {
                node: node.clone(),
                record,
                added: false,
            });
        }
        Ok(())
    }

    fn emit(&self, event: RecordEvent) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl SharedStateStore for MemoryStateStore {
    async fn nodes(&self) -> Result<Vec<NodeId>, Error> {
        let guard = self.records.read().await;
        let mut nodes: Vec<NodeId> = guard.keys().cloned().collect();
        if !nodes.contains(&self.local) {
            nodes.push(self.local.clone());
        }
        Ok(nodes)
    }

    fn local_node(&self) -> NodeId {
        self.local.clone()
    }

    fn node_cmp(&self, a: &NodeId, b: &NodeId) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }

    async fn records_of(
        &self,
        node: &NodeId,
        record_type: RecordType,
    ) -> Result<Vec<PublishedRecord>, Error> {
        let guard = self.records.read().await;
        Ok(guard
            .get(node)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.record_type == record_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn publish(&self, record_type: RecordType, payload: Vec<u8>) -> Result<(), Error> {
        self.add_record(self.local.clone(), record_type, payload)
            .await
    }

    async fn remove_local(&self, record_type: RecordType) -> Result<(), Error> {
        let local = self.local.clone();
        self.remove_records(&local, record_type).await
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = RecordEvent> + Send + 'static>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().unwrap().push(tx);
        Box::pin(UnboundedReceiverStream::new(rx))
    }
}
