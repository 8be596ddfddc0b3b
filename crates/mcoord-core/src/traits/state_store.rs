// # Shared State Store Trait
//
// Defines the interface to the replicated, eventually-consistent node-state
// store the coordination engine reads and writes.
//
// ## Model
//
// Every member of the distributed set ("node") publishes typed records that
// the store floods to every other member. The store exposes:
//
// - enumeration of all currently known nodes,
// - enumeration of a given node's published records filtered by type,
// - the local node's handle and a canonical total order between nodes,
// - publish/remove of records owned by the *local* node only,
// - a watch feed of record change events (any node, local or remote).
//
// ## Ownership invariant
//
// Write access is restricted to records owned by the local identity. The
// trait has no primitive for mutating a remote node's records; remote state
// is only ever observed. Implementations enforce this by construction.
//
// ## Consistency
//
// Replication is asynchronous. Callers must tolerate stale and duplicate
// observations; the engine built on top is designed to converge under that
// model rather than assume a consistent snapshot.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::pin::Pin;
use tokio_stream::Stream;

/// Stable identity of a member of the distributed node set.
///
/// Opaque bytes. The canonical ordering between nodes is *not* derivable
/// from the identity itself; it is provided by the store via
/// [`SharedStateStore::node_cmp`], so `Ord` is deliberately not derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Vec<u8>);

impl NodeId {
    /// Create a node identity from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw identity bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The record types the coordination engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Marker: the owning node has a locally-attached, externally-connected
    /// multicast source. Payload is irrelevant; presence/absence only.
    ExternalConnection,
    /// Border proxy candidacy; payload is a 16-byte IPv6 address.
    BorderProxy,
    /// Rendezvous point candidacy; payload is a 16-byte IPv6 address.
    RpaCandidate,
}

/// A typed record published by a node and replicated by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    /// The record type
    pub record_type: RecordType,
    /// Opaque payload bytes
    pub payload: Vec<u8>,
}

impl PublishedRecord {
    /// Create a record
    pub fn new(record_type: RecordType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            record_type,
            payload: payload.into(),
        }
    }
}

/// A record change observed through the store's watch feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEvent {
    /// The node whose published record set changed
    pub node: NodeId,
    /// The record that was added or removed
    pub record: PublishedRecord,
    /// `true` if the record appeared, `false` if it was removed
    pub added: bool,
}

/// Trait for replicated state store implementations
///
/// Implementations must be thread-safe and usable across async tasks. All
/// read methods observe the store's current local view, which may lag the
/// cluster; write methods affect only the local node's own records.
#[async_trait]
pub trait SharedStateStore: Send + Sync {
    /// Enumerate all currently known nodes, the local node included
    async fn nodes(&self) -> Result<Vec<NodeId>, crate::Error>;

    /// The local ("own") node handle
    fn local_node(&self) -> NodeId;

    /// Canonical total order between two nodes.
    ///
    /// This is the tie-break order used for leaderless election. It is
    /// injected by the store rather than derived from identity bytes so the
    /// engine stays agnostic of the ordering scheme.
    fn node_cmp(&self, a: &NodeId, b: &NodeId) -> Ordering;

    /// Enumerate a node's published records of the given type
    async fn records_of(
        &self,
        node: &NodeId,
        record_type: RecordType,
    ) -> Result<Vec<PublishedRecord>, crate::Error>;

    /// Publish a record owned by the local node.
    ///
    /// Publishing a record identical to one already published is a no-op
    /// and must not produce a watch event.
    async fn publish(&self, record_type: RecordType, payload: Vec<u8>) -> Result<(), crate::Error>;

    /// Remove all locally-owned records of the given type.
    ///
    /// Removing when nothing is published is a no-op.
    async fn remove_local(&self, record_type: RecordType) -> Result<(), crate::Error>;

    /// Watch for record changes on any node, local or remote.
    ///
    /// Subscribing is calling this method; unsubscribing is dropping the
    /// stream. Events are delivered in the order the store observes them.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = RecordEvent> + Send + 'static>>;
}
