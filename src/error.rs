//! Error types for graph storage operations
//!
//! Every error is a programmer-error condition raised at the point of
//! detection. The engine never retries or silently swallows a failed
//! operation; callers treat these as fatal to the single call.

use crate::graph::types::{EdgeId, EdgeTypeId, NodeId, ViewId};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Edge type {0} not found")]
    EdgeTypeNotFound(EdgeTypeId),

    #[error("View {0} not found")]
    ViewNotFound(ViewId),

    #[error("Element already belongs to a store")]
    AlreadyInStore,

    #[error("Stale store id: slot is not occupied")]
    StaleSlot,

    #[error("Node {0} already exists")]
    DuplicateNodeId(NodeId),

    #[error("Edge {0} already exists")]
    DuplicateEdgeId(EdgeId),

    #[error("Edge {0} already exists with different endpoints or type")]
    EdgeEndpointsMismatch(EdgeId),

    #[error("An edge of the same type between {source_node} and {target} already exists")]
    DuplicateEdge { source_node: NodeId, target: NodeId },

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Node {0} is not a member of this view")]
    NotInView(NodeId),

    #[error("This view does not filter nodes")]
    NodeViewDisabled,

    #[error("This view does not filter edges")]
    EdgeViewDisabled,

    #[error("Views filter different element kinds and cannot be combined")]
    ViewKindMismatch,

    #[error("Edge type {0} still has live edges")]
    EdgeTypeInUse(EdgeTypeId),

    #[error("Maximum number of edge types exceeded")]
    EdgeTypesExhausted,

    #[error("Pool capacity exceeded")]
    PoolExhausted,

    #[error("Cannot acquire the write lock while holding a read lock on the same thread")]
    WriteWhileReading,

    #[error("Lock already held by this thread; reuse the existing token")]
    LockReentry,

    #[error("Graph lock was poisoned by a panicked thread")]
    LockPoisoned,

    #[error("Directed edges are not accepted by this store")]
    DirectedEdgeRejected,

    #[error("Undirected edges are not accepted by this store")]
    UndirectedEdgeRejected,
}

pub type GraphResult<T> = Result<T, GraphError>;
