//! Edge element with intrusive adjacency pointers
//!
//! The identity tuple `(source, target, type, directed)` is fixed at
//! construction; only the weight is mutable. The four adjacency pointers
//! thread the edge onto the out-list of its source and the in-list of its
//! target; they are only valid while the edge is a live member of exactly
//! one out-list and one in-list, and `None` terminates list traversal.

use super::block::PoolElement;
use super::types::{EdgeId, EdgeSlot, EdgeTypeId, NodeId, NodeSlot};

/// Intrusive doubly-linked list pointers, typed slots in place of raw
/// pointers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EdgeLinks {
    pub next_out: Option<EdgeSlot>,
    pub prev_out: Option<EdgeSlot>,
    pub next_in: Option<EdgeSlot>,
    pub prev_in: Option<EdgeSlot>,
}

/// An edge in the property graph
#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,
    pub(crate) slot: Option<EdgeSlot>,
    source: NodeId,
    target: NodeId,
    pub(crate) source_slot: NodeSlot,
    pub(crate) target_slot: NodeSlot,
    type_id: EdgeTypeId,
    directed: bool,
    weight: f64,
    pub(crate) links: EdgeLinks,
    pub(crate) mutual: bool,
}

impl Edge {
    pub(crate) fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        source_slot: NodeSlot,
        target_slot: NodeSlot,
        type_id: EdgeTypeId,
        directed: bool,
    ) -> Self {
        Edge {
            id,
            slot: None,
            source,
            target,
            source_slot,
            target_slot,
            type_id,
            directed,
            weight: 1.0,
            links: EdgeLinks::default(),
            mutual: false,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Dense store id, `None` while the edge is not a member of a store
    pub fn store_id(&self) -> Option<EdgeSlot> {
        self.slot
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn type_id(&self) -> EdgeTypeId {
        self.type_id
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// True when the reverse edge (same type, endpoints swapped) is live
    pub fn is_mutual(&self) -> bool {
        self.mutual
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_slot == self.target_slot
    }

    /// Check if this edge connects two specific nodes (in either direction)
    pub fn connects(&self, node1: NodeId, node2: NodeId) -> bool {
        (self.source == node1 && self.target == node2)
            || (self.source == node2 && self.target == node1)
    }

    /// The endpoint opposite to `node`, or `None` if `node` is not an
    /// endpoint
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

impl PoolElement for Edge {
    fn key(&self) -> u64 {
        self.id.as_u64()
    }

    fn slot(&self) -> Option<u32> {
        self.slot.map(|slot| slot.as_u32())
    }

    fn set_slot(&mut self, slot: Option<u32>) {
        self.slot = slot.map(EdgeSlot::new);
    }
}
