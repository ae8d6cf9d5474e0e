//! Node pool with external-id dictionary

use super::block::{ElementPool, PoolElement};
use super::node::Node;
use super::types::{NodeId, NodeSlot};
use crate::error::{GraphError, GraphResult};
use rayon::prelude::*;
use roaring::RoaringBitmap;

/// Block-allocated pool of nodes
#[derive(Debug)]
pub struct NodeStore {
    pool: ElementPool<Node>,
}

impl NodeStore {
    pub(crate) fn new(block_size: usize) -> Self {
        NodeStore {
            pool: ElementPool::new(block_size),
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.pool.contains_key(id.as_u64())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.pool.get(id.as_u64())
    }

    pub(crate) fn get_slot(&self, slot: NodeSlot) -> Option<&Node> {
        self.pool.get_slot(slot.as_u32())
    }

    pub(crate) fn slot_of(&self, id: NodeId) -> Option<NodeSlot> {
        self.pool.slot_of(id.as_u64()).map(NodeSlot::new)
    }

    pub(crate) fn id_of(&self, slot: NodeSlot) -> Option<NodeId> {
        self.get_slot(slot).map(|node| node.id())
    }

    /// Occupied slots, the universe for view materialization
    pub(crate) fn live(&self) -> &RoaringBitmap {
        self.pool.live()
    }

    pub(crate) fn add(&mut self, node: Node) -> GraphResult<NodeSlot> {
        if node.slot().is_some() {
            return Err(GraphError::AlreadyInStore);
        }
        if self.contains(node.id()) {
            return Err(GraphError::DuplicateNodeId(node.id()));
        }
        Ok(NodeSlot::new(self.pool.add(node)?))
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> GraphResult<Node> {
        self.pool
            .remove(id.as_u64())
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Iterate live nodes in block/slot order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.pool.iter()
    }

    pub(crate) fn par_iter(&self) -> impl ParallelIterator<Item = &Node> {
        self.pool.par_iter()
    }

    pub(crate) fn clear(&mut self) {
        self.pool.clear();
    }
}
