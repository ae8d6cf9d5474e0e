//! Node element for the storage engine
//!
//! A node is created detached (`store_id` is `None`) and acquires a dense
//! store id when inserted into a [`NodeStore`](super::node_store::NodeStore).
//! Adjacency state lives store-side, keyed by the node's slot.

use super::block::PoolElement;
use super::types::{NodeId, NodeSlot};

/// A node in the property graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    pub(crate) slot: Option<NodeSlot>,
}

impl Node {
    /// Create a detached node with the given external id
    pub fn new(id: impl Into<NodeId>) -> Self {
        Node {
            id: id.into(),
            slot: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Dense store id, `None` while the node is not a member of a store
    pub fn store_id(&self) -> Option<NodeSlot> {
        self.slot
    }
}

impl PoolElement for Node {
    fn key(&self) -> u64 {
        self.id.as_u64()
    }

    fn slot(&self) -> Option<u32> {
        self.slot.map(|slot| slot.as_u32())
    }

    fn set_slot(&mut self, slot: Option<u32>) {
        self.slot = slot.map(NodeSlot::new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_detached() {
        let node = Node::new(7);
        assert_eq!(node.id(), NodeId::new(7));
        assert_eq!(node.store_id(), None);
    }
}
