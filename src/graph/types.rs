//! Core type definitions for the storage engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// External identifier for a node, supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// External identifier for an edge, supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        EdgeId(id)
    }
}

/// Dense store id of a node slot
///
/// Slots are recycled: a removed node's slot may be reassigned to a node
/// added later. "No slot" is represented as `Option<NodeSlot>`, never as a
/// sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeSlot(pub u32);

impl NodeSlot {
    pub fn new(slot: u32) -> Self {
        NodeSlot(slot)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeSlot({})", self.0)
    }
}

/// Dense store id of an edge slot, recycled like [`NodeSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeSlot(pub u32);

impl EdgeSlot {
    pub fn new(slot: u32) -> Self {
        EdgeSlot(slot)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeSlot({})", self.0)
    }
}

/// Registry id of an edge type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeTypeId(pub u16);

impl EdgeTypeId {
    pub fn new(id: u16) -> Self {
        EdgeTypeId(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeTypeId({})", self.0)
    }
}

/// Registry id of a non-main view, recycled on view destruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ViewId(pub u32);

impl ViewId {
    pub fn new(id: u32) -> Self {
        ViewId(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

/// Direction of adjacency traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Both,
}

/// Node and edge structural version counters
///
/// Counters start at 1 and wrap around 0: the value 0 is reserved as the
/// "never observed" sentinel for collaborators that poll for change.
/// A counter is bumped exactly once per logical operation that changed
/// the structure, never once per element of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphVersion {
    node: u32,
    edge: u32,
}

impl GraphVersion {
    /// Sentinel meaning "no version observed yet"
    pub const UNOBSERVED: u32 = 0;

    pub fn new() -> Self {
        GraphVersion { node: 1, edge: 1 }
    }

    pub fn node_version(&self) -> u32 {
        self.node
    }

    pub fn edge_version(&self) -> u32 {
        self.edge
    }

    pub(crate) fn bump_node(&mut self) {
        self.node = next_version(self.node);
    }

    pub(crate) fn bump_edge(&mut self) {
        self.edge = next_version(self.edge);
    }
}

impl Default for GraphVersion {
    fn default() -> Self {
        Self::new()
    }
}

fn next_version(v: u32) -> u32 {
    match v.wrapping_add(1) {
        GraphVersion::UNOBSERVED => 1,
        n => n,
    }
}
