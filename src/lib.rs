//! Trellis: embeddable in-memory property-graph storage
//!
//! Trellis holds nodes and edges in block-allocated pools with O(1)
//! external-id lookup, maintains directed and undirected adjacency through
//! intrusive linked lists, and lets callers materialize subgraph views
//! (bitset overlays with incrementally maintained statistics and set
//! algebra) without copying the underlying graph. It is the storage
//! substrate for attribute, indexing, and visualization layers built on
//! top of it; those collaborators attach through the
//! [`ViewIndexHooks`] surface and the version counters.
//!
//! # Architecture
//!
//! - [`graph::GraphStore`]: node/edge pools, adjacency, type registry,
//!   mutual-edge bookkeeping, cascading removal, view fan-out
//! - [`view::GraphView`]: bitset subgraph overlays with union,
//!   intersection, complement, retain, fill, and clear as bulk bitmap
//!   operations
//! - [`view::Subgraph`] / [`view::ViewMut`]: view-bound read and write
//!   adapters
//! - [`sync::GraphLock`] / [`sync::SharedGraph`]: reader/writer locking
//!   with fail-fast lock-upgrade detection for cross-thread sharing
//!
//! # Example
//!
//! ```rust
//! use trellis::{GraphStore, Node, NodeId, EdgeId, DEFAULT_EDGE_TYPE};
//!
//! # fn main() -> trellis::GraphResult<()> {
//! let mut store = GraphStore::new();
//! store.add_node(Node::new(1))?;
//! store.add_node(Node::new(2))?;
//! store.add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)?;
//! assert_eq!(store.degree(NodeId::new(1))?, 1);
//!
//! // Project a subgraph view over the same storage.
//! let view = store.create_view();
//! store.view_mut(view)?.add_node(NodeId::new(1))?;
//! store.view_mut(view)?.add_node(NodeId::new(2))?;
//! store.view_mut(view)?.add_edge(EdgeId::new(1))?;
//! assert_eq!(store.subgraph(view)?.edge_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod sync;
pub mod view;

pub use config::{Config, EdgeKinds};
pub use error::{GraphError, GraphResult};
pub use graph::{
    Direction, Edge, EdgeId, EdgeSlot, EdgeTypeId, EdgeTypeRegistry, GraphStore, GraphVersion,
    Node, NodeId, NodeSlot, ViewId, DEFAULT_EDGE_TYPE,
};
pub use hooks::ViewIndexHooks;
pub use sync::{GraphLock, ReadToken, SharedGraph, WriteToken};
pub use view::{GraphView, Interval, Subgraph, ViewMut};
