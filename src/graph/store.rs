//! The graph store facade
//!
//! `GraphStore` owns the node and edge pools, the view registry, and the
//! collaborator hooks, and coordinates the mutation paths that touch more
//! than one of them: cascading node removal, fan-out of structural changes
//! to live views, and version maintenance.
//!
//! All methods take `&self` for queries and `&mut self` for structural
//! mutation; the borrow checker enforces the reader/writer discipline for a
//! single-threaded owner. Wrap the store in
//! [`SharedGraph`](crate::sync::SharedGraph) to share it across threads.

use super::edge::Edge;
use super::edge_store::{AdjacencyIter, EdgeStore};
use super::edge_type::EdgeTypeRegistry;
use super::node::Node;
use super::node_store::NodeStore;
use super::types::{
    Direction, EdgeId, EdgeSlot, EdgeTypeId, GraphVersion, NodeId, NodeSlot, ViewId,
};
use crate::config::{Config, EdgeKinds};
use crate::error::{GraphError, GraphResult};
use crate::hooks::{Hooks, ViewIndexHooks};
use crate::view::{Subgraph, ViewMut, ViewRegistry};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;
use tracing::debug;

/// In-memory property-graph store
pub struct GraphStore {
    config: Config,
    nodes: NodeStore,
    edges: EdgeStore,
    views: ViewRegistry,
    hooks: Option<Box<dyn ViewIndexHooks + Send + Sync>>,
    version: GraphVersion,
    next_node_id: u64,
    next_edge_id: u64,
}

impl GraphStore {
    /// Create an empty store with the default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        GraphStore {
            nodes: NodeStore::new(config.block_size),
            edges: EdgeStore::new(config.block_size, config.allow_parallel_edges_same_type),
            views: ViewRegistry::new(),
            hooks: None,
            version: GraphVersion::new(),
            next_node_id: 1,
            next_edge_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the collaborator hook sink; replaces any previous one
    pub fn set_index_hooks(&mut self, hooks: Box<dyn ViewIndexHooks + Send + Sync>) {
        self.hooks = Some(hooks);
    }

    pub fn take_index_hooks(&mut self) -> Option<Box<dyn ViewIndexHooks + Send + Sync>> {
        self.hooks.take()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Insert a detached node, assigning a fresh or recycled slot
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeSlot> {
        let id = node.id();
        let slot = self.nodes.add(node)?;
        self.edges.ensure_node(slot);
        self.version.bump_node();
        debug!(node = %id, slot = %slot, "added node");
        Ok(slot)
    }

    /// Create a node with a store-allocated external id
    pub fn create_node(&mut self) -> GraphResult<NodeId> {
        let id = self.allocate_node_id();
        self.add_node(Node::new(id))?;
        Ok(id)
    }

    /// Remove a node and all its incident edges, from every view first
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let slot = self.nodes.slot_of(id).ok_or(GraphError::NodeNotFound(id))?;

        let incident: Vec<EdgeSlot> = self
            .edges
            .adjacency_iter(slot, Direction::Both, None)
            .filter_map(|edge| edge.store_id())
            .collect();
        for edge_slot in incident {
            self.remove_edge_slot(edge_slot)?;
        }

        let mut hooks = Hooks(self.hooks.as_deref_mut());
        self.views.fan_out_node_removed(slot, &self.nodes, &mut hooks);
        self.edges.node_removed(slot);
        let node = self.nodes.remove(id)?;
        self.version.bump_node();
        debug!(node = %id, "removed node");
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate live nodes in block/slot order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id())
    }

    /// Parallel iteration over node ids, split at pool block boundaries
    pub fn par_node_ids(&self) -> impl ParallelIterator<Item = NodeId> + '_ {
        self.nodes.par_iter().map(|node| node.id())
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Insert an edge between two existing nodes
    pub fn add_edge(
        &mut self,
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        type_id: EdgeTypeId,
        directed: bool,
    ) -> GraphResult<EdgeSlot> {
        match (self.config.edge_kinds, directed) {
            (EdgeKinds::Directed, false) => return Err(GraphError::UndirectedEdgeRejected),
            (EdgeKinds::Undirected, true) => return Err(GraphError::DirectedEdgeRejected),
            _ => {}
        }
        let source_slot = self
            .nodes
            .slot_of(source)
            .ok_or(GraphError::InvalidEdgeSource(source))?;
        let target_slot = self
            .nodes
            .slot_of(target)
            .ok_or(GraphError::InvalidEdgeTarget(target))?;

        let edge = Edge::new(id, source, target, source_slot, target_slot, type_id, directed);
        let slot = self.edges.add(edge)?;
        self.version.bump_edge();
        Ok(slot)
    }

    /// Insert an edge, registering its type label on the fly
    pub fn add_edge_labeled(
        &mut self,
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        label: &str,
        directed: bool,
    ) -> GraphResult<EdgeSlot> {
        let type_id = self.edges.types_mut().register(label)?;
        self.add_edge(id, source, target, type_id, directed)
    }

    /// Create an edge with a store-allocated external id
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        type_id: EdgeTypeId,
        directed: bool,
    ) -> GraphResult<EdgeId> {
        let id = self.allocate_edge_id();
        self.add_edge(id, source, target, type_id, directed)?;
        Ok(id)
    }

    /// Remove an edge, from every view first
    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let slot = self.edges.slot_of(id).ok_or(GraphError::EdgeNotFound(id))?;
        self.remove_edge_slot(slot)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(id)
    }

    pub fn set_edge_weight(&mut self, id: EdgeId, weight: f64) -> GraphResult<()> {
        self.edges
            .get_mut(id)
            .ok_or(GraphError::EdgeNotFound(id))?
            .set_weight(weight);
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Total edges minus mutual pairs
    pub fn undirected_edge_count(&self) -> usize {
        self.edges.undirected_len()
    }

    pub fn edge_type_count(&self, type_id: EdgeTypeId) -> usize {
        self.edges.type_count(type_id)
    }

    pub fn mutual_count(&self, type_id: EdgeTypeId) -> usize {
        self.edges.mutual_count(type_id)
    }

    pub fn mutual_pair_count(&self) -> usize {
        self.edges.mutual_pair_count()
    }

    /// Iterate live edges in block/slot order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().map(|edge| edge.id())
    }

    pub fn par_edge_ids(&self) -> impl ParallelIterator<Item = EdgeId> + '_ {
        self.edges.par_iter().map(|edge| edge.id())
    }

    // ------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------

    pub fn out_edges(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<AdjacencyIter<'_>> {
        self.incident(node, Direction::Out, type_filter)
    }

    pub fn in_edges(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<AdjacencyIter<'_>> {
        self.incident(node, Direction::In, type_filter)
    }

    /// All incident edges; self-loops are yielded once
    pub fn edges_of(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<AdjacencyIter<'_>> {
        self.incident(node, Direction::Both, type_filter)
    }

    /// Distinct neighbors of a node
    pub fn neighbors(&self, node: NodeId) -> GraphResult<impl Iterator<Item = NodeId> + '_> {
        let mut seen = FxHashSet::default();
        Ok(self.edges_of(node, None)?.filter_map(move |edge| {
            let opposite = edge.opposite(node)?;
            seen.insert(opposite.as_u64()).then_some(opposite)
        }))
    }

    /// Canonical lookup of the edge between two nodes; undirected edges
    /// match either endpoint order
    pub fn edge_between(
        &self,
        source: NodeId,
        target: NodeId,
        type_id: EdgeTypeId,
    ) -> Option<&Edge> {
        let source_slot = self.nodes.slot_of(source)?;
        let target_slot = self.nodes.slot_of(target)?;
        self.edges.edge_between(source_slot, target_slot, type_id)
    }

    /// Whether any edge connects the two nodes, in either direction
    pub fn is_adjacent(&self, node: NodeId, other: NodeId) -> GraphResult<bool> {
        Ok(self.edges_of(node, None)?.any(|edge| edge.connects(node, other)))
    }

    pub fn out_degree(&self, node: NodeId) -> GraphResult<u32> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.out_degree(slot))
    }

    pub fn in_degree(&self, node: NodeId) -> GraphResult<u32> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.in_degree(slot))
    }

    /// In-degree plus out-degree; self-loops count twice
    pub fn degree(&self, node: NodeId) -> GraphResult<u32> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.out_degree(slot) + self.edges.in_degree(slot))
    }

    pub fn mutual_degree(&self, node: NodeId) -> GraphResult<u32> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.mutual_degree(slot))
    }

    /// Degree with each mutual pair collapsed to one undirected relation
    pub fn undirected_degree(&self, node: NodeId) -> GraphResult<u32> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.out_degree(slot) + self.edges.in_degree(slot)
            - self.edges.mutual_degree(slot))
    }

    // ------------------------------------------------------------------
    // Edge types
    // ------------------------------------------------------------------

    pub fn edge_types(&self) -> &EdgeTypeRegistry {
        self.edges.types()
    }

    pub fn register_edge_type(&mut self, label: &str) -> GraphResult<EdgeTypeId> {
        self.edges.types_mut().register(label)
    }

    /// Remove an unused edge type, recycling its id
    pub fn unregister_edge_type(&mut self, type_id: EdgeTypeId) -> GraphResult<()> {
        let label = self
            .edges
            .types()
            .label_of(type_id)
            .ok_or(GraphError::EdgeTypeNotFound(type_id))?
            .to_string();
        if self.edges.type_count(type_id) > 0 {
            return Err(GraphError::EdgeTypeInUse(type_id));
        }
        self.edges.types_mut().unregister(&label);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Insert many detached nodes; stops at the first failure
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> GraphResult<()> {
        for node in nodes {
            self.add_node(node)?;
        }
        Ok(())
    }

    /// Remove many nodes, cascading each one's incident edges
    pub fn remove_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) -> GraphResult<()> {
        for id in ids {
            self.remove_node(id)?;
        }
        Ok(())
    }

    /// Remove everything: nodes, edges, and all view membership
    pub fn clear(&mut self) {
        let mut hooks = Hooks(self.hooks.as_deref_mut());
        for view in self.views.iter_mut() {
            view.clear(&self.nodes, &self.edges, &mut hooks);
        }
        self.edges.clear();
        self.nodes.clear();
        self.version.bump_node();
        self.version.bump_edge();
    }

    /// Remove all edges, keeping nodes and view node membership
    pub fn clear_edges(&mut self) {
        let mut hooks = Hooks(self.hooks.as_deref_mut());
        for view in self.views.iter_mut() {
            view.clear_edges(&self.edges, &mut hooks);
        }
        self.edges.clear();
        self.version.bump_edge();
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Create an empty view filtering both nodes and edges
    pub fn create_view(&mut self) -> ViewId {
        let id = self.views.create(true, true);
        debug!(view = %id, "created view");
        id
    }

    /// Create an empty node-filtering view whose induced edges follow node
    /// membership implicitly
    pub fn create_node_view(&mut self) -> ViewId {
        let id = self.views.create(true, false);
        debug!(view = %id, "created node view");
        id
    }

    /// Create an empty edge-filtering view over all nodes
    pub fn create_edge_view(&mut self) -> ViewId {
        let id = self.views.create(false, true);
        debug!(view = %id, "created edge view");
        id
    }

    /// Clone an existing view's membership and statistics under a new id
    pub fn copy_view(&mut self, id: ViewId) -> GraphResult<ViewId> {
        let copy = self.views.get(id)?.clone();
        let new_id = self.views.insert_copy(copy);
        let mut hooks = Hooks(self.hooks.as_deref_mut());
        hooks.index_view(new_id);
        debug!(source = %id, view = %new_id, "copied view");
        Ok(new_id)
    }

    /// Destroy a view, recycling its id; later use of the id fails fast
    pub fn destroy_view(&mut self, id: ViewId) -> GraphResult<()> {
        let view = self.views.destroy(id)?;
        let mut hooks = Hooks(self.hooks.as_deref_mut());
        if hooks.is_active() {
            for raw in view.edge_bits().iter() {
                if let Some(edge_id) = self.edges.id_of(EdgeSlot::new(raw)) {
                    hooks.clear_edge(edge_id, id);
                }
            }
            for raw in view.node_bits().iter() {
                if let Some(node_id) = self.nodes.id_of(NodeSlot::new(raw)) {
                    hooks.clear_node(node_id, id);
                }
            }
        }
        debug!(view = %id, "destroyed view");
        Ok(())
    }

    pub fn contains_view(&self, id: ViewId) -> bool {
        self.views.contains(id)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Read adapter for a view
    pub fn subgraph(&self, id: ViewId) -> GraphResult<Subgraph<'_>> {
        let view = self.views.get(id)?;
        Ok(Subgraph::new(self, view))
    }

    /// Write adapter for a view
    pub fn view_mut(&mut self, id: ViewId) -> GraphResult<ViewMut<'_>> {
        if !self.views.contains(id) {
            return Err(GraphError::ViewNotFound(id));
        }
        Ok(ViewMut::new(self, id))
    }

    // ------------------------------------------------------------------
    // Versions
    // ------------------------------------------------------------------

    pub fn node_version(&self) -> u32 {
        self.version.node_version()
    }

    pub fn edge_version(&self) -> u32 {
        self.version.edge_version()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    pub(crate) fn node_store(&self) -> &NodeStore {
        &self.nodes
    }

    pub(crate) fn edge_store(&self) -> &EdgeStore {
        &self.edges
    }

    pub(crate) fn view_registry(&self) -> &ViewRegistry {
        &self.views
    }

    pub(crate) fn view_registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    /// Split borrow for view mutation: registry (mutable) plus store
    /// context and hooks
    pub(crate) fn view_parts(
        &mut self,
    ) -> (&mut ViewRegistry, &NodeStore, &EdgeStore, Hooks<'_>) {
        (
            &mut self.views,
            &self.nodes,
            &self.edges,
            Hooks(self.hooks.as_deref_mut()),
        )
    }

    fn incident(
        &self,
        node: NodeId,
        direction: Direction,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<AdjacencyIter<'_>> {
        let slot = self.nodes.slot_of(node).ok_or(GraphError::NodeNotFound(node))?;
        Ok(self.edges.adjacency_iter(slot, direction, type_filter))
    }

    fn remove_edge_slot(&mut self, slot: EdgeSlot) -> GraphResult<Edge> {
        let mut hooks = Hooks(self.hooks.as_deref_mut());
        self.views.fan_out_edge_removed(slot, &self.edges, &mut hooks);
        let edge = self.edges.remove_slot(slot)?;
        self.version.bump_edge();
        Ok(edge)
    }

    fn allocate_node_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::new(self.next_node_id);
            self.next_node_id += 1;
            if !self.nodes.contains(id) {
                return id;
            }
        }
    }

    fn allocate_edge_id(&mut self) -> EdgeId {
        loop {
            let id = EdgeId::new(self.next_edge_id);
            self.next_edge_id += 1;
            if !self.edges.contains(id) {
                return id;
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("views", &self.views.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge_type::DEFAULT_EDGE_TYPE;

    fn store_with_nodes(count: u64) -> GraphStore {
        let mut store = GraphStore::new();
        for id in 1..=count {
            store.add_node(Node::new(id)).unwrap();
        }
        store
    }

    #[test]
    fn test_basic_degrees() {
        let mut store = store_with_nodes(3);
        store
            .add_edge(
                EdgeId::new(1),
                NodeId::new(1),
                NodeId::new(2),
                DEFAULT_EDGE_TYPE,
                true,
            )
            .unwrap();

        assert_eq!(store.degree(NodeId::new(1)).unwrap(), 1);
        assert_eq!(store.degree(NodeId::new(2)).unwrap(), 1);
        assert_eq!(store.degree(NodeId::new(3)).unwrap(), 0);
    }

    #[test]
    fn test_mutual_scenario() {
        let mut store = store_with_nodes(2);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store
            .add_edge(EdgeId::new(2), NodeId::new(2), NodeId::new(1), DEFAULT_EDGE_TYPE, true)
            .unwrap();

        assert!(store.edge(EdgeId::new(1)).unwrap().is_mutual());
        assert!(store.edge(EdgeId::new(2)).unwrap().is_mutual());
        assert_eq!(store.edge_count(), 2);
        assert_eq!(store.undirected_edge_count(), 1);
        assert_eq!(store.undirected_degree(NodeId::new(1)).unwrap(), 1);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut store = store_with_nodes(3);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store
            .add_edge(EdgeId::new(2), NodeId::new(3), NodeId::new(1), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store
            .add_edge(EdgeId::new(3), NodeId::new(2), NodeId::new(3), DEFAULT_EDGE_TYPE, true)
            .unwrap();

        let node = store.remove_node(NodeId::new(1)).unwrap();
        assert_eq!(node.store_id(), None);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);
        assert!(store.contains_edge(EdgeId::new(3)));
        assert_eq!(store.degree(NodeId::new(2)).unwrap(), 1);
    }

    #[test]
    fn test_slot_recycling_after_removal() {
        let mut store = store_with_nodes(3);
        let old_slot = store.node(NodeId::new(2)).unwrap().store_id().unwrap();
        store.remove_node(NodeId::new(2)).unwrap();

        let slot = store.add_node(Node::new(99)).unwrap();
        assert_eq!(slot, old_slot);
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_slot_uniqueness_among_live_nodes() {
        let mut store = store_with_nodes(50);
        for id in (1..=50).step_by(3) {
            store.remove_node(NodeId::new(id)).unwrap();
        }
        for id in 100..120 {
            store.add_node(Node::new(id)).unwrap();
        }
        let mut slots: Vec<_> = store.nodes().filter_map(|node| node.store_id()).collect();
        let total = slots.len();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), total);
        assert_eq!(total, store.node_count());
    }

    #[test]
    fn test_duplicate_and_missing_endpoints() {
        let mut store = store_with_nodes(2);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();

        assert_eq!(
            store.add_edge(EdgeId::new(2), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true),
            Err(GraphError::DuplicateEdge {
                source_node: NodeId::new(1),
                target: NodeId::new(2),
            })
        );
        assert_eq!(
            store.add_edge(EdgeId::new(2), NodeId::new(7), NodeId::new(2), DEFAULT_EDGE_TYPE, true),
            Err(GraphError::InvalidEdgeSource(NodeId::new(7)))
        );
        assert_eq!(
            store.add_edge(EdgeId::new(2), NodeId::new(1), NodeId::new(7), DEFAULT_EDGE_TYPE, true),
            Err(GraphError::InvalidEdgeTarget(NodeId::new(7)))
        );
    }

    #[test]
    fn test_edge_kind_enforcement() {
        let mut store = GraphStore::with_config(Config::new().with_edge_kinds(EdgeKinds::Directed));
        store.add_node(Node::new(1)).unwrap();
        store.add_node(Node::new(2)).unwrap();
        assert_eq!(
            store.add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, false),
            Err(GraphError::UndirectedEdgeRejected)
        );

        let mut store =
            GraphStore::with_config(Config::new().with_edge_kinds(EdgeKinds::Undirected));
        store.add_node(Node::new(1)).unwrap();
        store.add_node(Node::new(2)).unwrap();
        assert_eq!(
            store.add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true),
            Err(GraphError::DirectedEdgeRejected)
        );
    }

    #[test]
    fn test_neighbors_deduplicated() {
        let mut store = store_with_nodes(2);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store
            .add_edge(EdgeId::new(2), NodeId::new(2), NodeId::new(1), DEFAULT_EDGE_TYPE, true)
            .unwrap();

        let neighbors: Vec<NodeId> = store.neighbors(NodeId::new(1)).unwrap().collect();
        assert_eq!(neighbors, vec![NodeId::new(2)]);
    }

    #[test]
    fn test_edge_between_directed_and_undirected() {
        let mut store = store_with_nodes(3);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store
            .add_edge(EdgeId::new(2), NodeId::new(2), NodeId::new(3), DEFAULT_EDGE_TYPE, false)
            .unwrap();

        assert_eq!(
            store
                .edge_between(NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE)
                .map(|edge| edge.id()),
            Some(EdgeId::new(1))
        );
        // The undirected edge matches either endpoint order.
        assert_eq!(
            store
                .edge_between(NodeId::new(3), NodeId::new(2), DEFAULT_EDGE_TYPE)
                .map(|edge| edge.id()),
            Some(EdgeId::new(2))
        );
        assert!(store.is_adjacent(NodeId::new(1), NodeId::new(2)).unwrap());
        assert!(!store.is_adjacent(NodeId::new(1), NodeId::new(3)).unwrap());
    }

    #[test]
    fn test_created_ids_skip_taken() {
        let mut store = GraphStore::new();
        store.add_node(Node::new(1)).unwrap();
        store.add_node(Node::new(2)).unwrap();
        let id = store.create_node().unwrap();
        assert_eq!(id, NodeId::new(3));
    }

    #[test]
    fn test_version_counters() {
        let mut store = GraphStore::new();
        let v0 = store.node_version();
        store.add_node(Node::new(1)).unwrap();
        assert_ne!(store.node_version(), v0);

        let e0 = store.edge_version();
        store.add_node(Node::new(2)).unwrap();
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        assert_ne!(store.edge_version(), e0);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with_nodes(4);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store.clear();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);

        // The store is reusable after clear.
        store.add_node(Node::new(1)).unwrap();
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_clear_edges_keeps_nodes() {
        let mut store = store_with_nodes(3);
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), DEFAULT_EDGE_TYPE, true)
            .unwrap();
        store.clear_edges();
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.degree(NodeId::new(1)).unwrap(), 0);
    }

    #[test]
    fn test_par_iteration_counts() {
        let store = store_with_nodes(500);
        assert_eq!(store.par_node_ids().count(), 500);
    }

    #[test]
    fn test_unregister_edge_type() {
        let mut store = store_with_nodes(2);
        let knows = store.register_edge_type("KNOWS").unwrap();
        store
            .add_edge(EdgeId::new(1), NodeId::new(1), NodeId::new(2), knows, true)
            .unwrap();
        assert_eq!(
            store.unregister_edge_type(knows),
            Err(GraphError::EdgeTypeInUse(knows))
        );

        store.remove_edge(EdgeId::new(1)).unwrap();
        store.unregister_edge_type(knows).unwrap();
        assert_eq!(store.edge_types().id_of("KNOWS"), None);
    }
}
