//! View-bound adapters over the backing store
//!
//! [`Subgraph`] presents a view plus its store as a read-only graph: every
//! query filters the store's native iterators through the view's bitsets.
//! [`ViewMut`] forwards mutations and set algebra to the view, validating
//! store membership first. Both are thin: the view never mutates the store,
//! only its own bitset and statistic shadow.

use super::registry::ViewRegistry;
use super::view::{GraphView, Interval};
use crate::error::{GraphError, GraphResult};
use crate::graph::edge::Edge;
use crate::graph::edge_store::EdgeStore;
use crate::graph::node::Node;
use crate::graph::node_store::NodeStore;
use crate::graph::store::GraphStore;
use crate::graph::types::{Direction, EdgeId, EdgeTypeId, NodeId, ViewId};
use crate::hooks::Hooks;
use roaring::RoaringBitmap;
use rustc_hash::FxHashSet;

/// Read adapter binding a view to its store
#[derive(Clone, Copy)]
pub struct Subgraph<'a> {
    store: &'a GraphStore,
    view: &'a GraphView,
}

impl<'a> Subgraph<'a> {
    pub(crate) fn new(store: &'a GraphStore, view: &'a GraphView) -> Self {
        Subgraph { store, view }
    }

    pub fn view_id(&self) -> ViewId {
        self.view.id()
    }

    /// Nodes in the view; a view that does not filter nodes exposes the
    /// whole store
    pub fn node_count(&self) -> usize {
        if self.view.is_node_view() {
            self.view.node_count()
        } else {
            self.store.node_count()
        }
    }

    pub fn edge_count(&self) -> usize {
        self.view.edge_count()
    }

    pub fn edge_type_count(&self, type_id: EdgeTypeId) -> usize {
        self.view.edge_type_count(type_id)
    }

    pub fn mutual_count(&self, type_id: EdgeTypeId) -> usize {
        self.view.mutual_count(type_id)
    }

    pub fn undirected_edge_count(&self) -> usize {
        self.view.undirected_edge_count()
    }

    pub fn node_version(&self) -> u32 {
        self.view.node_version()
    }

    pub fn edge_version(&self) -> u32 {
        self.view.edge_version()
    }

    pub fn interval(&self) -> Option<Interval> {
        self.view.interval()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        match self.store.node_store().slot_of(node) {
            Some(slot) => !self.view.is_node_view() || self.view.contains_node_slot(slot),
            None => false,
        }
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.store
            .edge_store()
            .slot_of(edge)
            .is_some_and(|slot| self.view.contains_edge_slot(slot))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + 'a {
        let view = self.view;
        self.store.node_store().iter().filter(move |node| {
            !view.is_node_view()
                || node
                    .store_id()
                    .is_some_and(|slot| view.contains_node_slot(slot))
        })
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes().map(|node| node.id())
    }

    pub fn edges(&self) -> impl Iterator<Item = &'a Edge> + 'a {
        let view = self.view;
        self.store.edge_store().iter().filter(move |edge| {
            edge.store_id()
                .is_some_and(|slot| view.contains_edge_slot(slot))
        })
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + 'a {
        self.edges().map(|edge| edge.id())
    }

    pub fn out_edges(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        self.incident(node, Direction::Out, type_filter)
    }

    pub fn in_edges(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        self.incident(node, Direction::In, type_filter)
    }

    pub fn edges_of(
        &self,
        node: NodeId,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        self.incident(node, Direction::Both, type_filter)
    }

    /// Distinct neighbors of a view member
    pub fn neighbors(&self, node: NodeId) -> GraphResult<impl Iterator<Item = NodeId> + 'a> {
        let mut seen = FxHashSet::default();
        Ok(self.edges_of(node, None)?.filter_map(move |edge| {
            let opposite = edge.opposite(node)?;
            seen.insert(opposite.as_u64()).then_some(opposite)
        }))
    }

    pub fn out_degree(&self, node: NodeId) -> GraphResult<usize> {
        Ok(self.out_edges(node, None)?.count())
    }

    pub fn in_degree(&self, node: NodeId) -> GraphResult<usize> {
        Ok(self.in_edges(node, None)?.count())
    }

    /// In-degree plus out-degree; self-loops count twice
    pub fn degree(&self, node: NodeId) -> GraphResult<usize> {
        Ok(self.out_degree(node)? + self.in_degree(node)?)
    }

    /// Degree with each mutual pair collapsed to one undirected relation
    pub fn undirected_degree(&self, node: NodeId) -> GraphResult<usize> {
        let view = self.view;
        let edges = self.store.edge_store();
        let mutual_pairs = self
            .out_edges(node, None)?
            .filter(|edge| {
                edge.is_mutual()
                    && edge
                        .store_id()
                        .and_then(|slot| edges.reverse_resident(slot))
                        .is_some_and(|reverse| view.contains_edge_slot(reverse))
            })
            .count();
        Ok(self.degree(node)? - mutual_pairs)
    }

    /// Whether any view edge connects the two nodes, in either direction
    pub fn is_adjacent(&self, node: NodeId, other: NodeId) -> GraphResult<bool> {
        Ok(self.edges_of(node, None)?.any(|edge| edge.connects(node, other)))
    }

    fn incident(
        &self,
        node: NodeId,
        direction: Direction,
        type_filter: Option<EdgeTypeId>,
    ) -> GraphResult<impl Iterator<Item = &'a Edge> + 'a> {
        let slot = self
            .store
            .node_store()
            .slot_of(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        if self.view.is_node_view() && !self.view.contains_node_slot(slot) {
            return Err(GraphError::NotInView(node));
        }
        let view = self.view;
        Ok(self
            .store
            .edge_store()
            .adjacency_iter(slot, direction, type_filter)
            .filter(move |edge| {
                edge.store_id()
                    .is_some_and(|slot| view.contains_edge_slot(slot))
            }))
    }
}

/// Write adapter binding a view to its store
pub struct ViewMut<'a> {
    store: &'a mut GraphStore,
    view: ViewId,
}

impl<'a> ViewMut<'a> {
    pub(crate) fn new(store: &'a mut GraphStore, view: ViewId) -> Self {
        ViewMut { store, view }
    }

    pub fn id(&self) -> ViewId {
        self.view
    }

    /// Add a store node to the view
    pub fn add_node(&mut self, node: NodeId) -> GraphResult<bool> {
        let slot = self
            .store
            .node_store()
            .slot_of(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.add_node(slot, nodes, edges, &mut hooks)
    }

    /// Remove a node from the view, cascading removal of its view edges
    pub fn remove_node(&mut self, node: NodeId) -> GraphResult<bool> {
        let slot = self
            .store
            .node_store()
            .slot_of(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views
            .get_mut(self.view)?
            .remove_node(slot, nodes, edges, &mut hooks)
    }

    /// Add a store edge to the view; both endpoints must already be members
    /// when the view restricts nodes
    pub fn add_edge(&mut self, edge: EdgeId) -> GraphResult<bool> {
        let slot = self
            .store
            .edge_store()
            .slot_of(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        let (views, _, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.add_edge(slot, edges, &mut hooks)
    }

    pub fn remove_edge(&mut self, edge: EdgeId) -> GraphResult<bool> {
        let slot = self
            .store
            .edge_store()
            .slot_of(edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        let (views, _, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.remove_edge(slot, edges, &mut hooks)
    }

    /// Bulk union with another view of the same store
    pub fn union_with(&mut self, other: ViewId) -> GraphResult<()> {
        if self.view == other {
            return self.store.view_registry().get(other).map(|_| ());
        }
        let (views, nodes, edges, mut hooks) = parts(self.store);
        let (target, other) = views.pair_mut(self.view, other)?;
        target.union(other, nodes, edges, &mut hooks)
    }

    /// Bulk intersection with another view of the same store
    pub fn intersect_with(&mut self, other: ViewId) -> GraphResult<()> {
        if self.view == other {
            return self.store.view_registry().get(other).map(|_| ());
        }
        let (views, nodes, edges, mut hooks) = parts(self.store);
        let (target, other) = views.pair_mut(self.view, other)?;
        target.intersection(other, nodes, edges, &mut hooks)
    }

    /// Complement against the full store
    pub fn not(&mut self) -> GraphResult<()> {
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.not(nodes, edges, &mut hooks)
    }

    /// Materialize the full store into the view
    pub fn fill(&mut self) -> GraphResult<()> {
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.fill(nodes, edges, &mut hooks)
    }

    pub fn clear(&mut self) -> GraphResult<()> {
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.clear(nodes, edges, &mut hooks);
        Ok(())
    }

    pub fn clear_edges(&mut self) -> GraphResult<()> {
        let (views, _, edges, mut hooks) = parts(self.store);
        views.get_mut(self.view)?.clear_edges(edges, &mut hooks);
        Ok(())
    }

    /// Keep only the listed nodes, cascading edge removal in one bulk pass
    pub fn retain_nodes(
        &mut self,
        keep: impl IntoIterator<Item = NodeId>,
    ) -> GraphResult<bool> {
        let mut bits = RoaringBitmap::new();
        for node in keep {
            let slot = self
                .store
                .node_store()
                .slot_of(node)
                .ok_or(GraphError::NodeNotFound(node))?;
            bits.insert(slot.as_u32());
        }
        let (views, nodes, edges, mut hooks) = parts(self.store);
        views
            .get_mut(self.view)?
            .retain_nodes(&bits, nodes, edges, &mut hooks)
    }

    /// Remove the listed nodes in one bulk pass
    pub fn remove_nodes(
        &mut self,
        drop: impl IntoIterator<Item = NodeId>,
    ) -> GraphResult<bool> {
        let mut dropped = RoaringBitmap::new();
        for node in drop {
            let slot = self
                .store
                .node_store()
                .slot_of(node)
                .ok_or(GraphError::NodeNotFound(node))?;
            dropped.insert(slot.as_u32());
        }
        let (views, nodes, edges, mut hooks) = parts(self.store);
        let view = views.get_mut(self.view)?;
        let keep = view.node_bits() - &dropped;
        view.retain_nodes(&keep, nodes, edges, &mut hooks)
    }

    pub fn set_interval(&mut self, interval: Option<Interval>) -> GraphResult<()> {
        self.store.view_registry_mut().get_mut(self.view)?.set_interval(interval);
        Ok(())
    }
}

fn parts(
    store: &mut GraphStore,
) -> (&mut ViewRegistry, &NodeStore, &EdgeStore, Hooks<'_>) {
    store.view_parts()
}
