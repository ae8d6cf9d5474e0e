//! Bitset subgraph overlays with incrementally maintained statistics
//!
//! A view marks which node and edge slots of the backing store are "in"
//! without copying any of the graph. Statistics (totals, per-type edge
//! counts, mutual pairs) are maintained incrementally on every mutation
//! path; only `fill`, `not`, and the bulk set-algebra operations recompute
//! affected subsets in one pass. Bulk operations never loop over public
//! per-element mutations: collaborator index maintenance happens in a
//! single batched pass and version counters are bumped exactly once.

use crate::error::{GraphError, GraphResult};
use crate::graph::edge::Edge;
use crate::graph::edge_store::EdgeStore;
use crate::graph::node_store::NodeStore;
use crate::graph::types::{Direction, EdgeSlot, EdgeTypeId, GraphVersion, NodeSlot, ViewId};
use crate::hooks::Hooks;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Closed time interval a view may restrict itself to
///
/// The mapping from the interval to elements is owned by the time-index
/// collaborator; the view only carries the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    /// `low` must not exceed `high`
    pub fn new(low: f64, high: f64) -> Self {
        debug_assert!(low <= high);
        Interval { low, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        self.low <= timestamp && timestamp <= self.high
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// A subgraph overlay: bitset membership plus derived statistics
///
/// Views restricting nodes maintain the membership invariant: an edge is
/// present only while both its endpoints are. A node-restricted view that
/// does not filter edges tracks its induced edges implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphView {
    pub(crate) id: ViewId,
    node_view: bool,
    edge_view: bool,
    node_bits: RoaringBitmap,
    edge_bits: RoaringBitmap,
    node_count: usize,
    edge_count: usize,
    type_counts: Vec<usize>,
    mutual_counts: Vec<usize>,
    mutual_pairs: usize,
    version: GraphVersion,
    interval: Option<Interval>,
}

impl GraphView {
    pub(crate) fn new(id: ViewId, node_view: bool, edge_view: bool) -> Self {
        GraphView {
            id,
            node_view,
            edge_view,
            node_bits: RoaringBitmap::new(),
            edge_bits: RoaringBitmap::new(),
            node_count: 0,
            edge_count: 0,
            type_counts: Vec::new(),
            mutual_counts: Vec::new(),
            mutual_pairs: 0,
            version: GraphVersion::new(),
            interval: None,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Whether this view filters nodes
    pub fn is_node_view(&self) -> bool {
        self.node_view
    }

    /// Whether this view filters edges explicitly (otherwise induced edges
    /// follow node membership)
    pub fn is_edge_view(&self) -> bool {
        self.edge_view
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Edges of one type currently in the view
    pub fn edge_type_count(&self, type_id: EdgeTypeId) -> usize {
        self.type_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    /// Mutual pairs of one type with both edges in the view
    pub fn mutual_count(&self, type_id: EdgeTypeId) -> usize {
        self.mutual_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    pub fn mutual_pair_count(&self) -> usize {
        self.mutual_pairs
    }

    /// Distinct undirected relations in the view
    pub fn undirected_edge_count(&self) -> usize {
        self.edge_count - self.mutual_pairs
    }

    pub fn node_version(&self) -> u32 {
        self.version.node_version()
    }

    pub fn edge_version(&self) -> u32 {
        self.version.edge_version()
    }

    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    pub(crate) fn set_interval(&mut self, interval: Option<Interval>) {
        self.interval = interval;
    }

    pub(crate) fn contains_node_slot(&self, slot: NodeSlot) -> bool {
        self.node_bits.contains(slot.as_u32())
    }

    pub(crate) fn contains_edge_slot(&self, slot: EdgeSlot) -> bool {
        self.edge_bits.contains(slot.as_u32())
    }

    pub(crate) fn node_bits(&self) -> &RoaringBitmap {
        &self.node_bits
    }

    pub(crate) fn edge_bits(&self) -> &RoaringBitmap {
        &self.edge_bits
    }

    /// Add a node to the view; in implicit-edge mode its induced edges
    /// (opposite endpoint already present) follow
    pub(crate) fn add_node(
        &mut self,
        slot: NodeSlot,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<bool> {
        if !self.node_view {
            return Err(GraphError::NodeViewDisabled);
        }
        if !self.node_bits.insert(slot.as_u32()) {
            return Ok(false);
        }
        self.node_count += 1;
        if let Some(id) = nodes.id_of(slot) {
            hooks.index_node(id, self.id);
        }

        let mut edge_changed = false;
        if !self.edge_view {
            for edge in edges.adjacency_iter(slot, Direction::Both, None) {
                let opposite = if edge.source_slot == slot {
                    edge.target_slot
                } else {
                    edge.source_slot
                };
                if self.node_bits.contains(opposite.as_u32()) && self.insert_edge(edge, edges) {
                    hooks.index_edge(edge.id(), self.id);
                    edge_changed = true;
                }
            }
        }

        self.version.bump_node();
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(true)
    }

    /// Remove a node, cascading removal of its edges still in the view
    pub(crate) fn remove_node(
        &mut self,
        slot: NodeSlot,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<bool> {
        if !self.node_view {
            return Err(GraphError::NodeViewDisabled);
        }
        if !self.node_bits.contains(slot.as_u32()) {
            return Ok(false);
        }

        let mut edge_changed = false;
        for edge in edges.adjacency_iter(slot, Direction::Both, None) {
            if self.remove_edge_inner(edge, edges) {
                hooks.clear_edge(edge.id(), self.id);
                edge_changed = true;
            }
        }

        self.node_bits.remove(slot.as_u32());
        self.node_count -= 1;
        if let Some(id) = nodes.id_of(slot) {
            hooks.clear_node(id, self.id);
        }

        self.version.bump_node();
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(true)
    }

    /// Add an edge; rejected unless both endpoints are present when the
    /// view restricts nodes
    pub(crate) fn add_edge(
        &mut self,
        slot: EdgeSlot,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<bool> {
        if !self.edge_view {
            return Err(GraphError::EdgeViewDisabled);
        }
        let edge = edges.get_slot(slot).ok_or(GraphError::StaleSlot)?;
        if self.node_view {
            if !self.node_bits.contains(edge.source_slot.as_u32()) {
                return Err(GraphError::NotInView(edge.source()));
            }
            if !self.node_bits.contains(edge.target_slot.as_u32()) {
                return Err(GraphError::NotInView(edge.target()));
            }
        }
        if !self.insert_edge(edge, edges) {
            return Ok(false);
        }
        hooks.index_edge(edge.id(), self.id);
        self.version.bump_edge();
        Ok(true)
    }

    pub(crate) fn remove_edge(
        &mut self,
        slot: EdgeSlot,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<bool> {
        if !self.edge_view {
            return Err(GraphError::EdgeViewDisabled);
        }
        let edge = edges.get_slot(slot).ok_or(GraphError::StaleSlot)?;
        if !self.remove_edge_inner(edge, edges) {
            return Ok(false);
        }
        hooks.clear_edge(edge.id(), self.id);
        self.version.bump_edge();
        Ok(true)
    }

    /// Fan-out: an edge is being removed from the store
    pub(crate) fn store_edge_removed(
        &mut self,
        slot: EdgeSlot,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) {
        let Some(edge) = edges.get_slot(slot) else {
            return;
        };
        if self.remove_edge_inner(edge, edges) {
            hooks.clear_edge(edge.id(), self.id);
            self.version.bump_edge();
        }
    }

    /// Fan-out: a node is being removed from the store; its incident edges
    /// are already gone
    pub(crate) fn store_node_removed(
        &mut self,
        slot: NodeSlot,
        nodes: &NodeStore,
        hooks: &mut Hooks<'_>,
    ) {
        if !self.node_view || !self.node_bits.remove(slot.as_u32()) {
            return;
        }
        self.node_count -= 1;
        if let Some(id) = nodes.id_of(slot) {
            hooks.clear_node(id, self.id);
        }
        self.version.bump_node();
    }

    /// Bulk union: add everything in `other` missing from this view
    pub(crate) fn union(
        &mut self,
        other: &GraphView,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<()> {
        self.check_kind(other)?;
        let node_delta = &other.node_bits - &self.node_bits;
        trace!(view = %self.id, nodes = node_delta.len(), "bulk union");

        let mut node_changed = false;
        if self.node_view {
            for raw in node_delta.iter() {
                self.node_bits.insert(raw);
                self.node_count += 1;
                node_changed = true;
                if let Some(id) = nodes.id_of(NodeSlot::new(raw)) {
                    hooks.index_node(id, self.id);
                }
            }
        }

        let mut edge_changed = false;
        if self.edge_view {
            let edge_delta = &other.edge_bits - &self.edge_bits;
            for raw in edge_delta.iter() {
                if let Some(edge) = edges.get_slot(EdgeSlot::new(raw)) {
                    if self.insert_edge(edge, edges) {
                        hooks.index_edge(edge.id(), self.id);
                        edge_changed = true;
                    }
                }
            }
        } else if self.node_view {
            // Induced edges of the newly added nodes.
            for raw in node_delta.iter() {
                let slot = NodeSlot::new(raw);
                for edge in edges.adjacency_iter(slot, Direction::Both, None) {
                    let opposite = if edge.source_slot == slot {
                        edge.target_slot
                    } else {
                        edge.source_slot
                    };
                    if self.node_bits.contains(opposite.as_u32()) && self.insert_edge(edge, edges)
                    {
                        hooks.index_edge(edge.id(), self.id);
                        edge_changed = true;
                    }
                }
            }
        }

        if node_changed {
            self.version.bump_node();
        }
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(())
    }

    /// Bulk intersection: drop everything missing from `other`
    pub(crate) fn intersection(
        &mut self,
        other: &GraphView,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<()> {
        self.check_kind(other)?;
        // Edges first so node removal needs no cascade: an edge surviving
        // in both views has both endpoints surviving in both views.
        let edge_delta = &self.edge_bits - &other.edge_bits;
        trace!(view = %self.id, edges = edge_delta.len(), "bulk intersection");

        let mut edge_changed = false;
        for raw in edge_delta.iter() {
            if let Some(edge) = edges.get_slot(EdgeSlot::new(raw)) {
                if self.remove_edge_inner(edge, edges) {
                    hooks.clear_edge(edge.id(), self.id);
                    edge_changed = true;
                }
            }
        }

        let mut node_changed = false;
        if self.node_view {
            let node_delta = &self.node_bits - &other.node_bits;
            for raw in node_delta.iter() {
                self.node_bits.remove(raw);
                self.node_count -= 1;
                node_changed = true;
                if let Some(id) = nodes.id_of(NodeSlot::new(raw)) {
                    hooks.clear_node(id, self.id);
                }
            }
        }

        if node_changed {
            self.version.bump_node();
        }
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(())
    }

    /// Complement: flip membership against the store's live slots
    ///
    /// Per-type counts are inverted from store totals after growing the
    /// count arrays to the registry's current width (the registry may have
    /// grown since this view was created). Mutual counts are recomputed by
    /// scan. When the view restricts nodes, a second pass drops edges left
    /// dangling by the flip. Collaborator indices are rebuilt wholesale.
    pub(crate) fn not(
        &mut self,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<()> {
        let width = edges.types().width();
        if self.type_counts.len() < width {
            self.type_counts.resize(width, 0);
        }
        if self.mutual_counts.len() < width {
            self.mutual_counts.resize(width, 0);
        }

        let mut node_changed = false;
        if self.node_view {
            let flipped = nodes.live() - &self.node_bits;
            node_changed = flipped != self.node_bits;
            self.node_bits = flipped;
            self.node_count = nodes.len() - self.node_count;
        }

        let flipped = edges.live() - &self.edge_bits;
        let mut edge_changed = flipped != self.edge_bits;
        self.edge_bits = flipped;
        self.edge_count = edges.len() - self.edge_count;
        for index in 0..width {
            let type_id = EdgeTypeId::new(index as u16);
            self.type_counts[index] = edges.type_count(type_id) - self.type_counts[index];
        }

        if self.node_view {
            // Flipping can produce dangling edges: both endpoint sets
            // changed wholesale.
            let mut dangling = Vec::new();
            for raw in self.edge_bits.iter() {
                if let Some(edge) = edges.get_slot(EdgeSlot::new(raw)) {
                    if !self.node_bits.contains(edge.source_slot.as_u32())
                        || !self.node_bits.contains(edge.target_slot.as_u32())
                    {
                        dangling.push((raw, edge.type_id()));
                    }
                }
            }
            for (raw, type_id) in dangling {
                self.edge_bits.remove(raw);
                self.edge_count -= 1;
                self.type_counts[type_id.index()] -= 1;
                edge_changed = true;
            }
        }

        self.recompute_mutual(edges);
        trace!(view = %self.id, nodes = self.node_count, edges = self.edge_count, "complement");

        hooks.index_view(self.id);
        if node_changed {
            self.version.bump_node();
        }
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(())
    }

    /// Keep only the nodes in `keep`, cascading edge removal
    pub(crate) fn retain_nodes(
        &mut self,
        keep: &RoaringBitmap,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<bool> {
        if !self.node_view {
            return Err(GraphError::NodeViewDisabled);
        }
        let to_remove = &self.node_bits - keep;
        if to_remove.is_empty() {
            return Ok(false);
        }
        trace!(view = %self.id, nodes = to_remove.len(), "bulk retain");

        let mut edge_changed = false;
        for raw in to_remove.iter() {
            let slot = NodeSlot::new(raw);
            for edge in edges.adjacency_iter(slot, Direction::Both, None) {
                if self.remove_edge_inner(edge, edges) {
                    hooks.clear_edge(edge.id(), self.id);
                    edge_changed = true;
                }
            }
            self.node_bits.remove(raw);
            self.node_count -= 1;
            if let Some(id) = nodes.id_of(slot) {
                hooks.clear_node(id, self.id);
            }
        }

        self.version.bump_node();
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(true)
    }

    /// Materialize the full store into this view
    pub(crate) fn fill(
        &mut self,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) -> GraphResult<()> {
        let mut node_changed = false;
        if self.node_view {
            node_changed = &self.node_bits != nodes.live();
            self.node_bits = nodes.live().clone();
            self.node_count = nodes.len();
        }

        let edge_changed = &self.edge_bits != edges.live();
        self.edge_bits = edges.live().clone();
        self.edge_count = edges.len();
        let width = edges.types().width();
        self.type_counts = (0..width)
            .map(|index| edges.type_count(EdgeTypeId::new(index as u16)))
            .collect();
        self.mutual_counts = (0..width)
            .map(|index| edges.mutual_count(EdgeTypeId::new(index as u16)))
            .collect();
        self.mutual_pairs = edges.mutual_pair_count();

        hooks.index_view(self.id);
        if node_changed {
            self.version.bump_node();
        }
        if edge_changed {
            self.version.bump_edge();
        }
        Ok(())
    }

    /// Empty the view
    pub(crate) fn clear(
        &mut self,
        nodes: &NodeStore,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) {
        self.clear_edges_internal(edges, hooks);
        if self.node_view && self.node_count > 0 {
            if hooks.is_active() {
                for raw in self.node_bits.iter() {
                    if let Some(id) = nodes.id_of(NodeSlot::new(raw)) {
                        hooks.clear_node(id, self.id);
                    }
                }
            }
            self.node_bits = RoaringBitmap::new();
            self.node_count = 0;
            self.version.bump_node();
        }
    }

    /// Drop all edges, keeping node membership
    pub(crate) fn clear_edges(&mut self, edges: &EdgeStore, hooks: &mut Hooks<'_>) {
        self.clear_edges_internal(edges, hooks);
    }

    fn clear_edges_internal(&mut self, edges: &EdgeStore, hooks: &mut Hooks<'_>) {
        if self.edge_count == 0 {
            return;
        }
        if hooks.is_active() {
            for raw in self.edge_bits.iter() {
                if let Some(id) = edges.id_of(EdgeSlot::new(raw)) {
                    hooks.clear_edge(id, self.id);
                }
            }
        }
        self.edge_bits = RoaringBitmap::new();
        self.edge_count = 0;
        self.type_counts.iter_mut().for_each(|count| *count = 0);
        self.mutual_counts.iter_mut().for_each(|count| *count = 0);
        self.mutual_pairs = 0;
        self.version.bump_edge();
    }

    fn check_kind(&self, other: &GraphView) -> GraphResult<()> {
        if self.node_view != other.node_view || self.edge_view != other.edge_view {
            return Err(GraphError::ViewKindMismatch);
        }
        Ok(())
    }

    /// Set the edge bit and maintain totals, per-type, and mutual counts.
    /// A mutual pair is counted when the second of the pair enters.
    fn insert_edge(&mut self, edge: &Edge, edges: &EdgeStore) -> bool {
        let Some(slot) = edge.store_id() else {
            return false;
        };
        if !self.edge_bits.insert(slot.as_u32()) {
            return false;
        }
        self.edge_count += 1;
        let index = edge.type_id().index();
        if self.type_counts.len() <= index {
            self.type_counts.resize(index + 1, 0);
        }
        self.type_counts[index] += 1;

        if edge.is_mutual() {
            if let Some(reverse) = edges.reverse_resident(slot) {
                if self.edge_bits.contains(reverse.as_u32()) {
                    if self.mutual_counts.len() <= index {
                        self.mutual_counts.resize(index + 1, 0);
                    }
                    self.mutual_counts[index] += 1;
                    self.mutual_pairs += 1;
                }
            }
        }
        true
    }

    /// Clear the edge bit and maintain the same counters; a mutual pair is
    /// uncounted when the first of the pair leaves.
    fn remove_edge_inner(&mut self, edge: &Edge, edges: &EdgeStore) -> bool {
        let Some(slot) = edge.store_id() else {
            return false;
        };
        if !self.edge_bits.remove(slot.as_u32()) {
            return false;
        }
        self.edge_count -= 1;
        let index = edge.type_id().index();
        self.type_counts[index] -= 1;

        if edge.is_mutual() {
            if let Some(reverse) = edges.reverse_resident(slot) {
                if self.edge_bits.contains(reverse.as_u32()) {
                    self.mutual_counts[index] -= 1;
                    self.mutual_pairs -= 1;
                }
            }
        }
        true
    }

    /// Rebuild mutual counters by scanning current membership; each pair is
    /// counted once, at its lower slot.
    fn recompute_mutual(&mut self, edges: &EdgeStore) {
        self.mutual_counts.iter_mut().for_each(|count| *count = 0);
        self.mutual_pairs = 0;
        for raw in self.edge_bits.iter() {
            let slot = EdgeSlot::new(raw);
            let Some(edge) = edges.get_slot(slot) else {
                continue;
            };
            if !edge.is_mutual() {
                continue;
            }
            if let Some(reverse) = edges.reverse_resident(slot) {
                if reverse.as_u32() > raw && self.edge_bits.contains(reverse.as_u32()) {
                    let index = edge.type_id().index();
                    if self.mutual_counts.len() <= index {
                        self.mutual_counts.resize(index + 1, 0);
                    }
                    self.mutual_counts[index] += 1;
                    self.mutual_pairs += 1;
                }
            }
        }
    }
}
