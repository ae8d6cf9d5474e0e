//! Edge pool with intrusive adjacency lists and mutual-edge bookkeeping
//!
//! Each node slot owns one doubly-linked out-list and one in-list per edge
//! type; edges carry the links. A canonical dictionary keyed by
//! `(source, target, type)` (endpoints ordered for undirected edges)
//! rejects duplicate parallel edges and answers endpoint lookups in O(1).
//!
//! Mutual bookkeeping: whenever A->B of type T is added or removed, the
//! store checks for B->A of the same type; if found, both edges are marked
//! or unmarked mutual and global plus per-type mutual-pair counters are
//! adjusted. Undirected edge count = total edges - mutual pairs, since each
//! mutual pair represents one undirected relation.

use super::block::{ElementPool, PoolElement};
use super::edge::Edge;
use super::edge_type::EdgeTypeRegistry;
use super::types::{Direction, EdgeId, EdgeSlot, EdgeTypeId, NodeId, NodeSlot};
use crate::error::{GraphError, GraphResult};
use rayon::prelude::*;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Per-node adjacency state: list heads bucketed by edge type, plus degree
/// counters
#[derive(Debug, Default, Clone)]
struct NodeAdjacency {
    out_heads: Vec<Option<EdgeSlot>>,
    in_heads: Vec<Option<EdgeSlot>>,
    out_degree: u32,
    in_degree: u32,
    mutual_degree: u32,
}

/// Canonical edge identity: endpoints ordered for undirected edges so both
/// orientations hash to the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DictKey {
    a: u32,
    b: u32,
    type_id: u16,
    directed: bool,
}

impl DictKey {
    fn new(source: NodeSlot, target: NodeSlot, type_id: EdgeTypeId, directed: bool) -> Self {
        let (a, b) = if directed {
            (source.as_u32(), target.as_u32())
        } else {
            let (lo, hi) = if source <= target {
                (source, target)
            } else {
                (target, source)
            };
            (lo.as_u32(), hi.as_u32())
        };
        DictKey {
            a,
            b,
            type_id: type_id.as_u16(),
            directed,
        }
    }
}

/// Block-allocated edge pool with adjacency lists, type registry, and
/// mutual-edge counters
#[derive(Debug)]
pub struct EdgeStore {
    pool: ElementPool<Edge>,
    types: EdgeTypeRegistry,
    adjacency: Vec<NodeAdjacency>,
    dictionary: FxHashMap<DictKey, EdgeSlot>,
    type_counts: Vec<usize>,
    mutual_counts: Vec<usize>,
    mutual_pairs: usize,
    allow_parallel: bool,
}

impl EdgeStore {
    pub(crate) fn new(block_size: usize, allow_parallel: bool) -> Self {
        EdgeStore {
            pool: ElementPool::new(block_size),
            types: EdgeTypeRegistry::new(),
            adjacency: Vec::new(),
            dictionary: FxHashMap::default(),
            type_counts: Vec::new(),
            mutual_counts: Vec::new(),
            mutual_pairs: 0,
            allow_parallel,
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Total edges minus mutual pairs: the number of distinct undirected
    /// relations
    pub fn undirected_len(&self) -> usize {
        self.pool.len() - self.mutual_pairs
    }

    pub fn contains(&self, id: EdgeId) -> bool {
        self.pool.contains_key(id.as_u64())
    }

    pub fn get(&self, id: EdgeId) -> Option<&Edge> {
        self.pool.get(id.as_u64())
    }

    pub(crate) fn get_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.pool.get_mut(id.as_u64())
    }

    pub(crate) fn get_slot(&self, slot: EdgeSlot) -> Option<&Edge> {
        self.pool.get_slot(slot.as_u32())
    }

    pub(crate) fn slot_of(&self, id: EdgeId) -> Option<EdgeSlot> {
        self.pool.slot_of(id.as_u64()).map(EdgeSlot::new)
    }

    pub(crate) fn id_of(&self, slot: EdgeSlot) -> Option<EdgeId> {
        self.get_slot(slot).map(|edge| edge.id())
    }

    pub(crate) fn live(&self) -> &RoaringBitmap {
        self.pool.live()
    }

    pub(crate) fn types(&self) -> &EdgeTypeRegistry {
        &self.types
    }

    pub(crate) fn types_mut(&mut self) -> &mut EdgeTypeRegistry {
        &mut self.types
    }

    /// Live edges of the given type
    pub fn type_count(&self, type_id: EdgeTypeId) -> usize {
        self.type_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    /// Mutual pairs of the given type
    pub fn mutual_count(&self, type_id: EdgeTypeId) -> usize {
        self.mutual_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    /// Total mutual pairs across all types
    pub fn mutual_pair_count(&self) -> usize {
        self.mutual_pairs
    }

    pub(crate) fn out_degree(&self, node: NodeSlot) -> u32 {
        self.adjacency
            .get(node.index())
            .map_or(0, |adj| adj.out_degree)
    }

    pub(crate) fn in_degree(&self, node: NodeSlot) -> u32 {
        self.adjacency
            .get(node.index())
            .map_or(0, |adj| adj.in_degree)
    }

    pub(crate) fn mutual_degree(&self, node: NodeSlot) -> u32 {
        self.adjacency
            .get(node.index())
            .map_or(0, |adj| adj.mutual_degree)
    }

    /// Make room for a node slot's adjacency state
    pub(crate) fn ensure_node(&mut self, node: NodeSlot) {
        if node.index() >= self.adjacency.len() {
            self.adjacency.resize(node.index() + 1, NodeAdjacency::default());
        }
    }

    /// Forget a removed node's adjacency state; its incident edges must
    /// already be gone
    pub(crate) fn node_removed(&mut self, node: NodeSlot) {
        if let Some(adj) = self.adjacency.get_mut(node.index()) {
            debug_assert_eq!(adj.out_degree, 0);
            debug_assert_eq!(adj.in_degree, 0);
            *adj = NodeAdjacency::default();
        }
    }

    /// Insert an edge: validate identity, enforce the parallel-edge rule,
    /// splice the adjacency lists, and maintain mutual state
    ///
    /// Endpoint existence and the store's edge-kind rule are validated by
    /// the caller, which owns the node store.
    pub(crate) fn add(&mut self, edge: Edge) -> GraphResult<EdgeSlot> {
        if edge.slot().is_some() {
            return Err(GraphError::AlreadyInStore);
        }
        if let Some(existing) = self.get(edge.id()) {
            if existing.source() == edge.source()
                && existing.target() == edge.target()
                && existing.type_id() == edge.type_id()
            {
                return Err(GraphError::DuplicateEdgeId(edge.id()));
            }
            return Err(GraphError::EdgeEndpointsMismatch(edge.id()));
        }
        if !self.types.contains(edge.type_id()) {
            return Err(GraphError::EdgeTypeNotFound(edge.type_id()));
        }

        let key = DictKey::new(
            edge.source_slot,
            edge.target_slot,
            edge.type_id(),
            edge.is_directed(),
        );
        let resident = self.dictionary.contains_key(&key);
        if resident && !self.allow_parallel {
            return Err(GraphError::DuplicateEdge {
                source_node: edge.source(),
                target: edge.target(),
            });
        }

        debug!(edge = %edge.id(), source = %edge.source(), target = %edge.target(), "adding edge");
        let slot = self.splice(edge)?;
        if !resident {
            self.dictionary.insert(key, slot);
            self.pair_mutual(slot);
        }
        Ok(slot)
    }

    /// Remove an edge by external id
    pub(crate) fn remove(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let slot = self.slot_of(id).ok_or(GraphError::EdgeNotFound(id))?;
        self.remove_slot(slot)
    }

    /// Remove the edge in the given slot: unsplice both lists, repair the
    /// canonical dictionary, and release the slot
    pub(crate) fn remove_slot(&mut self, slot: EdgeSlot) -> GraphResult<Edge> {
        let (id, key) = {
            let edge = self.get_slot(slot).ok_or(GraphError::StaleSlot)?;
            (
                edge.id(),
                DictKey::new(
                    edge.source_slot,
                    edge.target_slot,
                    edge.type_id(),
                    edge.is_directed(),
                ),
            )
        };
        debug!(edge = %id, "removing edge");

        if self.dictionary.get(&key) == Some(&slot) {
            self.unpair_mutual(slot);
            self.dictionary.remove(&key);
            if self.allow_parallel {
                // Dictionary repair: the first surviving parallel edge
                // becomes the new resident.
                if let Some(survivor) = self.find_parallel(key, slot) {
                    self.dictionary.insert(key, survivor);
                    self.pair_mutual(survivor);
                }
            }
        }

        self.unsplice(slot)?;
        let edge = self
            .pool
            .remove(id.as_u64())
            .ok_or(GraphError::EdgeNotFound(id))?;
        self.type_counts[edge.type_id().index()] -= 1;
        Ok(edge)
    }

    /// Canonical-dictionary lookup; for undirected edges either endpoint
    /// order matches
    pub(crate) fn edge_between(
        &self,
        source: NodeSlot,
        target: NodeSlot,
        type_id: EdgeTypeId,
    ) -> Option<&Edge> {
        let directed = DictKey::new(source, target, type_id, true);
        if let Some(&slot) = self.dictionary.get(&directed) {
            return self.get_slot(slot);
        }
        let undirected = DictKey::new(source, target, type_id, false);
        let slot = *self.dictionary.get(&undirected)?;
        self.get_slot(slot)
    }

    /// Slot of the dictionary-resident reverse edge (target->source, same
    /// type), if one is live
    pub(crate) fn reverse_resident(&self, slot: EdgeSlot) -> Option<EdgeSlot> {
        let edge = self.get_slot(slot)?;
        if !edge.is_directed() || edge.is_self_loop() {
            return None;
        }
        let key = DictKey::new(edge.target_slot, edge.source_slot, edge.type_id(), true);
        self.dictionary.get(&key).copied()
    }

    /// Walk a node's adjacency: out-list, in-list, or both, optionally
    /// restricted to one type
    pub(crate) fn adjacency_iter(
        &self,
        node: NodeSlot,
        direction: Direction,
        type_filter: Option<EdgeTypeId>,
    ) -> AdjacencyIter<'_> {
        let mut heads = Vec::new();
        if let Some(adj) = self.adjacency.get(node.index()) {
            let mut collect = |phase: Direction, list: &[Option<EdgeSlot>]| match type_filter {
                Some(type_id) => {
                    if let Some(Some(head)) = list.get(type_id.index()) {
                        heads.push((phase, *head));
                    }
                }
                None => {
                    heads.extend(list.iter().flatten().map(|&head| (phase, head)));
                }
            };
            if matches!(direction, Direction::Out | Direction::Both) {
                collect(Direction::Out, &adj.out_heads);
            }
            if matches!(direction, Direction::In | Direction::Both) {
                collect(Direction::In, &adj.in_heads);
            }
        }
        AdjacencyIter {
            store: self,
            heads: heads.into_iter(),
            current: None,
            skip_self_loops_in: direction == Direction::Both,
        }
    }

    /// Iterate live edges in block/slot order
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.pool.iter()
    }

    pub(crate) fn par_iter(&self) -> impl ParallelIterator<Item = &Edge> {
        self.pool.par_iter()
    }

    pub(crate) fn clear(&mut self) {
        self.pool.clear();
        self.dictionary = FxHashMap::default();
        self.type_counts.iter_mut().for_each(|count| *count = 0);
        self.mutual_counts.iter_mut().for_each(|count| *count = 0);
        self.mutual_pairs = 0;
        for adj in &mut self.adjacency {
            *adj = NodeAdjacency::default();
        }
    }

    /// Splice a new edge onto the head of its source's out-list and its
    /// target's in-list
    fn splice(&mut self, edge: Edge) -> GraphResult<EdgeSlot> {
        let type_index = edge.type_id().index();
        let source = edge.source_slot;
        let target = edge.target_slot;
        let slot = EdgeSlot::new(self.pool.add(edge)?);

        grow_counts(&mut self.type_counts, type_index + 1);
        self.type_counts[type_index] += 1;

        self.ensure_node(source);
        self.ensure_node(target);

        let adj = &mut self.adjacency[source.index()];
        grow_heads(&mut adj.out_heads, type_index + 1);
        let old_out = adj.out_heads[type_index].replace(slot);
        adj.out_degree += 1;
        if let Some(head) = old_out {
            if let Some(next) = self.pool.get_slot_mut(head.as_u32()) {
                next.links.prev_out = Some(slot);
            }
        }

        let adj = &mut self.adjacency[target.index()];
        grow_heads(&mut adj.in_heads, type_index + 1);
        let old_in = adj.in_heads[type_index].replace(slot);
        adj.in_degree += 1;
        if let Some(head) = old_in {
            if let Some(next) = self.pool.get_slot_mut(head.as_u32()) {
                next.links.prev_in = Some(slot);
            }
        }

        if let Some(edge) = self.pool.get_slot_mut(slot.as_u32()) {
            edge.links.next_out = old_out;
            edge.links.next_in = old_in;
        }
        Ok(slot)
    }

    /// Unlink an edge from both intrusive lists
    fn unsplice(&mut self, slot: EdgeSlot) -> GraphResult<()> {
        let (links, source, target, type_index) = {
            let edge = self.get_slot(slot).ok_or(GraphError::StaleSlot)?;
            (
                edge.links,
                edge.source_slot,
                edge.target_slot,
                edge.type_id().index(),
            )
        };

        match links.prev_out {
            Some(prev) => {
                if let Some(edge) = self.pool.get_slot_mut(prev.as_u32()) {
                    edge.links.next_out = links.next_out;
                }
            }
            None => self.adjacency[source.index()].out_heads[type_index] = links.next_out,
        }
        if let Some(next) = links.next_out {
            if let Some(edge) = self.pool.get_slot_mut(next.as_u32()) {
                edge.links.prev_out = links.prev_out;
            }
        }
        self.adjacency[source.index()].out_degree -= 1;

        match links.prev_in {
            Some(prev) => {
                if let Some(edge) = self.pool.get_slot_mut(prev.as_u32()) {
                    edge.links.next_in = links.next_in;
                }
            }
            None => self.adjacency[target.index()].in_heads[type_index] = links.next_in,
        }
        if let Some(next) = links.next_in {
            if let Some(edge) = self.pool.get_slot_mut(next.as_u32()) {
                edge.links.prev_in = links.prev_in;
            }
        }
        self.adjacency[target.index()].in_degree -= 1;
        Ok(())
    }

    /// Mark the edge and its reverse resident mutual, if the reverse exists
    fn pair_mutual(&mut self, slot: EdgeSlot) {
        let Some(reverse) = self.reverse_resident(slot) else {
            return;
        };
        let (source, target, type_index) = match self.get_slot(slot) {
            Some(edge) => (edge.source_slot, edge.target_slot, edge.type_id().index()),
            None => return,
        };
        if let Some(edge) = self.pool.get_slot_mut(slot.as_u32()) {
            edge.mutual = true;
        }
        if let Some(edge) = self.pool.get_slot_mut(reverse.as_u32()) {
            edge.mutual = true;
        }
        grow_counts(&mut self.mutual_counts, type_index + 1);
        self.mutual_counts[type_index] += 1;
        self.mutual_pairs += 1;
        self.adjacency[source.index()].mutual_degree += 1;
        self.adjacency[target.index()].mutual_degree += 1;
    }

    /// Undo the mutual pairing around an edge that is leaving the
    /// dictionary
    fn unpair_mutual(&mut self, slot: EdgeSlot) {
        let is_mutual = self
            .get_slot(slot)
            .map_or(false, |edge| edge.is_mutual());
        if !is_mutual {
            return;
        }
        let Some(reverse) = self.reverse_resident(slot) else {
            return;
        };
        let (source, target, type_index) = match self.get_slot(slot) {
            Some(edge) => (edge.source_slot, edge.target_slot, edge.type_id().index()),
            None => return,
        };
        if let Some(edge) = self.pool.get_slot_mut(slot.as_u32()) {
            edge.mutual = false;
        }
        if let Some(edge) = self.pool.get_slot_mut(reverse.as_u32()) {
            edge.mutual = false;
        }
        self.mutual_counts[type_index] -= 1;
        self.mutual_pairs -= 1;
        self.adjacency[source.index()].mutual_degree -= 1;
        self.adjacency[target.index()].mutual_degree -= 1;
    }

    /// Find a live parallel edge matching `key`, excluding `slot`
    fn find_parallel(&self, key: DictKey, slot: EdgeSlot) -> Option<EdgeSlot> {
        let scan = |node: u32| {
            self.adjacency_iter(
                NodeSlot::new(node),
                Direction::Out,
                Some(EdgeTypeId::new(key.type_id)),
            )
            .filter_map(|edge| {
                let candidate = edge.store_id()?;
                if candidate == slot {
                    return None;
                }
                let candidate_key = DictKey::new(
                    edge.source_slot,
                    edge.target_slot,
                    edge.type_id(),
                    edge.is_directed(),
                );
                (candidate_key == key).then_some(candidate)
            })
            .next()
        };
        // An undirected parallel edge may have been inserted with either
        // endpoint as its source, so both out-lists are candidates.
        scan(key.a).or_else(|| if key.a != key.b { scan(key.b) } else { None })
    }
}

fn grow_counts(counts: &mut Vec<usize>, width: usize) {
    if counts.len() < width {
        counts.resize(width, 0);
    }
}

fn grow_heads(heads: &mut Vec<Option<EdgeSlot>>, width: usize) {
    if heads.len() < width {
        heads.resize(width, None);
    }
}

/// Iterator over a node's incident edges
///
/// Walks the intrusive lists head-first. For `Direction::Both`, self-loops
/// are yielded once (from the out-list) even though they are members of
/// both lists.
pub struct AdjacencyIter<'a> {
    store: &'a EdgeStore,
    heads: std::vec::IntoIter<(Direction, EdgeSlot)>,
    current: Option<(Direction, EdgeSlot)>,
    skip_self_loops_in: bool,
}

impl<'a> Iterator for AdjacencyIter<'a> {
    type Item = &'a Edge;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (phase, slot) = match self.current.take() {
                Some(state) => state,
                None => self.heads.next()?,
            };
            let edge = self.store.get_slot(slot)?;
            let next = match phase {
                Direction::In => edge.links.next_in,
                _ => edge.links.next_out,
            };
            self.current = next.map(|slot| (phase, slot));

            if self.skip_self_loops_in && phase == Direction::In && edge.is_self_loop() {
                continue;
            }
            return Some(edge);
        }
    }
}
