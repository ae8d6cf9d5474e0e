//! Lifecycle of non-main views
//!
//! View ids are recycled with the same discipline as pool slots. The
//! registry also fans structural store mutations out to every live view so
//! bitsets and statistics stay consistent.

use super::view::GraphView;
use crate::error::{GraphError, GraphResult};
use crate::graph::edge_store::EdgeStore;
use crate::graph::node_store::NodeStore;
use crate::graph::types::{EdgeSlot, NodeSlot, ViewId};
use crate::hooks::Hooks;

/// Registry of live views
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: Vec<Option<GraphView>>,
    garbage: Vec<u32>,
    len: usize,
}

impl ViewRegistry {
    pub fn new() -> Self {
        ViewRegistry::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: ViewId) -> bool {
        matches!(self.views.get(id.index()), Some(Some(_)))
    }

    pub(crate) fn create(&mut self, node_view: bool, edge_view: bool) -> ViewId {
        let id = self.allocate();
        self.views[id.index()] = Some(GraphView::new(id, node_view, edge_view));
        self.len += 1;
        id
    }

    /// Register a copy of an existing view under a fresh id
    pub(crate) fn insert_copy(&mut self, mut view: GraphView) -> ViewId {
        let id = self.allocate();
        view.id = id;
        self.views[id.index()] = Some(view);
        self.len += 1;
        id
    }

    pub(crate) fn destroy(&mut self, id: ViewId) -> GraphResult<GraphView> {
        let slot = self
            .views
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::ViewNotFound(id))?;
        self.garbage.push(id.0);
        self.len -= 1;
        Ok(slot)
    }

    pub(crate) fn get(&self, id: ViewId) -> GraphResult<&GraphView> {
        self.views
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::ViewNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: ViewId) -> GraphResult<&mut GraphView> {
        self.views
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::ViewNotFound(id))
    }

    /// Mutable view plus a second, distinct view for set algebra
    pub(crate) fn pair_mut(
        &mut self,
        target: ViewId,
        other: ViewId,
    ) -> GraphResult<(&mut GraphView, &GraphView)> {
        if !self.contains(target) {
            return Err(GraphError::ViewNotFound(target));
        }
        if !self.contains(other) {
            return Err(GraphError::ViewNotFound(other));
        }
        let (a, b) = (target.index(), other.index());
        // Callers short-circuit same-view algebra before reaching here.
        if a == b {
            return Err(GraphError::ViewNotFound(other));
        }
        if a < b {
            let (left, right) = self.views.split_at_mut(b);
            match (left[a].as_mut(), right[0].as_ref()) {
                (Some(target), Some(other)) => Ok((target, other)),
                _ => Err(GraphError::ViewNotFound(target)),
            }
        } else {
            let (left, right) = self.views.split_at_mut(a);
            match (right[0].as_mut(), left[b].as_ref()) {
                (Some(target), Some(other)) => Ok((target, other)),
                _ => Err(GraphError::ViewNotFound(target)),
            }
        }
    }

    /// Fan-out: an edge is leaving the store
    pub(crate) fn fan_out_edge_removed(
        &mut self,
        slot: EdgeSlot,
        edges: &EdgeStore,
        hooks: &mut Hooks<'_>,
    ) {
        for view in self.views.iter_mut().flatten() {
            view.store_edge_removed(slot, edges, hooks);
        }
    }

    /// Fan-out: a node is leaving the store (incident edges already gone)
    pub(crate) fn fan_out_node_removed(
        &mut self,
        slot: NodeSlot,
        nodes: &NodeStore,
        hooks: &mut Hooks<'_>,
    ) {
        for view in self.views.iter_mut().flatten() {
            view.store_node_removed(slot, nodes, hooks);
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut GraphView> {
        self.views.iter_mut().flatten()
    }

    fn allocate(&mut self) -> ViewId {
        match self.garbage.pop() {
            Some(recycled) => ViewId::new(recycled),
            None => {
                self.views.push(None);
                ViewId::new((self.views.len() - 1) as u32)
            }
        }
    }
}
