//! Collaborator hook surface
//!
//! Attribute columns, time indices, and spatial indices maintain per-view
//! shadow structures. The store calls these hooks synchronously, under the
//! write path, whenever an element's membership in a non-main view changes.
//! Collaborators poll the store and view version counters for everything
//! else.

use crate::graph::types::{EdgeId, NodeId, ViewId};

/// Callbacks for collaborator indices
///
/// All methods default to no-ops so collaborators implement only what they
/// track. `index_view` is the wholesale path: it is invoked when a view is
/// first materialized (fill, copy) and after operations that change
/// virtually every element's membership (complement), instead of one
/// element-wise call per member.
pub trait ViewIndexHooks {
    fn index_node_in_view(&mut self, _node: NodeId, _view: ViewId) {}

    fn clear_node_in_view(&mut self, _node: NodeId, _view: ViewId) {}

    fn index_edge_in_view(&mut self, _edge: EdgeId, _view: ViewId) {}

    fn clear_edge_in_view(&mut self, _edge: EdgeId, _view: ViewId) {}

    fn index_view(&mut self, _view: ViewId) {}
}

/// Internal dispatch wrapper; `None` when no collaborator is registered
pub(crate) struct Hooks<'a>(pub Option<&'a mut (dyn ViewIndexHooks + Send + Sync + 'static)>);

impl Hooks<'_> {
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    pub fn index_node(&mut self, node: NodeId, view: ViewId) {
        if let Some(hooks) = self.0.as_deref_mut() {
            hooks.index_node_in_view(node, view);
        }
    }

    pub fn clear_node(&mut self, node: NodeId, view: ViewId) {
        if let Some(hooks) = self.0.as_deref_mut() {
            hooks.clear_node_in_view(node, view);
        }
    }

    pub fn index_edge(&mut self, edge: EdgeId, view: ViewId) {
        if let Some(hooks) = self.0.as_deref_mut() {
            hooks.index_edge_in_view(edge, view);
        }
    }

    pub fn clear_edge(&mut self, edge: EdgeId, view: ViewId) {
        if let Some(hooks) = self.0.as_deref_mut() {
            hooks.clear_edge_in_view(edge, view);
        }
    }

    pub fn index_view(&mut self, view: ViewId) {
        if let Some(hooks) = self.0.as_deref_mut() {
            hooks.index_view(view);
        }
    }
}
