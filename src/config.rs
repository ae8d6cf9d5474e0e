//! Store construction options

use serde::{Deserialize, Serialize};

/// Which edge kinds a store accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeKinds {
    /// Only directed edges
    Directed,
    /// Only undirected edges
    Undirected,
    /// Both directed and undirected edges in the same store
    #[default]
    Mixed,
}

/// Configuration for a [`GraphStore`](crate::graph::GraphStore)
///
/// All options are fixed at store construction. The defaults match the
/// common case: a mixed graph that rejects parallel edges of the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Allow several edges of the same type between the same pair of nodes
    pub allow_parallel_edges_same_type: bool,

    /// Edge kinds accepted by the store
    pub edge_kinds: EdgeKinds,

    /// Slots per pool block. Clamped to `64..=65536` (block offsets are
    /// stored as `u16`).
    pub block_size: usize,
}

impl Config {
    pub const DEFAULT_BLOCK_SIZE: usize = 5000;

    pub fn new() -> Self {
        Config {
            allow_parallel_edges_same_type: false,
            edge_kinds: EdgeKinds::Mixed,
            block_size: Self::DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_parallel_edges(mut self, allow: bool) -> Self {
        self.allow_parallel_edges_same_type = allow;
        self
    }

    pub fn with_edge_kinds(mut self, kinds: EdgeKinds) -> Self {
        self.edge_kinds = kinds;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.clamp(64, 65536);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.allow_parallel_edges_same_type);
        assert_eq!(config.edge_kinds, EdgeKinds::Mixed);
        assert_eq!(config.block_size, Config::DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn test_block_size_clamped() {
        let config = Config::new().with_block_size(2);
        assert_eq!(config.block_size, 64);

        let config = Config::new().with_block_size(1 << 20);
        assert_eq!(config.block_size, 65536);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_parallel_edges(true)
            .with_edge_kinds(EdgeKinds::Directed);
        assert!(config.allow_parallel_edges_same_type);
        assert_eq!(config.edge_kinds, EdgeKinds::Directed);
    }
}
