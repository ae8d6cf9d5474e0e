//! Subgraph views: bitset overlays, set algebra, and decorators

pub mod decorator;
pub mod registry;
pub mod view;

pub use decorator::{Subgraph, ViewMut};
pub use registry::ViewRegistry;
pub use view::{GraphView, Interval};
