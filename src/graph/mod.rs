//! Ego graph module: term graph storage, BFS construction and encoding.
//!
//! Expands a seed term through a suggestion source, level by level, bounded
//! by a depth limit and a cumulative distance budget.

mod builder;
mod format;
mod store;

pub use builder::{
    BuildOutcome, BuildParameters, BuildResult, GraphBuilder, DEFAULT_BUILD_TIMEOUT,
    DEFAULT_DEPTH, DEFAULT_FORMAT, DEFAULT_PATTERN, DEFAULT_RADIUS,
};
pub use format::{encode, GraphFormat};
pub use store::{Edge, Graph, Node};
