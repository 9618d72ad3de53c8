//! In-memory term graph: insertion-ordered nodes and edges with
//! undirected pair lookup.

use std::collections::HashMap;

use serde::Serialize;

/// A term in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// The term itself; unique within a graph.
    pub id: String,
    /// Number of times the term was reached.
    pub count: u32,
    /// BFS level at which the term was first discovered (seed = 0).
    pub depth: u32,
}

/// A directed edge between two terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Cumulative distance of `target` from the seed when the edge was created.
    pub distance: u32,
    /// Rank-derived score, accumulated on rediscovery.
    pub weight: u32,
    /// Label such as `"a vs b"`.
    pub query: String,
}

/// Order-independent key for a pair of terms.
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Node and edge storage.
///
/// Nodes are keyed by term, edges by the unordered term pair, so at most one
/// edge exists between any two terms regardless of direction. Iteration
/// follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<(String, String), usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Insert a node with `count = 1` if the term is absent.
    ///
    /// Returns `true` when a new node was created.
    pub fn insert_node(&mut self, id: &str, depth: u32) -> bool {
        if self.node_index.contains_key(id) {
            return false;
        }
        self.node_index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            count: 1,
            depth,
        });
        true
    }

    /// Bump the visit count of an existing node. Returns the new count.
    pub fn increment_count(&mut self, id: &str) -> Option<u32> {
        let i = *self.node_index.get(id)?;
        let node = &mut self.nodes[i];
        node.count += 1;
        Some(node.count)
    }

    /// Edge between `a` and `b` in either direction.
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edge_index.get(&pair_key(a, b)).map(|&i| &self.edges[i])
    }

    pub fn edge_between_mut(&mut self, a: &str, b: &str) -> Option<&mut Edge> {
        let i = *self.edge_index.get(&pair_key(a, b))?;
        Some(&mut self.edges[i])
    }

    /// Insert an edge unless one already joins the same pair of terms.
    ///
    /// Returns `true` when the edge was inserted.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        let key = pair_key(&edge.source, &edge.target);
        if self.edge_index.contains_key(&key) {
            return false;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(edge);
        true
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Largest edge weight, `None` for a graph without edges.
    pub fn max_weight(&self) -> Option<u32> {
        self.edges.iter().map(|e| e.weight).max()
    }
}
