//! `GraphStore`: attributed graph keyed by node label.
//!
//! Nodes carry no data beyond their label. Each node pair holds at most one
//! edge; adding another edge between the same pair replaces the stored label
//! (and, for undirected graphs, the stored orientation) in place, keeping the
//! edge's original insertion slot.
//!
//! ## Layout
//! ```text
//! adjacency: label -> [edge index, ...]    (node insertion order)
//! edges:     pair key -> Edge               (edge insertion order)
//! ```
//! The pair key is `(source, target)` for directed graphs and the sorted pair
//! for undirected ones. Edge indices are stable because edges are only ever
//! removed all at once by [`GraphStore::clear`].

use std::fmt;

use indexmap::IndexMap;

use super::GraphError;

/// Whether `neighbors` follows edges in one direction or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directedness {
    Directed,
    #[default]
    Undirected,
}

impl Directedness {
    pub fn is_directed(self) -> bool {
        matches!(self, Directedness::Directed)
    }
}

impl From<bool> for Directedness {
    fn from(directed: bool) -> Self {
        if directed {
            Directedness::Directed
        } else {
            Directedness::Undirected
        }
    }
}

/// A stored relationship. `source` and `target` keep the orientation of the
/// call that last wrote this pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Renders the edge as a fact: `"{source} {label} {target}"`.
impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.source, self.label, self.target)
    }
}

/// One entry of [`GraphStore::neighbors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub node: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    directedness: Directedness,
    adjacency: IndexMap<String, Vec<usize>>,
    edges: IndexMap<(String, String), Edge>,
}

impl GraphStore {
    pub fn new(directedness: Directedness) -> Self {
        Self {
            directedness,
            adjacency: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn directed() -> Self {
        Self::new(Directedness::Directed)
    }

    pub fn undirected() -> Self {
        Self::new(Directedness::Undirected)
    }

    pub fn directedness(&self) -> Directedness {
        self.directedness
    }

    pub fn is_directed(&self) -> bool {
        self.directedness.is_directed()
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Insert a node if absent. Returns `true` when the node is new.
    pub fn add_node(&mut self, label: &str) -> Result<bool, GraphError> {
        if label.trim().is_empty() {
            return Err(GraphError::InvalidNode("node label must not be empty".into()));
        }
        if self.adjacency.contains_key(label) {
            return Ok(false);
        }
        self.adjacency.insert(label.to_string(), Vec::new());
        Ok(true)
    }

    /// Insert or overwrite the edge between `source` and `target`.
    ///
    /// Missing endpoints are created (source first). Repeating an identical
    /// call is a no-op. Empty fields are rejected and leave the graph as-is.
    pub fn add_edge(&mut self, source: &str, target: &str, label: &str) -> Result<(), GraphError> {
        for (field, value) in [("source", source), ("target", target), ("label", label)] {
            if value.trim().is_empty() {
                return Err(GraphError::InvalidEdge(format!("{field} must not be empty")));
            }
        }

        let edge = Edge {
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
        };
        let key = self.pair_key(source, target);

        if let Some(existing) = self.edges.get_mut(&key) {
            *existing = edge;
            return Ok(());
        }

        self.add_node(source)?;
        self.add_node(target)?;
        let (index, _) = self.edges.insert_full(key, edge);
        self.touch(source, index);
        if source != target {
            self.touch(target, index);
        }
        Ok(())
    }

    /// Drop every node and edge. Directedness is kept.
    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.edges.clear();
    }

    fn touch(&mut self, node: &str, index: usize) {
        if let Some(indices) = self.adjacency.get_mut(node) {
            indices.push(index);
        }
    }

    fn pair_key(&self, source: &str, target: &str) -> (String, String) {
        if self.is_directed() || source <= target {
            (source.to_string(), target.to_string())
        } else {
            (target.to_string(), source.to_string())
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.adjacency.contains_key(key)
    }

    /// Node labels in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Label of the edge between `a` and `b`, if any. Order matters only for
    /// directed graphs.
    pub fn edge_label(&self, a: &str, b: &str) -> Option<&str> {
        self.edges
            .get(&self.pair_key(a, b))
            .map(|edge| edge.label.as_str())
    }

    /// Every edge with `key` as an endpoint, in both directions, in
    /// insertion order.
    pub fn edges_touching(&self, key: &str) -> Result<Vec<&Edge>, GraphError> {
        let indices = self
            .adjacency
            .get(key)
            .ok_or_else(|| GraphError::NotFound(key.to_string()))?;
        Ok(indices
            .iter()
            .filter_map(|&index| self.edges.get_index(index).map(|(_, edge)| edge))
            .collect())
    }

    /// Adjacent nodes with the connecting edge's label.
    ///
    /// Directed graphs report only edges leaving `key`; undirected graphs
    /// report every touching edge. A self-loop is reported once.
    pub fn neighbors(&self, key: &str) -> Result<Vec<Neighbor>, GraphError> {
        let touching = self.edges_touching(key)?;
        let neighbors = touching
            .into_iter()
            .filter_map(|edge| {
                let node = if edge.source == key {
                    &edge.target
                } else if self.is_directed() {
                    return None;
                } else {
                    &edge.source
                };
                Some(Neighbor {
                    node: node.clone(),
                    label: edge.label.clone(),
                })
            })
            .collect();
        Ok(neighbors)
    }
}
