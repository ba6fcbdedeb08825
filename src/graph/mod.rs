//! In-memory knowledge graph.
//!
//! - **store**: [`GraphStore`], label-keyed nodes, one labelled edge per
//!   node pair, insertion-ordered traversal.
//! - **codec**: node-link JSON documents (encode, decode, merge, replace,
//!   and file helpers).
//! - **query**: fact collection for one entity and question-driven search.

pub mod codec;
pub mod query;
pub mod store;

use thiserror::Error;

pub use codec::{DecodePolicy, LinkEntry, NodeEntry, NodeLinkDocument};
pub use query::SearchResult;
pub use store::{Directedness, Edge, GraphStore, Neighbor};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GraphError {
    /// A traversal referenced a node that is not in the graph.
    #[error("node not found: {0}")]
    NotFound(String),

    /// A fact query referenced an entity that is not in the graph.
    #[error("entity not found in graph: {0}")]
    EntityNotFound(String),

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// Persistence input does not have the node-link shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("graph file error: {0}")]
    Io(#[from] std::io::Error),
}
