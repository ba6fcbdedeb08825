//! Node-link JSON persistence.
//!
//! The document shape is the networkx node-link convention with the edge list
//! stored under `links`:
//!
//! ```json
//! {
//!   "directed": false,
//!   "multigraph": false,
//!   "graph": {},
//!   "nodes": [{"id": "Tom Hanks"}, {"id": "Forrest Gump"}],
//!   "links": [{"source": "Tom Hanks", "target": "Forrest Gump", "label": "starred_in"}]
//! }
//! ```
//!
//! `nodes` and `links` are required on input; `directed`, `multigraph` and
//! `graph` are optional. Unknown keys on nodes and links are ignored, so
//! files written by networkx with extra attributes still load.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::{Directedness, GraphStore};
use super::GraphError;

// ── Document types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directed: Option<bool>,
    #[serde(default)]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// How `decode` treats a link whose endpoint is missing from `nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Reject the document.
    Strict,
    /// Create the endpoint as a node.
    #[default]
    Lenient,
}

impl FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(DecodePolicy::Strict),
            "lenient" => Ok(DecodePolicy::Lenient),
            other => Err(format!("unknown decode policy '{other}' (expected \"strict\" or \"lenient\")")),
        }
    }
}

// ── Graph <-> document ────────────────────────────────────────────────────────

/// Snapshot `graph` as a document. Nodes and links keep insertion order.
pub fn encode(graph: &GraphStore) -> NodeLinkDocument {
    NodeLinkDocument {
        directed: Some(graph.is_directed()),
        multigraph: false,
        graph: serde_json::Map::new(),
        nodes: graph
            .nodes()
            .map(|id| NodeEntry { id: id.to_string() })
            .collect(),
        links: graph
            .edges()
            .map(|edge| LinkEntry {
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
            })
            .collect(),
    }
}

/// Build a fresh graph from `doc`.
///
/// The document's `directed` flag wins; `fallback` applies when it is absent.
pub fn decode(
    doc: &NodeLinkDocument,
    policy: DecodePolicy,
    fallback: Directedness,
) -> Result<GraphStore, GraphError> {
    if doc.multigraph {
        return Err(GraphError::MalformedDocument(
            "multigraph documents are not supported".into(),
        ));
    }

    let directedness = doc.directed.map(Directedness::from).unwrap_or(fallback);
    let mut graph = GraphStore::new(directedness);

    for (i, node) in doc.nodes.iter().enumerate() {
        graph
            .add_node(&node.id)
            .map_err(|e| GraphError::MalformedDocument(format!("nodes[{i}]: {e}")))?;
    }

    for (i, link) in doc.links.iter().enumerate() {
        if policy == DecodePolicy::Strict {
            for endpoint in [&link.source, &link.target] {
                if !graph.has_node(endpoint) {
                    return Err(GraphError::MalformedDocument(format!(
                        "links[{i}] references undeclared node '{endpoint}'"
                    )));
                }
            }
        }
        graph
            .add_edge(&link.source, &link.target, &link.label)
            .map_err(|e| GraphError::MalformedDocument(format!("links[{i}]: {e}")))?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        directed = graph.is_directed(),
        "decoded node-link document"
    );
    Ok(graph)
}

/// Add every node and edge of `doc` to `into`.
///
/// The document is decoded in full before `into` is touched, so a malformed
/// document leaves it unchanged. Existing edges are never removed; a pair
/// already present takes the document's label. Returns the number of edges
/// the document contributed.
pub fn merge(
    into: &mut GraphStore,
    doc: &NodeLinkDocument,
    policy: DecodePolicy,
) -> Result<usize, GraphError> {
    let loaded = decode(doc, policy, into.directedness())?;
    for node in loaded.nodes() {
        into.add_node(node)?;
    }
    for edge in loaded.edges() {
        into.add_edge(&edge.source, &edge.target, &edge.label)?;
    }
    Ok(loaded.edge_count())
}

/// Decode `doc` into a graph that supersedes whatever the caller held.
pub fn replace(
    doc: &NodeLinkDocument,
    policy: DecodePolicy,
    fallback: Directedness,
) -> Result<GraphStore, GraphError> {
    decode(doc, policy, fallback)
}

// ── Bytes / files ─────────────────────────────────────────────────────────────

pub fn from_slice(bytes: &[u8]) -> Result<NodeLinkDocument, GraphError> {
    serde_json::from_slice(bytes).map_err(|e| GraphError::MalformedDocument(e.to_string()))
}

pub fn from_str(text: &str) -> Result<NodeLinkDocument, GraphError> {
    serde_json::from_str(text).map_err(|e| GraphError::MalformedDocument(e.to_string()))
}

pub fn to_string_pretty(doc: &NodeLinkDocument) -> Result<String, GraphError> {
    serde_json::to_string_pretty(doc).map_err(|e| GraphError::MalformedDocument(e.to_string()))
}

/// Read and parse a node-link file.
pub fn read_file(path: &Path) -> Result<NodeLinkDocument, GraphError> {
    let bytes = fs::read(path)?;
    from_slice(&bytes).map_err(|e| match e {
        GraphError::MalformedDocument(msg) => {
            GraphError::MalformedDocument(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Encode `graph` and write it to `path`, creating parent directories.
pub fn save_file(graph: &GraphStore, path: &Path) -> Result<(), GraphError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let text = to_string_pretty(&encode(graph))?;
    fs::write(path, text)?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph saved"
    );
    Ok(())
}
