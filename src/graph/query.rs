//! Fact retrieval over a [`GraphStore`].
//!
//! A fact is one edge rendered in its stored direction:
//! `"{source} {label} {target}"`, whichever side the queried entity is on.

use indexmap::IndexSet;

use super::store::GraphStore;
use super::GraphError;

/// Context used when a question mentions no known entity.
pub const NO_KNOWLEDGE: &str = "No relevant knowledge found in graph.";

/// Facts for every edge touching `entity`, in edge insertion order.
///
/// Incoming edges count as facts in directed graphs too.
pub fn collect_facts(graph: &GraphStore, entity: &str) -> Result<Vec<String>, GraphError> {
    if !graph.has_node(entity) {
        return Err(GraphError::EntityNotFound(entity.to_string()));
    }
    let edges = graph.edges_touching(entity)?;
    Ok(edges.into_iter().map(ToString::to_string).collect())
}

/// Join facts with a single space for inclusion in a prompt.
pub fn render_context(facts: &[String]) -> String {
    facts.join(" ")
}

/// One `- fact` line per fact, or [`NO_KNOWLEDGE`] when there are none.
pub fn render_fact_list(facts: &[String]) -> String {
    if facts.is_empty() {
        return NO_KNOWLEDGE.to_string();
    }
    facts
        .iter()
        .map(|fact| format!("- {fact}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result of [`search`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Node labels found in the question, longest first.
    pub seeds: Vec<String>,
    /// Facts touching any seed, deduplicated in first-seen order.
    pub facts: Vec<String>,
}

/// Find entities mentioned in `question` and collect their facts.
///
/// A node matches when its label occurs in the question case-insensitively
/// with no letter or digit directly on either side. Longer labels are
/// preferred; at most `max_seeds` seeds are used.
pub fn search(graph: &GraphStore, question: &str, max_seeds: usize) -> SearchResult {
    let haystack = question.to_lowercase();

    let mut seeds: Vec<&str> = graph
        .nodes()
        .filter(|label| contains_phrase(&haystack, &label.to_lowercase()))
        .collect();
    seeds.sort_by_key(|label| std::cmp::Reverse(label.chars().count()));
    seeds.truncate(max_seeds);

    let mut facts = IndexSet::new();
    for seed in &seeds {
        if let Ok(found) = collect_facts(graph, seed) {
            facts.extend(found);
        }
    }

    SearchResult {
        seeds: seeds.into_iter().map(str::to_string).collect(),
        facts: facts.into_iter().collect(),
    }
}

fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.trim().is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
        let before = haystack[..begin].chars().next_back();
        let after = haystack[end..].chars().next();
        if before.is_none_or(|c| !c.is_alphanumeric()) && after.is_none_or(|c| !c.is_alphanumeric()) {
            return true;
        }
        start = begin + needle.chars().next().map_or(1, char::len_utf8);
    }
    false
}
