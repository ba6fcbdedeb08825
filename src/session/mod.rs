//! One user session: the current graph, the chat transcript, and an action
//! method for every console command.
//!
//! Actions run one at a time through `&mut Session`; there is no shared or
//! global graph. A failed action leaves the graph exactly as it was.

pub mod transcript;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::composer::AnswerComposer;
use crate::config::{ChatConfig, GraphConfig};
use crate::error::AppError;
use crate::graph::{codec, query, GraphStore};

pub use transcript::{Role, Transcript, TranscriptEntry};

/// Result of [`Session::query_entity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub entity: String,
    pub context: String,
    pub response: String,
}

/// Result of [`Session::chat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Entities recognised in the question.
    pub seeds: Vec<String>,
    pub context: String,
    pub reply: String,
}

pub struct Session {
    graph: GraphStore,
    config: GraphConfig,
    composer: AnswerComposer,
    transcript: Transcript,
    history_window: usize,
}

impl Session {
    pub fn new(config: GraphConfig, chat: &ChatConfig, composer: AnswerComposer) -> Self {
        Self {
            graph: GraphStore::new(config.directedness),
            config,
            composer,
            transcript: Transcript::new(chat.transcript_cap),
            history_window: chat.history_window,
        }
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn default_save_path(&self) -> &Path {
        &self.config.save_file
    }

    // ── Graph actions ─────────────────────────────────────────────────────────

    pub fn add_relationship(&mut self, source: &str, relation: &str, target: &str) -> Result<(), AppError> {
        self.graph.add_edge(source, target, relation)?;
        info!(%source, %relation, %target, "relationship added");
        Ok(())
    }

    /// Merge every file into the current graph. All files are applied or
    /// none are. Returns the total number of edges the files contributed.
    pub fn merge_files(&mut self, paths: &[PathBuf]) -> Result<usize, AppError> {
        let mut staged = self.graph.clone();
        let mut total = 0;
        for path in paths {
            let doc = codec::read_file(path)?;
            let added = codec::merge(&mut staged, &doc, self.config.decode_policy)?;
            debug!(path = %path.display(), edges = added, "merged file");
            total += added;
        }
        self.graph = staged;
        info!(
            files = paths.len(),
            edges = total,
            nodes = self.graph.node_count(),
            "graph merged"
        );
        Ok(total)
    }

    /// Swap the current graph for the contents of `path`.
    pub fn replace_from_file(&mut self, path: &Path) -> Result<(), AppError> {
        let doc = codec::read_file(path)?;
        let graph = codec::replace(&doc, self.config.decode_policy, self.config.directedness)?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph replaced"
        );
        self.graph = graph;
        Ok(())
    }

    /// Write the graph to `path`, or to the configured save file.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, AppError> {
        let target = path.unwrap_or(self.config.save_file.as_path()).to_path_buf();
        codec::save_file(&self.graph, &target)?;
        Ok(target)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        info!("graph cleared");
    }

    /// One-line description: entity and relationship counts.
    pub fn summary(&self) -> String {
        let kind = if self.graph.is_directed() { "directed" } else { "undirected" };
        format!(
            "{} entities, {} relationships ({kind})",
            self.graph.node_count(),
            self.graph.edge_count()
        )
    }

    // ── Query actions ─────────────────────────────────────────────────────────

    /// Collect the facts around `entity` and ask the LLM what relates to it.
    pub async fn query_entity(&self, entity: &str) -> Result<QueryOutcome, AppError> {
        let facts = query::collect_facts(&self.graph, entity)?;
        let context = query::render_context(&facts);
        debug!(%entity, facts = facts.len(), "entity context collected");
        let response = self.composer.generate_for_entity(&context, entity).await?;
        Ok(QueryOutcome {
            entity: entity.to_string(),
            context,
            response,
        })
    }

    /// Answer a free-form question from facts about the entities it mentions.
    ///
    /// The question is recorded before the LLM call; the answer only when the
    /// call succeeds.
    pub async fn chat(&mut self, question: &str) -> Result<ChatReply, AppError> {
        let history = self.transcript.render_last(self.history_window);
        self.transcript.append(Role::User, question);

        let found = query::search(&self.graph, question, self.config.search_seeds);
        let context = query::render_fact_list(&found.facts);
        debug!(seeds = ?found.seeds, facts = found.facts.len(), "chat context collected");

        let reply = self.composer.generate_turn(&context, question, &history).await?;
        self.transcript.append(Role::Assistant, reply.as_str());

        Ok(ChatReply {
            seeds: found.seeds,
            context,
            reply,
        })
    }
}
