//! kgchat: an in-memory knowledge graph you can build, persist as node-link
//! JSON, and question through an LLM.

pub mod composer;
pub mod config;
pub mod console;
pub mod error;
pub mod graph;
pub mod llm;
pub mod logger;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod test_support;
