//! Application-wide error types.

use thiserror::Error;

use crate::composer::ComposeError;
use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("llm error: {0}")]
    Compose(#[from] ComposeError),
}
