//! kgchat entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the LLM provider and prompt set
//!   5. Run the console until quit or Ctrl-C

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use kgchat::composer::AnswerComposer;
use kgchat::error::AppError;
use kgchat::llm::providers;
use kgchat::prompt::PromptSet;
use kgchat::session::Session;
use kgchat::{config, console, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Optional file.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        log_level = %config.log_level,
        provider = %config.llm.provider,
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(format!("llm provider: {e}")))?;
    let prompts = PromptSet::load(&config.chat.prompts_dir);
    let composer = AnswerComposer::new(
        provider,
        prompts,
        config.llm.max_output_tokens,
        Duration::from_secs(config.llm.timeout_seconds),
    )
    .with_entity_max_output_tokens(config.llm.entity_max_output_tokens);
    let mut session = Session::new(config.graph, &config.chat, composer);

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    console::run(&mut session, tokio::io::stdin(), shutdown).await?;

    info!("kgchat stopped");
    Ok(())
}
