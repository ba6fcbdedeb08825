//! Console channel: reads command lines, runs them against the [`Session`],
//! and prints the result to stdout.
//!
//! Runs until `quit`, end of input, or the `shutdown` token is cancelled
//! (Ctrl-C). Each line is handled to completion before the next is read.
//!
//! ```text
//! add <entity> | <relationship> | <entity>
//! merge <file.json> [<file.json> ...]
//! replace <file.json>
//! save [<file.json>]
//! query <entity>      facts + LLM answer about one entity
//! facts <entity>      facts only
//! show | clear | help | quit
//! <anything else>     chat question
//! ```
//!
//! A line that starts with a command word but does not have that command's
//! shape is a chat question: file arguments must end in `.json`, `add`
//! needs `|` separators, and a `query`/`facts` line ending in `?` is asked.

use std::path::PathBuf;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::graph::query;
use crate::session::Session;

pub const HELP: &str = "\
Commands:
  add <entity> | <relationship> | <entity>   add or overwrite a relationship
  merge <file.json> [<file.json> ...]       merge node-link JSON files into the graph
  replace <file.json>                       replace the graph with a node-link JSON file
  save [<file.json>]                        save the graph (default: configured save file)
  query <entity>                            ask the LLM what is related to an entity
  facts <entity>                            list an entity's relationships
  show                                      list every relationship
  clear                                     remove every entity and relationship
  help                                      this text
  quit                                      leave
Anything else is sent to the chat as a question.
File names are separated by spaces and must end in .json.";

const EMPTY_GRAPH: &str = "Add some relationships or load a JSON file to see the graph.";

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { source: String, relation: String, target: String },
    Merge(Vec<PathBuf>),
    Replace(PathBuf),
    Save(Option<PathBuf>),
    Query(String),
    Facts(String),
    Show,
    Clear,
    Help,
    Quit,
    Ask(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("usage: {0}")]
pub struct UsageError(pub String);

/// Parse one input line. Blank lines yield `None`.
///
/// `show`, `clear`, `help` and `quit` are commands only when they stand
/// alone; followed by more text the line is a chat question.
pub fn parse(line: &str) -> Result<Option<Command>, UsageError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match (word.to_lowercase().as_str(), rest.is_empty()) {
        ("add", true) => return Err(usage(ADD_USAGE)),
        ("add", false) if !rest.contains('|') => None,
        ("add", false) => {
            let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
            match parts.as_slice() {
                [source, relation, target]
                    if !source.is_empty() && !relation.is_empty() && !target.is_empty() =>
                {
                    Some(Command::Add {
                        source: source.to_string(),
                        relation: relation.to_string(),
                        target: target.to_string(),
                    })
                }
                _ => return Err(usage(ADD_USAGE)),
            }
        }
        ("merge", true) => return Err(usage(MERGE_USAGE)),
        ("merge", false) => json_paths(rest).map(Command::Merge),
        ("replace", true) => return Err(usage(REPLACE_USAGE)),
        ("replace", false) => match json_paths(rest) {
            Some(mut paths) if paths.len() == 1 => paths.pop().map(Command::Replace),
            Some(_) => return Err(usage(REPLACE_USAGE)),
            None => None,
        },
        ("save", true) => Some(Command::Save(None)),
        ("save", false) => match json_paths(rest) {
            Some(mut paths) if paths.len() == 1 => paths.pop().map(|p| Command::Save(Some(p))),
            Some(_) => return Err(usage(SAVE_USAGE)),
            None => None,
        },
        ("query", true) => return Err(usage("query <entity>")),
        ("facts", true) => return Err(usage("facts <entity>")),
        ("query" | "facts", false) if rest.ends_with('?') => None,
        ("query", false) => Some(Command::Query(rest.to_string())),
        ("facts", false) => Some(Command::Facts(rest.to_string())),
        ("show", true) => Some(Command::Show),
        ("clear", true) => Some(Command::Clear),
        ("help", true) => Some(Command::Help),
        ("quit" | "exit", true) => Some(Command::Quit),
        _ => None,
    };
    Ok(Some(command.unwrap_or_else(|| Command::Ask(line.to_string()))))
}

const ADD_USAGE: &str = "add <entity> | <relationship> | <entity> (fill all fields)";
const MERGE_USAGE: &str = "merge <file.json> [<file.json> ...]";
const REPLACE_USAGE: &str = "replace <file.json>";
const SAVE_USAGE: &str = "save [<file.json>]";

fn usage(text: &str) -> UsageError {
    UsageError(text.to_string())
}

/// Space-separated file arguments, or `None` unless every one ends in `.json`.
fn json_paths(rest: &str) -> Option<Vec<PathBuf>> {
    rest.split_whitespace()
        .map(|arg| {
            arg.to_ascii_lowercase()
                .ends_with(".json")
                .then(|| PathBuf::from(arg))
        })
        .collect()
}

/// Run one command. `Ok(None)` asks the console to stop.
pub async fn execute(session: &mut Session, command: Command) -> Result<Option<String>, AppError> {
    let text = match command {
        Command::Add { source, relation, target } => {
            session.add_relationship(&source, &relation, &target)?;
            format!("Added: {source} --[{relation}]--> {target}")
        }
        Command::Merge(paths) => {
            let added = session.merge_files(&paths)?;
            format!(
                "Graph merged successfully! Added {added} relationships. {}",
                session.summary()
            )
        }
        Command::Replace(path) => {
            session.replace_from_file(&path)?;
            format!("Graph replaced successfully! {}", session.summary())
        }
        Command::Save(path) => {
            let written = session.save(path.as_deref())?;
            format!("Graph saved to {}", written.display())
        }
        Command::Query(entity) => {
            let outcome = session.query_entity(&entity).await?;
            format!(
                "Retrieved Context: {}\nLLM Response: {}",
                outcome.context, outcome.response
            )
        }
        Command::Facts(entity) => {
            let facts = query::collect_facts(session.graph(), &entity)?;
            if facts.is_empty() {
                format!("{entity} has no relationships.")
            } else {
                facts.join("\n")
            }
        }
        Command::Show => render_graph(session),
        Command::Clear => {
            session.clear();
            "Graph cleared.".to_string()
        }
        Command::Help => format!(
            "{HELP}\nDefault save file: {}",
            session.default_save_path().display()
        ),
        Command::Quit => return Ok(None),
        Command::Ask(question) => session.chat(&question).await?.reply,
    };
    Ok(Some(text))
}

fn render_graph(session: &Session) -> String {
    let graph = session.graph();
    if graph.is_empty() {
        return EMPTY_GRAPH.to_string();
    }
    let arrow = if graph.is_directed() { "-->" } else { "---" };
    let mut lines = vec![session.summary()];
    lines.extend(
        graph
            .edges()
            .map(|e| format!("  {} --[{}]{arrow} {}", e.source, e.label, e.target)),
    );
    let isolated: Vec<&str> = graph
        .nodes()
        .filter(|n| graph.edges_touching(n).is_ok_and(|edges| edges.is_empty()))
        .collect();
    if !isolated.is_empty() {
        lines.push(format!("  unconnected: {}", isolated.join(", ")));
    }
    lines.join("\n")
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Drive the session from `input` until quit, end of input, or shutdown.
pub async fn run<R>(session: &mut Session, input: R, shutdown: CancellationToken) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    info!("console started, type `help` for commands");
    println!("─────────────────────────────────");
    println!(" kgchat console  (Ctrl-C to quit)");
    println!("─────────────────────────────────");

    let mut lines = BufReader::new(input).lines();

    loop {
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\n[console] shutdown signal received");
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("console read error: {e}");
                break;
            }
            Ok(None) => {
                info!("console input closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        let command = match parse(&input) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!(?command, "console command");

        let outcome = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\n[console] shutdown signal received");
                info!("console shutting down mid-action");
                break;
            }

            outcome = execute(session, command) => outcome,
        };

        match outcome {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "console action failed");
                println!("error: {e}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::composer::AnswerComposer;
    use crate::config::Config;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::llm::LlmProvider;
    use crate::prompt::PromptSet;

    fn session(dir: &TempDir) -> Session {
        let cfg = Config::test_default(dir.path());
        let composer = AnswerComposer::new(
            LlmProvider::Dummy(DummyProvider),
            PromptSet::default(),
            100,
            Duration::from_secs(1),
        );
        Session::new(cfg.graph, &cfg.chat, composer)
    }

    #[test]
    fn parses_add_with_pipes() {
        assert_eq!(
            parse("add Tom Hanks | starred_in | Forrest Gump").unwrap(),
            Some(Command::Add {
                source: "Tom Hanks".into(),
                relation: "starred_in".into(),
                target: "Forrest Gump".into(),
            })
        );
    }

    #[test]
    fn add_with_missing_field_is_usage_error() {
        assert!(parse("add Tom Hanks | | Forrest Gump").is_err());
        assert!(parse("add Tom Hanks | starred_in").is_err());
        assert!(parse("add").is_err());
    }

    #[test]
    fn parses_file_commands() {
        assert_eq!(
            parse("merge a.json b.json").unwrap(),
            Some(Command::Merge(vec![PathBuf::from("a.json"), PathBuf::from("b.json")]))
        );
        assert_eq!(parse("replace kg.json").unwrap(), Some(Command::Replace("kg.json".into())));
        assert_eq!(parse("save").unwrap(), Some(Command::Save(None)));
        assert_eq!(parse("save out.json").unwrap(), Some(Command::Save(Some("out.json".into()))));
        assert!(parse("merge").is_err());
        assert!(parse("replace").is_err());
        assert!(parse("replace a.json b.json").is_err());
        assert!(parse("save a.json b.json").is_err());
    }

    #[test]
    fn command_words_in_questions_are_chat() {
        for line in [
            "save me a seat, what did Tom Hanks star in?",
            "merge these two ideas for me",
            "replace the ending of Forrest Gump",
            "add some colour to the answer",
            "query what Tom Hanks starred in?",
            "facts about Forrest Gump?",
        ] {
            assert_eq!(parse(line).unwrap(), Some(Command::Ask(line.into())), "{line}");
        }
    }

    #[test]
    fn file_arguments_split_the_same_way() {
        assert_eq!(
            parse("merge films.JSON people.json").unwrap(),
            Some(Command::Merge(vec!["films.JSON".into(), "people.json".into()]))
        );
        assert_eq!(
            parse("merge films.json notes.txt").unwrap(),
            Some(Command::Ask("merge films.json notes.txt".into()))
        );
        assert_eq!(
            parse("replace  data/films.json ").unwrap(),
            Some(Command::Replace("data/films.json".into()))
        );
    }

    #[test]
    fn parses_keywords_and_questions() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("QUIT").unwrap(), Some(Command::Quit));
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(parse("query Tom Hanks").unwrap(), Some(Command::Query("Tom Hanks".into())));
        assert_eq!(
            parse("show me Tom Hanks films").unwrap(),
            Some(Command::Ask("show me Tom Hanks films".into()))
        );
        assert_eq!(
            parse("Who directed Forrest Gump?").unwrap(),
            Some(Command::Ask("Who directed Forrest Gump?".into()))
        );
    }

    #[tokio::test]
    async fn execute_reports_actions() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        let out = execute(&mut s, parse("show").unwrap().unwrap()).await.unwrap().unwrap();
        assert_eq!(out, EMPTY_GRAPH);

        let out = execute(&mut s, parse("add a | knows | b").unwrap().unwrap()).await.unwrap().unwrap();
        assert_eq!(out, "Added: a --[knows]--> b");

        let out = execute(&mut s, Command::Show).await.unwrap().unwrap();
        assert!(out.contains("a --[knows]--- b"));

        let out = execute(&mut s, Command::Facts("b".into())).await.unwrap().unwrap();
        assert_eq!(out, "a knows b");

        assert!(execute(&mut s, Command::Facts("zed".into())).await.is_err());
        let out = execute(&mut s, Command::Help).await.unwrap().unwrap();
        let default_save = dir.path().join("kg.json");
        assert!(out.ends_with(&format!("Default save file: {}", default_save.display())));

        assert_eq!(execute(&mut s, Command::Quit).await.unwrap(), None);
    }

    #[tokio::test]
    async fn run_processes_lines_until_quit() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let input: &[u8] = b"add a | knows | b\n\nadd b | likes\nquit\nadd c | knows | d\n";
        run(&mut s, input, CancellationToken::new()).await.unwrap();
        assert_eq!(s.graph().edge_count(), 1);
        assert!(!s.graph().has_node("c"));
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let input: &[u8] = b"add a | knows | b\n";
        run(&mut s, input, shutdown).await.unwrap();
        assert!(s.graph().is_empty());
    }
}
