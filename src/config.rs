//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `KGCHAT_CONFIG`), then applies `KGCHAT_WORK_DIR` and
//! `KGCHAT_LOG_LEVEL` env overrides. The LLM API key comes only from
//! `LLM_API_KEY`.

use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::graph::{DecodePolicy, Directedness};

/// In-memory graph configuration. Populated from `[graph]`.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Whether `neighbors` follows edges one way or both.
    pub directedness: Directedness,
    /// Default target of `save`, already resolved against `work_dir`.
    pub save_file: PathBuf,
    /// Treatment of links to undeclared nodes when loading files.
    pub decode_policy: DecodePolicy,
    /// Maximum entities matched from a chat question.
    pub search_seeds: usize,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (e.g. `"dummy"`, `"openai"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    /// Output cap for answers and chat turns.
    pub max_output_tokens: u32,
    /// Output cap for entity queries (`query <entity>`).
    pub entity_max_output_tokens: u32,
    /// Upper bound on one answer, transport included.
    pub timeout_seconds: u64,
    pub openai: OpenAiConfig,
}

/// Chat session configuration. Populated from `[chat]`.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Directory holding the prompt templates.
    pub prompts_dir: PathBuf,
    /// Maximum transcript entries kept (user and assistant turns).
    pub transcript_cap: usize,
    /// Most recent transcript entries injected into a chat prompt.
    pub history_window: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub graph: GraphConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    /// API key from `LLM_API_KEY` env var: `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    session: RawSession,
    #[serde(default)]
    graph: RawGraph,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    chat: RawChat,
}

#[derive(Deserialize)]
struct RawSession {
    name: String,
    work_dir: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawGraph {
    #[serde(default)]
    directed: bool,
    #[serde(default = "default_save_file")]
    save_file: String,
    #[serde(default = "default_decode_policy")]
    decode_policy: String,
    #[serde(default = "default_search_seeds")]
    search_seeds: usize,
}

impl Default for RawGraph {
    fn default() -> Self {
        Self {
            directed: false,
            save_file: default_save_file(),
            decode_policy: default_decode_policy(),
            search_seeds: default_search_seeds(),
        }
    }
}

fn default_save_file() -> String { "kg.json".to_string() }
fn default_decode_policy() -> String { "lenient".to_string() }
fn default_search_seeds() -> usize { 5 }

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default = "default_max_output_tokens")]
    max_output_tokens: u32,
    #[serde(default = "default_entity_max_output_tokens")]
    entity_max_output_tokens: u32,
    #[serde(default = "default_answer_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            max_output_tokens: default_max_output_tokens(),
            entity_max_output_tokens: default_entity_max_output_tokens(),
            timeout_seconds: default_answer_timeout_seconds(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_llm_provider() -> String { "dummy".to_string() }
fn default_max_output_tokens() -> u32 { 300 }
fn default_entity_max_output_tokens() -> u32 { 100 }
fn default_answer_timeout_seconds() -> u64 { 30 }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }

#[derive(Deserialize)]
struct RawChat {
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
    #[serde(default = "default_transcript_cap")]
    transcript_cap: usize,
    #[serde(default = "default_history_window")]
    history_window: usize,
}

impl Default for RawChat {
    fn default() -> Self {
        Self {
            prompts_dir: default_prompts_dir(),
            transcript_cap: default_transcript_cap(),
            history_window: default_history_window(),
        }
    }
}

fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_transcript_cap() -> usize { 200 }
fn default_history_window() -> usize { 20 }

/// Load config from `KGCHAT_CONFIG` or `config/default.toml`, then apply
/// env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("KGCHAT_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let work_dir_override = env::var("KGCHAT_WORK_DIR").ok();
    let log_level_override = env::var("KGCHAT_LOG_LEVEL").ok();
    load_from(
        Path::new(&path),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let s = parsed.session;

    let work_dir_str = work_dir_override.unwrap_or(&s.work_dir).to_string();
    let work_dir = expand_home(&work_dir_str);
    let log_level = log_level_override.unwrap_or(&s.log_level).to_string();

    let decode_policy = parsed
        .graph
        .decode_policy
        .parse::<DecodePolicy>()
        .map_err(|e| AppError::Config(format!("[graph] {e}")))?;

    let save_file = resolve_under(&work_dir, &parsed.graph.save_file);

    Ok(Config {
        name: s.name,
        work_dir,
        log_level,
        graph: GraphConfig {
            directedness: Directedness::from(parsed.graph.directed),
            save_file,
            decode_policy,
            search_seeds: parsed.graph.search_seeds,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            max_output_tokens: parsed.llm.max_output_tokens,
            entity_max_output_tokens: parsed.llm.entity_max_output_tokens,
            timeout_seconds: parsed.llm.timeout_seconds,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        chat: ChatConfig {
            prompts_dir: expand_home(&parsed.chat.prompts_dir),
            transcript_cap: parsed.chat.transcript_cap,
            history_window: parsed.chat.history_window,
        },
        llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Expand `~`, then anchor relative paths at `base`.
fn resolve_under(base: &Path, path: &str) -> PathBuf {
    let expanded = expand_home(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl LlmConfig {
    /// Dummy provider, short timeouts, no external calls.
    pub fn test_default() -> Self {
        Self {
            provider: "dummy".into(),
            max_output_tokens: 100,
            entity_max_output_tokens: 50,
            timeout_seconds: 1,
            openai: OpenAiConfig {
                api_base_url: "http://localhost:0/v1/chat/completions".into(),
                model: "test-model".into(),
                temperature: 0.0,
                timeout_seconds: 1,
            },
        }
    }
}

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests: dummy LLM, no API keys, no external calls.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            graph: GraphConfig {
                directedness: Directedness::Undirected,
                save_file: work_dir.join("kg.json"),
                decode_policy: DecodePolicy::Lenient,
                search_seeds: 5,
            },
            llm: LlmConfig::test_default(),
            chat: ChatConfig {
                prompts_dir: work_dir.join("prompts"),
                transcript_cap: 10,
                history_window: 4,
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[session]
name = "test-kg"
work_dir = "~/.kgchat"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.name, "test-kg");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn defaults_applied() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/kg"), None).unwrap();
        assert_eq!(cfg.graph.directedness, Directedness::Undirected);
        assert_eq!(cfg.graph.decode_policy, DecodePolicy::Lenient);
        assert_eq!(cfg.graph.save_file, PathBuf::from("/tmp/kg/kg.json"));
        assert_eq!(cfg.graph.search_seeds, 5);
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.llm.max_output_tokens, 300);
        assert_eq!(cfg.llm.entity_max_output_tokens, 100);
        assert_eq!(cfg.llm.timeout_seconds, 30);
        assert_eq!(cfg.llm.openai.model, "gpt-4o-mini");
        assert_eq!(cfg.chat.prompts_dir, PathBuf::from("config/prompts"));
        assert_eq!(cfg.chat.history_window, 20);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[session]
name = "movies"
work_dir = "/data/kg"
log_level = "debug"

[graph]
directed = true
save_file = "/elsewhere/movies.json"
decode_policy = "strict"
search_seeds = 3

[llm]
default = "openai"
max_output_tokens = 100
entity_max_output_tokens = 40
timeout_seconds = 10

[llm.openai]
model = "gpt-3.5-turbo"
temperature = 0.7

[chat]
prompts_dir = "prompts"
transcript_cap = 50
history_window = 6
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.graph.directedness, Directedness::Directed);
        assert_eq!(cfg.graph.decode_policy, DecodePolicy::Strict);
        assert_eq!(cfg.graph.save_file, PathBuf::from("/elsewhere/movies.json"));
        assert_eq!(cfg.graph.search_seeds, 3);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.max_output_tokens, 100);
        assert_eq!(cfg.llm.entity_max_output_tokens, 40);
        assert_eq!(cfg.llm.openai.model, "gpt-3.5-turbo");
        assert_eq!(cfg.llm.openai.api_base_url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(cfg.chat.transcript_cap, 50);
        assert_eq!(cfg.chat.history_window, 6);
    }

    #[test]
    fn bad_decode_policy_errors() {
        let toml = format!("{MINIMAL_TOML}\n[graph]\ndecode_policy = \"sloppy\"\n");
        let f = write_toml(&toml);
        let msg = load_from(f.path(), None, None).unwrap_err().to_string();
        assert!(msg.contains("config error"));
        assert!(msg.contains("sloppy"));
    }

    #[test]
    fn missing_session_section_errors() {
        let f = write_toml("[graph]\ndirected = true\n");
        let msg = load_from(f.path(), None, None).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.kgchat");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".kgchat"));
    }

    #[test]
    fn absolute_path_unchanged() {
        let p = expand_home("/absolute/path");
        assert_eq!(p, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn relative_path_unchanged() {
        let p = expand_home("relative/path");
        assert_eq!(p, PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_work_dir_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/test-override"), None).unwrap();
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/test-override"));
        assert_eq!(cfg.graph.save_file, PathBuf::from("/tmp/test-override/kg.json"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, Some("debug")).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }
}
