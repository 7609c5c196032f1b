//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.config/hydra.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::editor::EditorCommand;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HydraConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EditorConfig {
    pub command: Option<String>,
    /// Shell-quoted extra arguments passed before the file path.
    pub args: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContentConfig {
    pub path: Option<String>,
    pub extension: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_EDITOR: &str = "vi";
pub const DEFAULT_EXTENSION: &str = "md";
pub const DEFAULT_LOG_FILE: &str = "hydra.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub editor: EditorCommand,
    pub content_dir: PathBuf,
    pub extension: String,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

/// Values taken from the command line. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub content_dir: Option<PathBuf>,
    pub editor: Option<String>,
    pub log_level: Option<LevelFilter>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.config/hydra.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("hydra.toml"))
}

/// Load config from `path`, or from [`config_path`] when `None`.
///
/// A missing default config is generated (commented out) and treated as
/// empty. A missing explicit path is an error.
pub fn load_config(path: Option<&Path>) -> Result<HydraConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => {
                if !p.exists() {
                    info!("No config file found, generating default at {}", p.display());
                    generate_default_config(&p);
                    return Ok(HydraConfig::default());
                }
                p
            }
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(HydraConfig::default());
            }
        },
    };

    let contents = fs::read_to_string(&path)?;
    let config: HydraConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Hydra Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [editor]
# command = "vim"                    # Or set HYDRA_EDITOR / VISUAL / EDITOR
# args = "-c 'set spell'"            # Shell-quoted, placed before the file path

# [content]
# path = "~/notes"                   # Defaults to the current directory
# extension = "md"

# [log]
# level = "info"                     # off, error, warn, info, debug, trace
# file = "hydra.log"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    let parsed = level.parse::<LevelFilter>().ok();
    if parsed.is_none() {
        warn!("Unknown log level {:?}, using default", level);
    }
    parsed
}

/// Editor program: CLI → HYDRA_EDITOR → config → VISUAL → EDITOR → default.
fn resolve_editor_program(config: &HydraConfig, cli: &CliOverrides) -> String {
    cli.editor
        .clone()
        .or_else(|| std::env::var("HYDRA_EDITOR").ok())
        .or_else(|| config.editor.command.clone())
        .or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &HydraConfig, cli: &CliOverrides) -> ResolvedConfig {
    let program = resolve_editor_program(config, cli);
    let editor = EditorCommand::parse(&program, config.editor.args.as_deref().unwrap_or(""));

    // Content dir: CLI → config → current directory
    let content_dir = cli
        .content_dir
        .clone()
        .or_else(|| config.content.path.as_deref().map(expand_home))
        .unwrap_or_else(|| PathBuf::from("."));

    let extension = config
        .content
        .extension
        .as_deref()
        .map(|e| e.trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let log_level = cli
        .log_level
        .or_else(|| config.log.level.as_deref().and_then(parse_level))
        .unwrap_or(DEFAULT_LOG_LEVEL);

    let log_file = config
        .log
        .file
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

    ResolvedConfig {
        editor,
        content_dir,
        extension,
        log_level,
        log_file,
    }
}
