//! # xref-config
//!
//! Configuration management for xref.
//!
//! Loads configuration from the first of:
//! 1. An explicit path (`--config`)
//! 2. `./xref.toml` (project-local)
//! 3. `~/.config/xref/config.toml` (global)
//!
//! and then applies environment variable overrides (highest priority).

pub mod logging;
pub mod path;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use xref_core::PathMap;

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "xref.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub output: OutputConfig,
    /// Source roots to index, in priority order.
    pub roots: Vec<RootConfig>,
    /// Rules linking external symbols to documentation.
    pub external: Vec<ExternalLinkRule>,
}

impl Config {
    /// Load config from `explicit`, or from the standard locations.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let project = Path::new(PROJECT_CONFIG_FILE);
                if project.exists() {
                    Self::from_file(project)?
                } else {
                    match Self::global_config_path() {
                        Some(global) if global.exists() => Self::from_file(&global)?,
                        _ => Config::default(),
                    }
                }
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.resolve_relative_to(path.parent().unwrap_or(Path::new("")));
        Ok(config)
    }

    /// Global config path: ~/.config/xref/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("xref").join("config.toml"))
    }

    /// Make relative paths in the file relative to the file's directory.
    fn resolve_relative_to(&mut self, base: &Path) {
        if base.as_os_str().is_empty() {
            return;
        }
        for root in &mut self.roots {
            root.source = base.join(&root.source);
            root.output = base.join(&root.output);
        }
        if let Some(template) = &mut self.output.template {
            *template = base.join(&*template);
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `XREF_THREADS` / `XREF_TEMPLATE` as reported by `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(threads) = lookup("XREF_THREADS") {
            let n = threads.trim().parse().map_err(|_| ConfigError::Env {
                var: "XREF_THREADS",
                value: threads.clone(),
            })?;
            self.index.threads = Some(n);
        }
        if let Some(template) = lookup("XREF_TEMPLATE") {
            self.output.template = Some(PathBuf::from(template));
        }
        Ok(())
    }

    /// Build the path map: source roots canonicalized, output roots made absolute.
    pub fn path_map(&self) -> PathMap {
        PathMap::new(self.roots.iter().map(|root| {
            (
                path::normalize_or_original(&root.source),
                path::absolutize(&root.output),
            )
        }))
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        let example = Config {
            roots: vec![RootConfig {
                source: PathBuf::from("src"),
                output: PathBuf::from("html/src"),
            }],
            external: vec![ExternalLinkRule {
                usr_prefix: "c:@N@std".to_string(),
                url: "https://en.cppreference.com/mwiki/index.php?search={name}".to_string(),
            }],
            ..Config::default()
        };
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of parallel TU workers (None = auto)
    pub threads: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// HTML template with `{{filename}}`, `{{rootpath}}` and `{{code}}`
    /// placeholders (None = built-in)
    pub template: Option<PathBuf>,
}

/// One `[[roots]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Source directory whose files are indexed
    pub source: PathBuf,
    /// Directory receiving the generated HTML
    pub output: PathBuf,
}

/// One `[[external]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLinkRule {
    /// External symbol ids starting with this prefix are linked
    pub usr_prefix: String,
    /// URL template; `{name}` is replaced by the referenced spelling
    pub url: String,
}

impl ExternalLinkRule {
    /// URL for `usr`/`name`, if the rule applies.
    pub fn link_for(&self, usr: &str, name: &str) -> Option<String> {
        usr.starts_with(&self.usr_prefix)
            .then(|| self.url.replace("{name}", name))
    }
}
