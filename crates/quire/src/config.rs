//! Configuration file structure (quire.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quire_logo::LogoJob;
use serde::Deserialize;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub serve: ServeSettings,
    #[serde(default)]
    pub logo: LogoSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Markdown/LaTeX sources read by the generator
    pub content_dir: PathBuf,
    /// Directory the generator writes
    pub output_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("dist"),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct BuildSettings {
    /// Site generator command line
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            command: default_build_command(),
        }
    }
}

fn default_build_command() -> Vec<String> {
    ["cargo", "run", "--release"].map(String::from).to_vec()
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServeSettings {
    pub host: String,
    pub port: u16,
    pub open: bool,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogoSettings {
    pub assets_dir: PathBuf,
    pub jobs: Vec<LogoEntry>,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            jobs: vec![
                LogoEntry::new("logo", "logo.tex"),
                LogoEntry::new("ideep-logo", "ideep-logo.tex"),
            ],
        }
    }
}

impl LogoSettings {
    /// Look up a logo job by name.
    pub fn job(&self, name: &str) -> Option<LogoJob> {
        self.jobs.iter().find(|j| j.name == name).map(|entry| {
            let job = LogoJob::new(&entry.name, &entry.source);
            match &entry.basename {
                Some(basename) => job.with_basename(basename),
                None => job,
            }
        })
    }

    /// Names of all configured jobs.
    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }
}

/// One `[[logo.jobs]]` entry.
#[derive(Debug, Deserialize, PartialEq)]
pub struct LogoEntry {
    pub name: String,
    pub source: String,
    /// Output basename, defaults to the source stem
    pub basename: Option<String>,
}

impl LogoEntry {
    fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            basename: None,
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("{} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
