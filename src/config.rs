//! TOML configuration.
//!
//! ```toml
//! [library]
//! path = "~/Library/Application Support/BeerSmith3"
//!
//! [backup]
//! root = "mcp_backups"
//! reason = "bsmx modification"
//!
//! [writer]
//! default_folder = "MCP Created"
//! export_dir = "MCP_Exports"
//! anchors = ['</Data>\s*</Recipe>\s*$']
//! ```
//!
//! Every section is optional. Relative `backup.root` and `writer.export_dir`
//! resolve against `library.path`.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub writer: WriterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
        }
    }
}

fn default_library_path() -> PathBuf {
    PathBuf::from("~/Library/Application Support/BeerSmith3")
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackupConfig {
    #[serde(default = "default_backup_root")]
    pub root: PathBuf,
    #[serde(default = "default_backup_reason")]
    pub reason: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            root: default_backup_root(),
            reason: default_backup_reason(),
        }
    }
}

fn default_backup_root() -> PathBuf {
    PathBuf::from("mcp_backups")
}
fn default_backup_reason() -> String {
    "bsmx modification".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct WriterConfig {
    #[serde(default = "default_folder")]
    pub default_folder: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Patterns marking the end of the main data section, tried in order
    /// when a new folder has to be created.
    #[serde(default = "default_anchors")]
    pub anchors: Vec<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            default_folder: default_folder(),
            export_dir: default_export_dir(),
            anchors: default_anchors(),
        }
    }
}

fn default_folder() -> String {
    "MCP Created".to_string()
}
fn default_export_dir() -> PathBuf {
    PathBuf::from("MCP_Exports")
}
fn default_anchors() -> Vec<String> {
    vec![r"</Data>\s*</Recipe>\s*$".to_string()]
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Library directory with a leading `~/` expanded.
    pub fn library_dir(&self) -> PathBuf {
        expand_home(&self.library.path)
    }

    pub fn backup_root(&self) -> PathBuf {
        self.library_dir().join(expand_home(&self.backup.root))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.library_dir().join(expand_home(&self.writer.export_dir))
    }

    /// Compiled anchor patterns.
    pub fn anchors(&self) -> Result<Vec<Regex>> {
        self.writer
            .anchors
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid writer anchor: {}", p)))
            .collect()
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Load the config file, falling back to [`Config::minimal`] when it does
/// not exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate writer
    if config.writer.anchors.is_empty() {
        anyhow::bail!("writer.anchors must list at least one pattern");
    }
    config.anchors()?;

    let folder = config.writer.default_folder.trim();
    if folder.is_empty() {
        anyhow::bail!("writer.default_folder must not be empty");
    }
    if folder.contains('/') {
        anyhow::bail!(
            "writer.default_folder must be a single folder name, got '{}'",
            config.writer.default_folder
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(body: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bsmx.toml");
        std::fs::write(&path, body).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_tmp, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.writer.default_folder, "MCP Created");
        assert_eq!(cfg.backup.root, PathBuf::from("mcp_backups"));
        assert_eq!(cfg.anchors().unwrap().len(), 1);
    }

    #[test]
    fn test_relative_dirs_resolve_against_library() {
        let (_tmp, path) = write_config(
            "[library]\npath = \"/data/beersmith\"\n[writer]\nexport_dir = \"out\"\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.backup_root(), PathBuf::from("/data/beersmith/mcp_backups"));
        assert_eq!(cfg.export_dir(), PathBuf::from("/data/beersmith/out"));
    }

    #[test]
    fn test_absolute_backup_root_kept() {
        let (_tmp, path) =
            write_config("[library]\npath = \"/data/bs\"\n[backup]\nroot = \"/var/backups\"\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.backup_root(), PathBuf::from("/var/backups"));
    }

    #[test]
    fn test_invalid_anchor_rejected() {
        let (_tmp, path) = write_config("[writer]\nanchors = ['</Data>(']\n");
        assert!(load_config(&path).is_err());
        let (_tmp, path) = write_config("[writer]\nanchors = []\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_nested_default_folder_rejected() {
        let (_tmp, path) = write_config("[writer]\ndefault_folder = \"a/b\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.writer.export_dir, PathBuf::from("MCP_Exports"));
    }
}
