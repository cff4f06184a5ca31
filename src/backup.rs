//! Timestamped backups.
//!
//! Every write copies the target file, byte for byte, into a fresh
//! directory under the backup root before anything is modified:
//!
//! ```text
//! mcp_backups/
//!   2026-10-16T14-03-27/
//!     Recipe.bsmx
//!     manifest.json
//! ```
//!
//! Directories are never reused. Two backups within the same second get
//! `-1`, `-2`, ... suffixes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, WriteError};

pub const MANIFEST: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub timestamp: String,
    pub files: Vec<String>,
    pub reason: String,
    /// Hex SHA-256 of each copied file, keyed by file name.
    pub sha256: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Backup {
    pub dir: PathBuf,
    /// The copy of the source file.
    pub file: PathBuf,
    pub manifest: Manifest,
}

/// Copy `source` into a new timestamped directory under `root` and write
/// its manifest.
pub fn create_backup(source: &Path, root: &Path, reason: &str) -> Result<Backup> {
    if !source.is_file() {
        return Err(WriteError::BackupSourceMissing(source.to_path_buf()));
    }
    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| WriteError::BackupSourceMissing(source.to_path_buf()))?;

    let bytes = fs::read(source)?;
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S").to_string();
    let dir = unique_dir(root, &timestamp)?;

    let file = dir.join(&filename);
    fs::write(&file, &bytes)?;

    let mut sha256 = BTreeMap::new();
    sha256.insert(filename.clone(), hex::encode(Sha256::digest(&bytes)));
    let manifest = Manifest {
        timestamp,
        files: vec![filename],
        reason: reason.to_string(),
        sha256,
    };
    fs::write(dir.join(MANIFEST), serde_json::to_string_pretty(&manifest)?)?;

    tracing::info!(source = %source.display(), backup = %dir.display(), "created backup");
    Ok(Backup {
        dir,
        file,
        manifest,
    })
}

fn unique_dir(root: &Path, timestamp: &str) -> Result<PathBuf> {
    fs::create_dir_all(root)?;
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            timestamp.to_string()
        } else {
            format!("{}-{}", timestamp, attempt)
        };
        let dir = root.join(name);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read a backup directory's manifest.
pub fn read_manifest(dir: &Path) -> Result<Manifest> {
    let text = fs::read_to_string(dir.join(MANIFEST))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("Hops.bsmx");
        let bytes = b"<Hops><F_H_NAME>Saaz \xe9</F_H_NAME></Hops>".to_vec();
        fs::write(&source, &bytes).unwrap();

        let backup = create_backup(&source, &tmp.path().join("backups"), "test").unwrap();
        assert_eq!(fs::read(&backup.file).unwrap(), bytes);
        assert!(backup.dir.starts_with(tmp.path().join("backups")));

        let manifest = read_manifest(&backup.dir).unwrap();
        assert_eq!(manifest, backup.manifest);
        assert_eq!(manifest.files, vec!["Hops.bsmx"]);
        assert_eq!(manifest.reason, "test");
        assert_eq!(manifest.sha256["Hops.bsmx"].len(), 64);
    }

    #[test]
    fn test_same_second_backups_get_distinct_dirs() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("Misc.bsmx");
        fs::write(&source, "<Misc/>").unwrap();
        let root = tmp.path().join("backups");

        let dirs: Vec<PathBuf> = (0..3)
            .map(|_| create_backup(&source, &root, "test").unwrap().dir)
            .collect();
        assert_ne!(dirs[0], dirs[1]);
        assert_ne!(dirs[1], dirs[2]);
        assert_ne!(dirs[0], dirs[2]);
    }

    #[test]
    fn test_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let err = create_backup(&tmp.path().join("Nope.bsmx"), tmp.path(), "test").unwrap_err();
        assert!(matches!(err, WriteError::BackupSourceMissing(_)));
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
