//! Tolerant document reader with an mtime-keyed cache.
//!
//! [`DocumentReader::read`] loads a `.bsmx` file from the library directory,
//! repairs its entities, parses it with recovery and caches the tree keyed by
//! file name and modification time. A second read with an unchanged mtime
//! returns the same `Rc<Document>` without touching the file contents.
//!
//! The cache belongs to one reader instance. Write operations evict the entry
//! for the file they modified; nothing else expires.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use crate::document::Document;
use crate::entities;

struct CacheEntry {
    modified: SystemTime,
    document: Rc<Document>,
}

pub struct DocumentReader {
    dir: PathBuf,
    cache: HashMap<String, CacheEntry>,
}

impl DocumentReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    /// Directory the reader resolves file names against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Read and parse a library file.
    ///
    /// Returns `None` if the file does not exist or nothing could be
    /// recovered from it; callers treat both as an empty catalog.
    pub fn read(&mut self, filename: &str) -> Option<Rc<Document>> {
        let path = self.path_of(filename);
        let modified = match std::fs::metadata(&path) {
            Ok(meta) => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            Err(_) => return None,
        };

        if let Some(entry) = self.cache.get(filename) {
            if entry.modified == modified {
                tracing::debug!(file = filename, "document cache hit");
                return Some(Rc::clone(&entry.document));
            }
        }

        let text = match load_text(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = filename, error = %e, "failed to read library file");
                return None;
            }
        };

        match Document::parse(&text) {
            Some(doc) => {
                let document = Rc::new(doc);
                self.cache.insert(
                    filename.to_string(),
                    CacheEntry {
                        modified,
                        document: Rc::clone(&document),
                    },
                );
                Some(document)
            }
            None => {
                tracing::warn!(file = filename, "unrecoverable parse failure, skipping file");
                None
            }
        }
    }

    /// Load a file's repaired text without parsing it. Used by recovery
    /// passes that work below the tree.
    pub fn read_text(&self, filename: &str) -> Option<String> {
        load_text(&self.path_of(filename)).ok()
    }

    /// Drop the cached tree for one file.
    pub fn evict(&mut self, filename: &str) {
        if self.cache.remove(filename).is_some() {
            tracing::debug!(file = filename, "evicted document cache entry");
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, filename: &str) -> bool {
        self.cache.contains_key(filename)
    }
}

/// Read bytes permissively and apply the pre-parse entity repair.
pub fn load_text(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(entities::repair(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let mut reader = DocumentReader::new(tmp.path());
        assert!(reader.read("Hops.bsmx").is_none());
    }

    #[test]
    fn test_cached_tree_is_reused() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Hops.bsmx", "<Hops><Data></Data></Hops>");
        let mut reader = DocumentReader::new(tmp.path());

        let first = reader.read("Hops.bsmx").unwrap();
        let second = reader.read("Hops.bsmx").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_mtime_change_forces_reparse() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Hops.bsmx", "<Hops><Data></Data></Hops>");
        let mut reader = DocumentReader::new(tmp.path());
        let first = reader.read("Hops.bsmx").unwrap();

        let file = fs::File::options()
            .write(true)
            .open(tmp.path().join("Hops.bsmx"))
            .unwrap();
        let later = file.metadata().unwrap().modified().unwrap() + Duration::from_secs(60);
        file.set_modified(later).unwrap();

        let second = reader.read("Hops.bsmx").unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_evict_forces_reparse() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Misc.bsmx", "<Misc><Data></Data></Misc>");
        let mut reader = DocumentReader::new(tmp.path());
        let first = reader.read("Misc.bsmx").unwrap();
        reader.evict("Misc.bsmx");
        assert!(!reader.is_cached("Misc.bsmx"));
        let second = reader.read("Misc.bsmx").unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_entities_repaired_before_parse() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "Style.bsmx",
            "<Style><F_S_NAME>K&ouml;lsch &ndash; &#39;classic&#39;</F_S_NAME></Style>",
        );
        let mut reader = DocumentReader::new(tmp.path());
        let doc = reader.read("Style.bsmx").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.child_text(root, "F_S_NAME"), Some("Kölsch - 'classic'"));
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Misc.bsmx"),
            b"<Misc><F_M_NAME>Irish Moss \xff</F_M_NAME></Misc>",
        )
        .unwrap();
        let mut reader = DocumentReader::new(tmp.path());
        let doc = reader.read("Misc.bsmx").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.child_text(root, "F_M_NAME"), Some("Irish Moss \u{FFFD}"));
    }

    #[test]
    fn test_unrecoverable_is_none_and_not_cached() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Water.bsmx", "not markup at all");
        let mut reader = DocumentReader::new(tmp.path());
        assert!(reader.read("Water.bsmx").is_none());
        assert!(!reader.is_cached("Water.bsmx"));
    }
}
