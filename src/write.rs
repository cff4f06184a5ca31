//! Write operations on a [`Library`].
//!
//! Every in-place write follows the same order:
//!
//! 1. read the target file and compute the patched text in memory
//! 2. back the file up
//! 3. write the patched text
//! 4. evict the file from the reader cache
//!
//! Lookups, anchor matching and field checks all happen in step 1, so a
//! failing write leaves no backup and no modified file behind.
//!
//! Files are written back in the encoding they were read in. Text that is
//! not valid UTF-8 is treated as Latin-1; generated fragments are pure
//! ASCII, so either encoding round-trips.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backup::{self, Backup};
use crate::catalog::{Library, RECIPE_FILE};
use crate::error::{Result, WriteError};
use crate::fragment::{render_recipe, today};
use crate::models::Recipe;
use crate::patch::{append_to_folder, locate_entity, update_fields};
use crate::schema::{Entity, FieldValue};

/// Outcome of an in-place write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub file: PathBuf,
    pub backup: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Latin1,
}

fn decode(bytes: Vec<u8>) -> (String, Encoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, Encoding::Utf8),
        Err(e) => {
            let text = e.into_bytes().iter().map(|&b| b as char).collect();
            (text, Encoding::Latin1)
        }
    }
}

fn encode(text: String, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.into_bytes(),
        Encoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    }
}

static UNSAFE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-_]").unwrap());

/// Folder name as a single path segment.
fn folder_segment(folder: &str) -> Result<String> {
    let name = folder.trim().trim_matches('/').trim();
    if name.is_empty() || name.contains('/') {
        return Err(WriteError::InvalidFolder(folder.to_string()));
    }
    Ok(name.to_string())
}

impl Library {
    /// Back up one library file.
    pub fn create_backup(&self, filename: &str) -> Result<Backup> {
        let source = self.reader.path_of(filename);
        backup::create_backup(
            &source,
            &self.settings.backup_root,
            &self.settings.backup_reason,
        )
    }

    /// Add a recipe to `Recipe.bsmx` inside `folder`, creating the folder
    /// when needed. Defaults to the configured folder.
    pub fn add_recipe(&mut self, recipe: &Recipe, folder: Option<&str>) -> Result<WriteReport> {
        let folder = folder_segment(folder.unwrap_or(&self.settings.default_folder))?;
        let path = self.reader.path_of(RECIPE_FILE);
        if !path.is_file() {
            return Err(WriteError::BackupSourceMissing(path));
        }
        let (text, encoding) = decode(fs::read(&path)?);

        let date = today();
        let mut recipe = recipe.clone();
        // Placement comes from the enclosing folders when the file is read.
        recipe.folder.clear();
        let fragment = render_recipe(&recipe, &date);
        let patched = append_to_folder(&text, &folder, &fragment, &self.settings.anchors, &date)?;

        let report = self.commit(RECIPE_FILE, &path, patched, encoding)?;
        tracing::info!(recipe = %recipe.name, folder = %folder, "added recipe");
        Ok(report)
    }

    /// Change fields of the entity named `name` in its catalog file.
    ///
    /// Field names are the entity's Rust field names; names the schema does
    /// not know map to `<PREFIX><NAME>` tags.
    pub fn update_entity<E: Entity>(
        &mut self,
        name: &str,
        changes: &[(String, FieldValue)],
    ) -> Result<WriteReport> {
        let schema = E::SCHEMA;
        let not_found = || WriteError::EntityNotFound {
            kind: schema.kind,
            name: name.to_string(),
        };
        let file = schema.file.ok_or_else(not_found)?;
        let path = self.reader.path_of(file);
        if !path.is_file() {
            return Err(not_found());
        }
        let (text, encoding) = decode(fs::read(&path)?);

        let range = locate_entity(&text, schema, name).ok_or_else(not_found)?;
        let updated = update_fields(&text[range.clone()], schema, name, changes)?;
        let mut patched = String::with_capacity(text.len() + updated.len());
        patched.push_str(&text[..range.start]);
        patched.push_str(&updated);
        patched.push_str(&text[range.end..]);

        let report = self.commit(file, &path, patched, encoding)?;
        tracing::info!(kind = schema.kind, name, fields = changes.len(), "updated entity");
        Ok(report)
    }

    /// Write a recipe as a standalone importable file in the export
    /// directory. Returns the written path.
    pub fn export_recipe(&self, recipe: &Recipe) -> Result<PathBuf> {
        let dir = &self.settings.export_dir;
        fs::create_dir_all(dir)?;
        let filename = format!("{}.bsmx", UNSAFE_FILENAME.replace_all(&recipe.name, "_"));
        let path = dir.join(filename);

        let date = today();
        let body = format!(
            "<Recipe><_PERMID_>0</_PERMID_>\n\
             <_MOD_>{date}</_MOD_>\n\
             <Name>MCP Export</Name>\n\
             <Type>7372</Type>\n\
             <Dirty>1</Dirty>\n\
             <Owndata>1</Owndata>\n\
             <TID>7372</TID>\n\
             <Size>1</Size>\n\
             <_XName>Recipe</_XName>\n\
             <Allocinc>16</Allocinc>\n\
             <Data>{recipe}\n\
             </Data></Recipe>",
            date = date,
            recipe = render_recipe(recipe, &date),
        );
        fs::write(&path, body)?;
        tracing::info!(recipe = %recipe.name, path = %path.display(), "exported recipe");
        Ok(path)
    }

    fn commit(
        &mut self,
        filename: &str,
        path: &Path,
        text: String,
        encoding: Encoding,
    ) -> Result<WriteReport> {
        let backup = self.create_backup(filename)?;
        fs::write(path, encode(text, encoding))?;
        self.reader.evict(filename);
        Ok(WriteReport {
            file: path.to_path_buf(),
            backup: backup.file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Hop;
    use tempfile::TempDir;

    #[test]
    fn test_latin1_round_trip() {
        let bytes = b"<F_H_NAME>Hallertauer Mittelfr\xfch</F_H_NAME>".to_vec();
        let (text, encoding) = decode(bytes.clone());
        assert_eq!(encoding, Encoding::Latin1);
        assert!(text.contains("Mittelfrüh"));
        assert_eq!(encode(text, encoding), bytes);
    }

    #[test]
    fn test_folder_segment() {
        assert_eq!(folder_segment("/MCP Created/").unwrap(), "MCP Created");
        assert_eq!(folder_segment("Ales").unwrap(), "Ales");
        assert!(matches!(folder_segment("a/b"), Err(WriteError::InvalidFolder(_))));
        assert!(matches!(folder_segment(" / "), Err(WriteError::InvalidFolder(_))));
    }

    #[test]
    fn test_update_missing_entity_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let body = "<Hops><Data><Hops><F_H_NAME>Saaz</F_H_NAME></Hops></Data></Hops>";
        fs::write(tmp.path().join("Hops.bsmx"), body).unwrap();
        let mut lib = Library::open(tmp.path()).unwrap();

        let changes = vec![("alpha".to_string(), FieldValue::Float(4.0))];
        let err = lib.update_entity::<Hop>("Citra", &changes).unwrap_err();
        assert!(matches!(err, WriteError::EntityNotFound { kind: "hop", .. }));
        assert_eq!(fs::read_to_string(tmp.path().join("Hops.bsmx")).unwrap(), body);
        assert!(!tmp.path().join("mcp_backups").exists());
    }

    #[test]
    fn test_export_sanitizes_name() {
        let tmp = TempDir::new().unwrap();
        let lib = Library::open(tmp.path()).unwrap();
        let recipe = Recipe {
            name: "Bob's IPA #2".into(),
            ..Default::default()
        };
        let path = lib.export_recipe(&recipe).unwrap();
        assert_eq!(path, tmp.path().join("MCP_Exports").join("Bob_s_IPA__2.bsmx"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("<_XName>Recipe</_XName>"));
        assert!(text.contains("<F_R_NAME>Bob&#x27;s IPA #2</F_R_NAME>"));
    }
}
