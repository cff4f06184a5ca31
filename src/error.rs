//! Errors raised by write operations.
//!
//! Reads never fail: missing files, unparseable files and invalid items are
//! logged and skipped. Writes abort on the first error below, before the
//! target file is touched.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("no insertion anchor matched for new folder '{folder}'; refusing to guess a location")]
    AnchorNotFound { folder: String },

    #[error("{kind} '{name}' not found")]
    EntityNotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' has no <{tag}> element to update")]
    FieldNotFound {
        kind: &'static str,
        name: String,
        tag: String,
    },

    #[error("invalid folder name '{0}': must be a single path segment")]
    InvalidFolder(String),

    #[error("cannot back up {}: file does not exist", .0.display())]
    BackupSourceMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = WriteError> = std::result::Result<T, E>;
