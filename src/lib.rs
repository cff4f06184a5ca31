//! # bsmx-harness
//!
//! A tolerant reader, query layer and surgical writer for BeerSmith `.bsmx`
//! data files.
//!
//! BeerSmith stores its library as a directory of XML-like files
//! (`Hops.bsmx`, `Recipe.bsmx`, ...) that are frequently not well-formed:
//! HTML named entities, repeated root elements and stray bytes are common.
//! This crate reads them without complaint, turns them into typed entities,
//! and modifies them by splicing text so everything it does not touch stays
//! byte-for-byte intact.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │  .bsmx   │──▶│ Document │──▶│  Record  │──▶│  Entity  │
//! │  files   │   │  (tree)  │   │ (scalar) │   │ (schema) │
//! └────┬─────┘   └──────────┘   └──────────┘   └────┬─────┘
//!      │                                            ▼
//!      │   ┌──────────┐                       ┌──────────┐
//!      └───│  patch   │◀── fragment ◀─────────│ Library  │
//!          │ + backup │                       │ (query)  │
//!          └──────────┘                       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`entities`] | Entity repair, decoding and escaping |
//! | [`document`] | Recovering element-tree parser |
//! | [`reader`] | File loading with a modification-time cache |
//! | [`normalize`] | Scalar normalization of leaf text |
//! | [`record`] | Element subtree to nested record |
//! | [`schema`] | Per-entity field tables and validation |
//! | [`models`] | Typed entities |
//! | [`extract`] | Catalog extraction |
//! | [`recipes`] | Recipe folder walk and hydration |
//! | [`catalog`] | The [`Library`] query API |
//! | [`validate`] | Recipe checks against style ranges |
//! | [`fragment`] | Entity and recipe rendering |
//! | [`patch`] | Text-level insertion and field replacement |
//! | [`backup`] | Timestamped backups with manifests |
//! | [`write`] | Write operations on a [`Library`] |
//! | [`compose`] | Recipes built from catalog names |
//! | [`error`] | Write errors |
//! | [`config`] | TOML configuration |

pub mod entities;
pub mod normalize;

pub mod document;
pub mod reader;
pub mod record;

#[macro_use]
pub mod schema;
pub mod models;

pub mod catalog;
pub mod extract;
pub mod recipes;
pub mod validate;

pub mod backup;
pub mod compose;
pub mod error;
pub mod fragment;
pub mod patch;
pub mod write;

pub mod config;

pub use catalog::Library;
pub use error::WriteError;
pub use write::WriteReport;
