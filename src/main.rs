//! # bsmx CLI
//!
//! The `bsmx` binary exposes the library queries and write operations of
//! `bsmx-harness` on the command line. Every command prints JSON to stdout;
//! diagnostics go to stderr and are controlled with `RUST_LOG`.
//!
//! ## Usage
//!
//! ```bash
//! bsmx --config ./config/bsmx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bsmx hops` / `grains` / `yeasts` / ... | List a catalog, optionally filtered |
//! | `bsmx get <kind> <name>` | Look up one catalog item |
//! | `bsmx recipes` | List recipe summaries |
//! | `bsmx recipe <name-or-id>` | Show a fully hydrated recipe |
//! | `bsmx search <query>` | Search hops, grains, yeasts and misc at once |
//! | `bsmx candidates` | Dump ingredient matching candidates |
//! | `bsmx update <kind> <name> --set k=v` | Change fields of one item in place |
//! | `bsmx validate <recipe>` | Check a recipe against its style's ranges |
//! | `bsmx add-recipe <file.json>` | Add a recipe to `Recipe.bsmx` |
//! | `bsmx create-recipe <draft.json>` | Build a recipe from catalog names and add it |
//! | `bsmx export <recipe>` | Write a recipe as a standalone `.bsmx` file |
//! | `bsmx backup <file>` | Back up one library file |
//!
//! ## Examples
//!
//! ```bash
//! # Hops from the Czech Republic
//! bsmx hops --search czech
//!
//! # Raise the alpha acid of one hop
//! bsmx update hop "Cascade" --set alpha=7.25
//!
//! # Add a recipe into a named folder
//! bsmx add-recipe ./pale-ale.json --folder "Summer"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use bsmx_harness::compose::RecipeDraft;
use bsmx_harness::config;
use bsmx_harness::models::{
    AgeProfile, Carbonation, Equipment, Grain, Hop, IngredientKind, MashProfile, Misc, Recipe,
    Style, Water, Yeast,
};
use bsmx_harness::schema::{Entity, FieldKind, FieldValue};
use bsmx_harness::{Library, WriteReport};

/// bsmx: query and edit a BeerSmith library.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "bsmx",
    about = "Query and surgically edit BeerSmith .bsmx library files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/bsmx.toml`.
    #[arg(long, global = true, default_value = "./config/bsmx.toml")]
    config: PathBuf,

    /// Library directory, overriding `[library].path`.
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List hops, sorted by name.
    Hops {
        /// Substring of the name or origin.
        #[arg(long)]
        search: Option<String>,
        /// Hop type code (0 bittering, 1 aroma, 2 both).
        #[arg(long = "type")]
        hop_type: Option<i64>,
    },

    /// List grains and other fermentables, sorted by name.
    Grains {
        #[arg(long)]
        search: Option<String>,
        /// Grain type code.
        #[arg(long = "type")]
        grain_type: Option<i64>,
    },

    /// List yeasts, sorted by lab then name.
    Yeasts {
        /// Substring of the name, lab or product id.
        #[arg(long)]
        search: Option<String>,
        /// Substring of the lab.
        #[arg(long)]
        lab: Option<String>,
    },

    /// List water profiles.
    Waters {
        #[arg(long)]
        search: Option<String>,
    },

    /// List styles, sorted by category then name.
    Styles {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },

    /// List equipment profiles.
    Equipment,

    /// List mash profiles with their steps.
    Mash,

    /// List misc ingredients.
    Misc {
        #[arg(long)]
        search: Option<String>,
    },

    /// List carbonation profiles.
    Carbonation {
        #[arg(long)]
        search: Option<String>,
    },

    /// List fermentation and aging profiles.
    Ages {
        #[arg(long)]
        search: Option<String>,
    },

    /// Look up one item by name: exact match first, then partial.
    Get {
        kind: Kind,
        name: String,
    },

    /// List recipe summaries, sorted by folder then name.
    Recipes {
        /// Substring of the folder path.
        #[arg(long)]
        folder: Option<String>,
        /// Substring of the recipe name.
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one recipe with its profiles and ingredients.
    Recipe {
        /// Recipe id or name.
        name_or_id: String,
    },

    /// Search several ingredient catalogs at once.
    Search {
        query: String,
        /// Restrict to these kinds (hop, grain, yeast, misc). Repeatable.
        #[arg(long = "kind")]
        kinds: Vec<IngredientKind>,
    },

    /// Dump every ingredient as a matching candidate with keywords.
    Candidates,

    /// Change fields of one catalog item in place.
    ///
    /// The file is backed up first. Only the named fields change; the rest
    /// of the file is left byte-for-byte intact.
    Update {
        kind: Kind,
        /// Exact item name (case-insensitive).
        name: String,
        /// Field assignment, `field=value`. Repeatable.
        #[arg(long = "set", value_parser = parse_key_val, required = true)]
        changes: Vec<(String, String)>,
    },

    /// Check a recipe's OG, FG, ABV, IBU and color against its style.
    Validate {
        /// Recipe id or name.
        name_or_id: String,
    },

    /// Add a recipe, read from a JSON file, to `Recipe.bsmx`.
    AddRecipe {
        /// JSON file holding one recipe.
        path: PathBuf,
        /// Target folder (single name). Defaults to `[writer].default_folder`.
        #[arg(long)]
        folder: Option<String>,
    },

    /// Build a recipe from style, equipment, yeast, grain and hop names and
    /// add it to `Recipe.bsmx`.
    ///
    /// The JSON draft looks like `{"name", "style", "equipment", "yeast",
    /// "grains": [{"name", "amount_kg"}], "hops": [{"name", "amount_g",
    /// "time", "use"}], "boil_time", "brewer", "notes"}`.
    CreateRecipe {
        /// JSON file holding the draft.
        path: PathBuf,
        /// Target folder (single name). Defaults to `[writer].default_folder`.
        #[arg(long)]
        folder: Option<String>,
    },

    /// Export a library recipe as a standalone importable `.bsmx` file.
    Export {
        /// Recipe id or name.
        name_or_id: String,
    },

    /// Back up one library file.
    Backup {
        /// File name inside the library, e.g. `Hops.bsmx`.
        file: String,
    },
}

/// Catalog kinds addressable by `get` and `update`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Hop,
    Grain,
    Yeast,
    Water,
    Style,
    Equipment,
    Mash,
    Misc,
    Carbonation,
    Age,
    Recipe,
}

/// Parse a `key=value` pair for `--set` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].trim().to_string(), s[pos + 1..].to_string()))
}

/// Convert raw assignments to typed values using the entity's field table.
/// Fields the table does not declare are written as text.
fn typed_changes<E: Entity>(raw: &[(String, String)]) -> Result<Vec<(String, FieldValue)>> {
    raw.iter()
        .map(|(field, value)| {
            let kind = E::SCHEMA
                .field(field)
                .map(|spec| spec.kind)
                .unwrap_or(FieldKind::Text);
            let parsed = FieldValue::parse(kind, value).with_context(|| {
                format!("{} field '{}' expects {}, got '{}'", E::SCHEMA.kind, field, kind, value)
            })?;
            Ok((field.clone(), parsed))
        })
        .collect()
}

fn update<E: Entity>(lib: &mut Library, name: &str, raw: &[(String, String)]) -> Result<WriteReport> {
    let changes = typed_changes::<E>(raw)?;
    Ok(lib.update_entity::<E>(name, &changes)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_found<T: Serialize>(kind: &str, name: &str, value: Option<T>) -> Result<()> {
    match value {
        Some(v) => print_json(&v),
        None => anyhow::bail!("{} '{}' not found", kind, name),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_or_default(&cli.config)?;
    if let Some(dir) = cli.library {
        cfg.library.path = dir;
    }
    let mut lib = Library::from_config(&cfg)?;

    match cli.command {
        Commands::Hops { search, hop_type } => {
            print_json(&lib.get_hops(search.as_deref(), hop_type))?;
        }
        Commands::Grains { search, grain_type } => {
            print_json(&lib.get_grains(search.as_deref(), grain_type))?;
        }
        Commands::Yeasts { search, lab } => {
            print_json(&lib.get_yeasts(search.as_deref(), lab.as_deref()))?;
        }
        Commands::Waters { search } => {
            print_json(&lib.get_water_profiles(search.as_deref()))?;
        }
        Commands::Styles { search, category } => {
            print_json(&lib.get_styles(search.as_deref(), category.as_deref()))?;
        }
        Commands::Equipment => print_json(&lib.get_equipment_profiles())?,
        Commands::Mash => print_json(&lib.get_mash_profiles())?,
        Commands::Misc { search } => print_json(&lib.get_misc_ingredients(search.as_deref()))?,
        Commands::Carbonation { search } => {
            print_json(&lib.get_carbonation_profiles(search.as_deref()))?;
        }
        Commands::Ages { search } => print_json(&lib.get_age_profiles(search.as_deref()))?,
        Commands::Get { kind, name } => {
            let n = name.as_str();
            match kind {
                Kind::Hop => print_found("hop", n, lib.get_hop(n))?,
                Kind::Grain => print_found("grain", n, lib.get_grain(n))?,
                Kind::Yeast => print_found("yeast", n, lib.get_yeast(n))?,
                Kind::Water => print_found("water", n, lib.get_water_profile(n))?,
                Kind::Style => print_found("style", n, lib.get_style(n))?,
                Kind::Equipment => print_found("equipment", n, lib.get_equipment(n))?,
                Kind::Mash => print_found("mash profile", n, lib.get_mash_profile(n))?,
                Kind::Misc => print_found("misc", n, lib.get_misc(n))?,
                Kind::Carbonation => print_found("carbonation", n, lib.get_carbonation(n))?,
                Kind::Age => print_found("age profile", n, lib.get_age_profile(n))?,
                Kind::Recipe => print_found("recipe", n, lib.get_recipe(n))?,
            }
        }
        Commands::Recipes { folder, search } => {
            print_json(&lib.list_recipes(folder.as_deref(), search.as_deref()))?;
        }
        Commands::Recipe { name_or_id } => {
            let recipe = lib.get_recipe(&name_or_id);
            print_found("recipe", &name_or_id, recipe)?;
        }
        Commands::Search { query, kinds } => {
            print_json(&lib.search_ingredients(&query, &kinds))?;
        }
        Commands::Candidates => print_json(&lib.candidates())?,
        Commands::Update {
            kind,
            name,
            changes,
        } => {
            let lib = &mut lib;
            let report = match kind {
                Kind::Hop => update::<Hop>(lib, &name, &changes)?,
                Kind::Grain => update::<Grain>(lib, &name, &changes)?,
                Kind::Yeast => update::<Yeast>(lib, &name, &changes)?,
                Kind::Water => update::<Water>(lib, &name, &changes)?,
                Kind::Style => update::<Style>(lib, &name, &changes)?,
                Kind::Equipment => update::<Equipment>(lib, &name, &changes)?,
                Kind::Mash => update::<MashProfile>(lib, &name, &changes)?,
                Kind::Misc => update::<Misc>(lib, &name, &changes)?,
                Kind::Carbonation => update::<Carbonation>(lib, &name, &changes)?,
                Kind::Age => update::<AgeProfile>(lib, &name, &changes)?,
                Kind::Recipe => update::<Recipe>(lib, &name, &changes)?,
            };
            print_json(&report)?;
        }
        Commands::Validate { name_or_id } => print_json(&lib.validate_recipe(&name_or_id)?)?,
        Commands::AddRecipe { path, folder } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read recipe file: {}", path.display()))?;
            let recipe: Recipe = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse recipe JSON: {}", path.display()))?;
            if recipe.name.trim().is_empty() {
                anyhow::bail!("recipe in {} has no name", path.display());
            }
            print_json(&lib.add_recipe(&recipe, folder.as_deref())?)?;
        }
        Commands::CreateRecipe { path, folder } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read recipe draft: {}", path.display()))?;
            let draft: RecipeDraft = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse recipe draft: {}", path.display()))?;
            if draft.name.trim().is_empty() {
                anyhow::bail!("recipe draft in {} has no name", path.display());
            }
            print_json(&lib.create_recipe(&draft, folder.as_deref())?)?;
        }
        Commands::Export { name_or_id } => {
            let Some(recipe) = lib.get_recipe(&name_or_id) else {
                anyhow::bail!("recipe '{}' not found", name_or_id);
            };
            let path = lib.export_recipe(&recipe)?;
            print_json(&serde_json::json!({ "path": path }))?;
        }
        Commands::Backup { file } => {
            let backup = lib.create_backup(&file)?;
            print_json(&serde_json::json!({
                "dir": backup.dir,
                "file": backup.file,
                "manifest": backup.manifest,
            }))?;
        }
    }

    Ok(())
}
