//! The library: typed queries over one BeerSmith data directory.
//!
//! [`Library`] owns a [`DocumentReader`] and answers every read query from
//! its cache. Queries never fail. A missing or unreadable file is an empty
//! catalog and invalid items are skipped with a warning.
//!
//! # Queries
//!
//! | Catalog | Search fields | Filter | Order |
//! |---------|---------------|--------|-------|
//! | hops | name, origin | `hop_type` | name |
//! | grains | name, origin | `grain_type` | name |
//! | yeasts | name, lab, product id | lab substring | lab, name |
//! | water | name | | name |
//! | styles | name, category | category substring | category, name |
//! | equipment | | | name |
//! | mash profiles | | | name |
//! | misc, carbonation, age | name | | name |
//!
//! All text matching is case-insensitive substring matching.
//!
//! # Lookups
//!
//! Single-item lookups try an exact (case-insensitive) name match first,
//! then the first name containing the query, then, for searchable
//! catalogs, the first result of a search for the query.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::config::{Config, LibraryConfig};
use crate::extract::{extract_all, recover_duplicate_roots};
use crate::models::{
    AgeProfile, Candidate, Carbonation, Equipment, Grain, Hop, IngredientHits, IngredientKind,
    MashProfile, Misc, Recipe, RecipeSummary, Style, Water, Yeast,
};
use crate::reader::DocumentReader;
use crate::recipes::{walk_document, CLOUD_FOLDER, ROOT_FOLDER};
use crate::schema::Entity;

/// File holding local recipes.
pub const RECIPE_FILE: &str = "Recipe.bsmx";
/// File holding cloud recipes.
pub const CLOUD_FILE: &str = "Cloud.bsmx";

/// Hits kept per kind by [`Library::search_ingredients`].
pub const SEARCH_LIMIT: usize = 10;

/// Settings used by write operations.
#[derive(Debug, Clone)]
pub struct WriteSettings {
    pub backup_root: PathBuf,
    pub backup_reason: String,
    pub default_folder: String,
    pub export_dir: PathBuf,
    pub anchors: Vec<Regex>,
}

pub struct Library {
    pub(crate) reader: DocumentReader,
    pub(crate) settings: WriteSettings,
}

impl Library {
    /// Open a library directory with default settings.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let config = Config {
            library: LibraryConfig { path: dir.into() },
            ..Config::minimal()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = WriteSettings {
            backup_root: config.backup_root(),
            backup_reason: config.backup.reason.clone(),
            default_folder: config.writer.default_folder.clone(),
            export_dir: config.export_dir(),
            anchors: config.anchors()?,
        };
        Ok(Self {
            reader: DocumentReader::new(config.library_dir()),
            settings,
        })
    }

    pub fn dir(&self) -> &Path {
        self.reader.dir()
    }

    pub fn settings(&self) -> &WriteSettings {
        &self.settings
    }

    pub fn reader(&mut self) -> &mut DocumentReader {
        &mut self.reader
    }

    /// Every valid item of `E` in its catalog file.
    pub fn catalog<E: Entity>(&mut self) -> Vec<E> {
        let Some(file) = E::SCHEMA.file else {
            return Vec::new();
        };
        match self.reader.read(file) {
            Some(doc) => extract_all(&doc),
            None => Vec::new(),
        }
    }

    // === Hops ===

    pub fn get_hops(&mut self, search: Option<&str>, hop_type: Option<i64>) -> Vec<Hop> {
        let mut hops: Vec<Hop> = self
            .catalog::<Hop>()
            .into_iter()
            .filter(|h| matches_any(search, &[&h.name, &h.origin]))
            .filter(|h| hop_type.map_or(true, |t| h.hop_type == t))
            .collect();
        hops.sort_by(|a, b| a.name.cmp(&b.name));
        hops
    }

    pub fn get_hop(&mut self, name: &str) -> Option<Hop> {
        let all = self.get_hops(None, None);
        let searched = self.get_hops(Some(name), None);
        lookup(all, name, |_| false).or_else(|| searched.into_iter().next())
    }

    // === Grains ===

    pub fn get_grains(&mut self, search: Option<&str>, grain_type: Option<i64>) -> Vec<Grain> {
        let mut grains: Vec<Grain> = self
            .catalog::<Grain>()
            .into_iter()
            .filter(|g| matches_any(search, &[&g.name, &g.origin]))
            .filter(|g| grain_type.map_or(true, |t| g.grain_type == t))
            .collect();
        grains.sort_by(|a, b| a.name.cmp(&b.name));
        grains
    }

    pub fn get_grain(&mut self, name: &str) -> Option<Grain> {
        let all = self.get_grains(None, None);
        let searched = self.get_grains(Some(name), None);
        lookup(all, name, |_| false).or_else(|| searched.into_iter().next())
    }

    // === Yeasts ===

    pub fn get_yeasts(&mut self, search: Option<&str>, lab: Option<&str>) -> Vec<Yeast> {
        let mut yeasts: Vec<Yeast> = self
            .catalog::<Yeast>()
            .into_iter()
            .filter(|y| matches_any(search, &[&y.name, &y.lab, &y.product_id]))
            .filter(|y| matches_any(lab, &[&y.lab]))
            .collect();
        yeasts.sort_by(|a, b| (&a.lab, &a.name).cmp(&(&b.lab, &b.name)));
        yeasts
    }

    /// Look up a yeast by name or exact product id.
    pub fn get_yeast(&mut self, name: &str) -> Option<Yeast> {
        let all = self.get_yeasts(None, None);
        let searched = self.get_yeasts(Some(name), None);
        lookup(all, name, |y| y.product_id.eq_ignore_ascii_case(name.trim()))
            .or_else(|| searched.into_iter().next())
    }

    // === Water ===

    pub fn get_water_profiles(&mut self, search: Option<&str>) -> Vec<Water> {
        let mut waters: Vec<Water> = self
            .catalog::<Water>()
            .into_iter()
            .filter(|w| matches_any(search, &[&w.name]))
            .collect();
        waters.sort_by(|a, b| a.name.cmp(&b.name));
        waters
    }

    pub fn get_water_profile(&mut self, name: &str) -> Option<Water> {
        let all = self.get_water_profiles(None);
        lookup(all, name, |_| false)
    }

    // === Styles ===

    pub fn get_styles(&mut self, search: Option<&str>, category: Option<&str>) -> Vec<Style> {
        let mut styles: Vec<Style> = self
            .catalog::<Style>()
            .into_iter()
            .filter(|s| matches_any(search, &[&s.name, &s.category]))
            .filter(|s| matches_any(category, &[&s.category]))
            .collect();
        styles.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        styles
    }

    pub fn get_style(&mut self, name: &str) -> Option<Style> {
        let all = self.get_styles(None, None);
        let searched = self.get_styles(Some(name), None);
        lookup(all, name, |_| false).or_else(|| searched.into_iter().next())
    }

    // === Equipment ===

    /// All equipment profiles, including ones stored as repeated top-level
    /// elements. The file is always re-read.
    pub fn get_equipment_profiles(&mut self) -> Vec<Equipment> {
        let file = Equipment::SCHEMA.file.unwrap_or("Equipment.bsmx");
        self.reader.evict(file);
        let mut equipment = self.catalog::<Equipment>();
        match self.reader.read_text(file) {
            Some(text) => recover_duplicate_roots(&text, &mut equipment),
            None => tracing::debug!(file, "no equipment file to scan for extra roots"),
        }
        equipment.sort_by(|a, b| a.name.cmp(&b.name));
        equipment
    }

    pub fn get_equipment(&mut self, name: &str) -> Option<Equipment> {
        let all = self.get_equipment_profiles();
        lookup(all, name, |_| false)
    }

    // === Mash ===

    pub fn get_mash_profiles(&mut self) -> Vec<MashProfile> {
        let mut profiles = self.catalog::<MashProfile>();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    pub fn get_mash_profile(&mut self, name: &str) -> Option<MashProfile> {
        let all = self.get_mash_profiles();
        lookup(all, name, |_| false)
    }

    // === Misc, carbonation, age ===

    pub fn get_misc_ingredients(&mut self, search: Option<&str>) -> Vec<Misc> {
        self.named_catalog(search)
    }

    pub fn get_misc(&mut self, name: &str) -> Option<Misc> {
        let all = self.get_misc_ingredients(None);
        lookup(all, name, |_| false)
    }

    pub fn get_carbonation_profiles(&mut self, search: Option<&str>) -> Vec<Carbonation> {
        self.named_catalog(search)
    }

    pub fn get_carbonation(&mut self, name: &str) -> Option<Carbonation> {
        let all = self.get_carbonation_profiles(None);
        lookup(all, name, |_| false)
    }

    pub fn get_age_profiles(&mut self, search: Option<&str>) -> Vec<AgeProfile> {
        self.named_catalog(search)
    }

    pub fn get_age_profile(&mut self, name: &str) -> Option<AgeProfile> {
        let all = self.get_age_profiles(None);
        lookup(all, name, |_| false)
    }

    fn named_catalog<E: Entity>(&mut self, search: Option<&str>) -> Vec<E> {
        let mut items: Vec<E> = self
            .catalog::<E>()
            .into_iter()
            .filter(|e| matches_any(search, &[e.name()]))
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()));
        items
    }

    // === Recipes ===

    /// Local recipes followed by cloud recipes, in file order.
    pub fn recipes(&mut self) -> Vec<Recipe> {
        let mut recipes = Vec::new();
        if let Some(doc) = self.reader.read(RECIPE_FILE) {
            recipes.extend(walk_document(&doc, ROOT_FOLDER));
        }
        if let Some(doc) = self.reader.read(CLOUD_FILE) {
            recipes.extend(walk_document(&doc, CLOUD_FOLDER));
        }
        recipes
    }

    /// Recipe summaries, filtered by folder and name substrings and sorted
    /// by folder, then name.
    pub fn list_recipes(&mut self, folder: Option<&str>, search: Option<&str>) -> Vec<RecipeSummary> {
        let mut summaries: Vec<RecipeSummary> = self
            .recipes()
            .iter()
            .filter(|r| matches_any(folder, &[&r.folder]))
            .filter(|r| matches_any(search, &[&r.name]))
            .map(RecipeSummary::from)
            .collect();
        summaries.sort_by(|a, b| (&a.folder, &a.name).cmp(&(&b.folder, &b.name)));
        summaries
    }

    /// Find a recipe by exact id, then exact name, then name substring.
    pub fn get_recipe(&mut self, name_or_id: &str) -> Option<Recipe> {
        let recipes = self.recipes();
        if let Some(r) = recipes.iter().find(|r| r.id == name_or_id) {
            return Some(r.clone());
        }
        lookup(recipes, name_or_id, |_| false)
    }

    // === Cross-catalog ===

    /// Search hops, grains, yeasts and misc at once, keeping at most
    /// [`SEARCH_LIMIT`] hits per kind. An empty `kinds` searches all four.
    pub fn search_ingredients(&mut self, query: &str, kinds: &[IngredientKind]) -> IngredientHits {
        let wanted = |k: IngredientKind| kinds.is_empty() || kinds.contains(&k);
        let mut hits = IngredientHits::default();
        if wanted(IngredientKind::Hop) {
            hits.hops = first_n(self.get_hops(Some(query), None));
        }
        if wanted(IngredientKind::Grain) {
            hits.grains = first_n(self.get_grains(Some(query), None));
        }
        if wanted(IngredientKind::Yeast) {
            hits.yeasts = first_n(self.get_yeasts(Some(query), None));
        }
        if wanted(IngredientKind::Misc) {
            hits.miscs = first_n(self.get_misc_ingredients(Some(query)));
        }
        hits
    }

    /// Matching candidates for every hop, grain, yeast and misc item.
    pub fn candidates(&mut self) -> Vec<Candidate> {
        let mut out = Vec::new();
        for hop in self.get_hops(None, None) {
            let mut keywords = keywords(&hop.name);
            keywords.extend(keywords_of(&hop.origin));
            out.push(candidate(&hop, IngredientKind::Hop, keywords));
        }
        for grain in self.get_grains(None, None) {
            let mut keywords = keywords(&grain.name);
            keywords.extend(keywords_of(&grain.origin));
            keywords.extend(keywords_of(&grain.supplier));
            out.push(candidate(&grain, IngredientKind::Grain, keywords));
        }
        for yeast in self.get_yeasts(None, None) {
            let mut keywords = keywords(&yeast.name);
            if !yeast.product_id.is_empty() {
                keywords.push(yeast.product_id.to_lowercase());
            }
            keywords.extend(keywords_of(&yeast.lab));
            out.push(candidate(&yeast, IngredientKind::Yeast, keywords));
        }
        for misc in self.get_misc_ingredients(None) {
            let keywords = keywords(&misc.name);
            out.push(candidate(&misc, IngredientKind::Misc, keywords));
        }
        out
    }
}

fn candidate<E: Entity + HasId>(item: &E, kind: IngredientKind, keywords: Vec<String>) -> Candidate {
    Candidate {
        name: item.name().to_string(),
        kind,
        id: item.id().to_string(),
        keywords,
    }
}

/// Ingredient kinds that carry a permanent id.
trait HasId {
    fn id(&self) -> &str;
}

macro_rules! has_id {
    ($($ty:ty),*) => {
        $(impl HasId for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

has_id!(Hop, Grain, Yeast, Misc);

fn first_n<T>(mut items: Vec<T>) -> Vec<T> {
    items.truncate(SEARCH_LIMIT);
    items
}

/// True when there is no search term or any field contains it.
fn matches_any(search: Option<&str>, fields: &[&str]) -> bool {
    match search {
        None => true,
        Some(s) if s.is_empty() => true,
        Some(s) => {
            let needle = s.to_lowercase();
            fields.iter().any(|f| f.to_lowercase().contains(&needle))
        }
    }
}

/// Exact (case-insensitive) name or `also_exact`, then first name substring.
fn lookup<E: Entity>(items: Vec<E>, name: &str, also_exact: impl Fn(&E) -> bool) -> Option<E> {
    let wanted = name.trim().to_lowercase();
    if let Some(pos) = items
        .iter()
        .position(|e| e.name().to_lowercase() == wanted || also_exact(e))
    {
        return items.into_iter().nth(pos);
    }
    items
        .into_iter()
        .find(|e| e.name().to_lowercase().contains(&wanted))
}

const STOP_WORDS: &[&str] = &[
    "malt", "malted", "hops", "hop", "yeast", "grain", "extract", "liquid", "dry",
];

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z]+\b").unwrap());

/// Lower-cased words of three or more letters, minus parentheticals and
/// generic brewing terms.
pub fn keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let stripped = PARENTHETICAL.replace_all(&lower, "");
    WORD.find_iter(&stripped)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn keywords_of(text: &str) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else {
        keywords(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn library(files: &[(&str, &str)]) -> (TempDir, Library) {
        let tmp = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(tmp.path().join(name), body).unwrap();
        }
        let lib = Library::open(tmp.path()).unwrap();
        (tmp, lib)
    }

    const HOPS: &str = "<Hops><Data>\
        <Hops><F_H_NAME>Cascade (US)</F_H_NAME><F_H_ORIGIN>US</F_H_ORIGIN><F_H_TYPE>2</F_H_TYPE></Hops>\
        <Hops><F_H_NAME>Saaz</F_H_NAME><F_H_ORIGIN>Czech Republic</F_H_ORIGIN><F_H_TYPE>1</F_H_TYPE></Hops>\
        <Hops><F_H_NAME>Cascade</F_H_NAME><F_H_ORIGIN>US</F_H_ORIGIN><F_H_TYPE>2</F_H_TYPE></Hops>\
        <Hops><F_H_NAME>Amarillo</F_H_NAME><F_H_ORIGIN>US</F_H_ORIGIN><F_H_TYPE>2</F_H_TYPE></Hops>\
        </Data></Hops>";

    #[test]
    fn test_hop_search_filter_and_order() {
        let (_tmp, mut lib) = library(&[("Hops.bsmx", HOPS)]);
        let names: Vec<String> = lib.get_hops(None, None).into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Amarillo", "Cascade", "Cascade (US)", "Saaz"]);

        let czech: Vec<String> = lib.get_hops(Some("czech"), None).into_iter().map(|h| h.name).collect();
        assert_eq!(czech, vec!["Saaz"]);

        assert_eq!(lib.get_hops(None, Some(1)).len(), 1);
        assert_eq!(lib.get_hops(Some("cascade"), Some(2)).len(), 2);
    }

    #[test]
    fn test_exact_lookup_beats_substring() {
        let (_tmp, mut lib) = library(&[("Hops.bsmx", HOPS)]);
        assert_eq!(lib.get_hop("cascade").unwrap().name, "Cascade");
        assert_eq!(lib.get_hop("amar").unwrap().name, "Amarillo");
        // No name contains "czech"; the search on origin still finds Saaz.
        assert_eq!(lib.get_hop("czech").unwrap().name, "Saaz");
        assert!(lib.get_hop("Citra").is_none());
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let (_tmp, mut lib) = library(&[]);
        assert!(lib.get_grains(None, None).is_empty());
        assert!(lib.get_equipment_profiles().is_empty());
        assert!(lib.recipes().is_empty());
    }

    #[test]
    fn test_yeast_order_and_product_id_lookup() {
        let yeasts = "<Yeast><Data>\
            <Yeast><F_Y_NAME>SafAle American</F_Y_NAME><F_Y_LAB>Fermentis</F_Y_LAB><F_Y_PRODUCT_ID>US-05</F_Y_PRODUCT_ID></Yeast>\
            <Yeast><F_Y_NAME>American Ale</F_Y_NAME><F_Y_LAB>Wyeast Labs</F_Y_LAB><F_Y_PRODUCT_ID>1056</F_Y_PRODUCT_ID></Yeast>\
            <Yeast><F_Y_NAME>California Ale</F_Y_NAME><F_Y_LAB>White Labs</F_Y_LAB><F_Y_PRODUCT_ID>WLP001</F_Y_PRODUCT_ID></Yeast>\
            </Data></Yeast>";
        let (_tmp, mut lib) = library(&[("Yeast.bsmx", yeasts)]);
        let labs: Vec<String> = lib.get_yeasts(None, None).into_iter().map(|y| y.lab).collect();
        assert_eq!(labs, vec!["Fermentis", "White Labs", "Wyeast Labs"]);

        assert_eq!(lib.get_yeasts(None, Some("labs")).len(), 2);
        assert_eq!(lib.get_yeast("1056").unwrap().name, "American Ale");
        assert_eq!(lib.get_yeast("us-05").unwrap().lab, "Fermentis");
    }

    #[test]
    fn test_styles_sorted_by_category() {
        let styles = "<Style><Data>\
            <Style><F_S_NAME>Munich Helles</F_S_NAME><F_S_CATEGORY>Pale Malty European Lager</F_S_CATEGORY></Style>\
            <Style><F_S_NAME>American IPA</F_S_NAME><F_S_CATEGORY>IPA</F_S_CATEGORY></Style>\
            <Style><F_S_NAME>Double IPA</F_S_NAME><F_S_CATEGORY>IPA</F_S_CATEGORY></Style>\
            </Data></Style>";
        let (_tmp, mut lib) = library(&[("Style.bsmx", styles)]);
        let names: Vec<String> = lib.get_styles(None, None).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["American IPA", "Double IPA", "Munich Helles"]);
        assert_eq!(lib.get_styles(None, Some("lager")).len(), 1);
        assert_eq!(lib.get_style("double").unwrap().name, "Double IPA");
    }

    #[test]
    fn test_equipment_recovers_repeated_roots() {
        let equipment = "<Equipment><Data>\
            <Equipment><F_E_NAME>Pot</F_E_NAME></Equipment>\
            </Data></Equipment>\n\
            <Equipment><F_E_NAME>Brewzilla</F_E_NAME></Equipment>\n\
            <Equipment><F_E_NAME>pot</F_E_NAME></Equipment>\n";
        let (_tmp, mut lib) = library(&[("Equipment.bsmx", equipment)]);
        let names: Vec<String> = lib.get_equipment_profiles().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Brewzilla", "Pot"]);
        assert_eq!(lib.get_equipment("brew").unwrap().name, "Brewzilla");
    }

    #[test]
    fn test_equipment_from_bare_fragments() {
        let equipment = "<Equipment><F_E_NAME>Pot</F_E_NAME></Equipment>\n\
            <Equipment><F_E_NAME>Kettle</F_E_NAME></Equipment>\n";
        let (_tmp, mut lib) = library(&[("Equipment.bsmx", equipment)]);
        let names: Vec<String> = lib.get_equipment_profiles().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Kettle", "Pot"]);
    }

    #[test]
    fn test_recipe_listing_and_lookup() {
        let recipes = "<Recipe><Data>\
            <Table><Name>Ales</Name><Data>\
              <Recipe><_PERMID_>11</_PERMID_><F_R_NAME>Pale Ale</F_R_NAME>\
                <F_R_STYLE><F_S_NAME>American Pale Ale</F_S_NAME></F_R_STYLE></Recipe>\
              <Recipe><_PERMID_>12</_PERMID_><F_R_NAME>Brown Ale</F_R_NAME></Recipe>\
            </Data></Table>\
            <Recipe><_PERMID_>13</_PERMID_><F_R_NAME>House Lager</F_R_NAME></Recipe>\
            </Data></Recipe>";
        let cloud = "<Cloud><Data><Cloud><F_C_RECIPE><_PERMID_>99</_PERMID_>\
            <F_R_NAME>Pale Ale Clone</F_R_NAME></F_C_RECIPE></Cloud></Data></Cloud>";
        let (_tmp, mut lib) = library(&[("Recipe.bsmx", recipes), ("Cloud.bsmx", cloud)]);

        let listed: Vec<(String, String)> = lib
            .list_recipes(None, None)
            .into_iter()
            .map(|s| (s.folder, s.name))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("/".to_string(), "House Lager".to_string()),
                ("/Ales/".to_string(), "Brown Ale".to_string()),
                ("/Ales/".to_string(), "Pale Ale".to_string()),
                ("/Cloud/".to_string(), "Pale Ale Clone".to_string()),
            ]
        );
        assert_eq!(lib.list_recipes(Some("cloud"), None).len(), 1);
        assert_eq!(lib.list_recipes(None, Some("pale")).len(), 2);
        assert_eq!(lib.list_recipes(Some("ales"), None)[1].style, "American Pale Ale");

        assert_eq!(lib.get_recipe("99").unwrap().name, "Pale Ale Clone");
        assert_eq!(lib.get_recipe("pale ale").unwrap().id, "11");
        assert_eq!(lib.get_recipe("lager").unwrap().id, "13");
        assert!(lib.get_recipe("stout").is_none());
    }

    #[test]
    fn test_search_ingredients_by_kind() {
        let (_tmp, mut lib) = library(&[("Hops.bsmx", HOPS)]);
        let hits = lib.search_ingredients("cascade", &[]);
        assert_eq!(hits.hops.len(), 2);
        assert!(hits.grains.is_empty());

        let none = lib.search_ingredients("cascade", &[IngredientKind::Grain]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_keywords() {
        assert_eq!(keywords("Pale Malt (2 Row) US"), vec!["pale"]);
        assert_eq!(keywords("Safale American Dry Yeast"), vec!["safale", "american"]);
        assert!(keywords("").is_empty());
    }

    #[test]
    fn test_candidates() {
        let grains = "<Grain><Data>\
            <Grain><_PERMID_>7</_PERMID_><F_G_NAME>Pilsner Malt</F_G_NAME><F_G_ORIGIN>Germany</F_G_ORIGIN>\
            <F_G_SUPPLIER>Weyermann</F_G_SUPPLIER></Grain>\
            </Data></Grain>";
        let yeasts = "<Yeast><Data><Yeast><F_Y_NAME>American Ale</F_Y_NAME>\
            <F_Y_LAB>Wyeast Labs</F_Y_LAB><F_Y_PRODUCT_ID>1056</F_Y_PRODUCT_ID></Yeast></Data></Yeast>";
        let (_tmp, mut lib) = library(&[("Hops.bsmx", HOPS), ("Grain.bsmx", grains), ("Yeast.bsmx", yeasts)]);
        let candidates = lib.candidates();
        assert_eq!(candidates.len(), 6);

        let grain = candidates.iter().find(|c| c.kind == IngredientKind::Grain).unwrap();
        assert_eq!(grain.id, "7");
        assert_eq!(grain.keywords, vec!["pilsner", "germany", "weyermann"]);

        let yeast = candidates.iter().find(|c| c.kind == IngredientKind::Yeast).unwrap();
        assert_eq!(yeast.keywords, vec!["american", "ale", "1056", "wyeast", "labs"]);
    }
}
