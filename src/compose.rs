//! Building a recipe from catalog names.
//!
//! A [`RecipeDraft`] names its style, equipment, yeast, grains and hops;
//! [`Library::build_recipe`] resolves every name with the same lookups the
//! read API uses and copies the catalog data into the recipe's line items.
//! Any name that resolves to nothing fails the whole build, so
//! [`Library::create_recipe`] never reaches the file with a partial recipe.

use serde::Deserialize;

use crate::catalog::Library;
use crate::error::{Result, WriteError};
use crate::models::{Equipment, Grain, Hop, Recipe, Style, Yeast};
use crate::schema::Entity;
use crate::write::WriteReport;

const GRAMS_PER_OUNCE: f64 = 28.349_523_125;

/// Hop addition type, stored as the `F_H_USE` code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum HopUse {
    #[default]
    #[serde(rename = "boil")]
    Boil,
    #[serde(rename = "dry hop", alias = "dry_hop")]
    DryHop,
    #[serde(rename = "mash")]
    Mash,
    #[serde(rename = "first wort", alias = "first_wort")]
    FirstWort,
    #[serde(rename = "whirlpool")]
    Whirlpool,
}

impl HopUse {
    pub fn code(self) -> i64 {
        match self {
            HopUse::Boil => 0,
            HopUse::DryHop => 1,
            HopUse::Mash => 2,
            HopUse::FirstWort => 3,
            HopUse::Whirlpool => 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrainAddition {
    pub name: String,
    #[serde(default)]
    pub amount_kg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HopAddition {
    pub name: String,
    #[serde(default)]
    pub amount_g: f64,
    /// Minutes.
    #[serde(default = "default_boil_time")]
    pub time: f64,
    #[serde(default, rename = "use")]
    pub usage: HopUse,
}

/// A recipe described by catalog names and metric amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub style: String,
    pub equipment: String,
    /// Yeast name or product id.
    pub yeast: String,
    #[serde(default)]
    pub grains: Vec<GrainAddition>,
    #[serde(default)]
    pub hops: Vec<HopAddition>,
    #[serde(default = "default_boil_time")]
    pub boil_time: f64,
    #[serde(default)]
    pub brewer: String,
    #[serde(default)]
    pub notes: String,
}

fn default_boil_time() -> f64 {
    60.0
}

fn grams_to_ounces(grams: f64) -> f64 {
    grams / GRAMS_PER_OUNCE
}

fn not_found<E: Entity>(name: &str) -> WriteError {
    WriteError::EntityNotFound {
        kind: E::SCHEMA.kind,
        name: name.to_string(),
    }
}

impl Library {
    /// Resolve every name in `draft` and assemble the recipe. Reads catalogs
    /// only.
    pub fn build_recipe(&mut self, draft: &RecipeDraft) -> Result<Recipe> {
        let style = self
            .get_style(&draft.style)
            .ok_or_else(|| not_found::<Style>(&draft.style))?;
        let equipment = self
            .get_equipment(&draft.equipment)
            .ok_or_else(|| not_found::<Equipment>(&draft.equipment))?;
        let mut yeast = self
            .get_yeast(&draft.yeast)
            .ok_or_else(|| not_found::<Yeast>(&draft.yeast))?;
        yeast.amount = 1.0;

        let mut grains = Vec::with_capacity(draft.grains.len());
        for addition in &draft.grains {
            let mut grain = self
                .get_grain(&addition.name)
                .ok_or_else(|| not_found::<Grain>(&addition.name))?;
            grain.amount = grams_to_ounces(addition.amount_kg * 1000.0);
            grains.push(grain);
        }

        let mut hops = Vec::with_capacity(draft.hops.len());
        for addition in &draft.hops {
            let mut hop = self
                .get_hop(&addition.name)
                .ok_or_else(|| not_found::<Hop>(&addition.name))?;
            hop.amount = grams_to_ounces(addition.amount_g);
            hop.boil_time = addition.time;
            hop.usage = addition.usage.code();
            hops.push(hop);
        }

        Ok(Recipe {
            name: draft.name.clone(),
            brewer: draft.brewer.clone(),
            notes: draft.notes.clone(),
            boil_time: draft.boil_time,
            batch_vol: equipment.batch_vol,
            efficiency: equipment.efficiency,
            style: Some(style),
            equipment: Some(equipment),
            grains,
            hops,
            yeasts: vec![yeast],
            ..Default::default()
        })
    }

    /// Build a recipe from `draft` and add it to `folder` (or the default
    /// folder). Unknown names fail before any file is touched.
    pub fn create_recipe(&mut self, draft: &RecipeDraft, folder: Option<&str>) -> Result<WriteReport> {
        let recipe = self.build_recipe(draft)?;
        tracing::debug!(
            recipe = %recipe.name,
            grains = recipe.grains.len(),
            hops = recipe.hops.len(),
            "resolved recipe draft"
        );
        self.add_recipe(&recipe, folder)
    }
}
