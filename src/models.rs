//! Typed entities stored in BeerSmith library files.
//!
//! Every entity is declared through [`entity!`], so its field table (tag,
//! kind, required flag) sits right next to the struct it fills. Recipe
//! ingredient line items reuse the catalog types: a hop inside a recipe is a
//! [`Hop`] carrying its own denormalized copy of the variety's data plus the
//! recipe quantities (`amount`, `boil_time`, `usage`).

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};
use crate::extract::parse_entity;
use crate::recipes::hydrate_recipe;
use crate::schema::Entity;

entity! {
    #[entity(kind = "hop", element = "Hops", prefix = "F_H_", file = "Hops.bsmx")]
    /// A hop variety. `amount` is in ounces, times in minutes.
    pub struct Hop {
        id: Text = "_PERMID_";
        name: Text = "F_H_NAME" [required];
        origin: Text = "F_H_ORIGIN";
        alpha: Float = "F_H_ALPHA";
        beta: Float = "F_H_BETA";
        hop_type: Int = "F_H_TYPE";
        form: Int = "F_H_FORM";
        hsi: Float = "F_H_HSI";
        notes: Text = "F_H_NOTES";
        amount: Float = "F_H_AMOUNT";
        boil_time: Float = "F_H_BOIL_TIME";
        dry_hop_time: Float = "F_H_DRY_HOP_TIME";
        usage: Int = "F_H_USE";
        inventory: Float = "F_H_INVENTORY";
        price: Float = "F_H_PRICE";
    }
}

entity! {
    #[entity(kind = "grain", element = "Grain", prefix = "F_G_", file = "Grain.bsmx")]
    /// A fermentable. `yield_pct` is percent extract, `color` in Lovibond.
    pub struct Grain {
        id: Text = "_PERMID_";
        name: Text = "F_G_NAME" [required];
        origin: Text = "F_G_ORIGIN";
        supplier: Text = "F_G_SUPPLIER";
        color: Float = "F_G_COLOR";
        yield_pct: Float = "F_G_YIELD";
        grain_type: Int = "F_G_TYPE";
        moisture: Float = "F_G_MOISTURE";
        diastatic_power: Float = "F_G_DIASTATIC_POWER";
        protein: Float = "F_G_PROTEIN";
        max_in_batch: Float = "F_G_MAX_IN_BATCH";
        recommend_mash: Bool = "F_G_RECOMMEND_MASH";
        notes: Text = "F_G_NOTES";
        amount: Float = "F_G_AMOUNT";
        usage: Int = "F_G_USE";
        inventory: Float = "F_G_INVENTORY";
        price: Float = "F_G_PRICE";
    }
}

entity! {
    #[entity(kind = "yeast", element = "Yeast", prefix = "F_Y_", file = "Yeast.bsmx")]
    pub struct Yeast {
        id: Text = "_PERMID_";
        name: Text = "F_Y_NAME" [required];
        lab: Text = "F_Y_LAB";
        product_id: Text = "F_Y_PRODUCT_ID";
        yeast_type: Int = "F_Y_TYPE";
        form: Int = "F_Y_FORM";
        flocculation: Int = "F_Y_FLOCCULATION";
        min_attenuation: Float = "F_Y_MIN_ATTENUATION";
        max_attenuation: Float = "F_Y_MAX_ATTENUATION";
        min_temp: Float = "F_Y_MIN_TEMP";
        max_temp: Float = "F_Y_MAX_TEMP";
        best_for: Text = "F_Y_BEST_FOR";
        notes: Text = "F_Y_NOTES";
        amount: Float = "F_Y_AMOUNT";
        use_starter: Bool = "F_Y_USE_STARTER";
        inventory: Float = "F_Y_INVENTORY";
        price: Float = "F_Y_PRICE";
    }
}

entity! {
    #[entity(kind = "water", element = "Water", prefix = "F_W_", file = "Water.bsmx")]
    /// A water profile; ion concentrations in ppm.
    pub struct Water {
        id: Text = "_PERMID_";
        name: Text = "F_W_NAME" [required];
        calcium: Float = "F_W_CALCIUM";
        magnesium: Float = "F_W_MAGNESIUM";
        sodium: Float = "F_W_SODIUM";
        sulfate: Float = "F_W_SULFATE";
        chloride: Float = "F_W_CHLORIDE";
        bicarb: Float = "F_W_BICARB";
        ph: Float = "F_W_PH";
        notes: Text = "F_W_NOTES";
        amount: Float = "F_W_AMOUNT";
    }
}

entity! {
    #[entity(kind = "style", element = "Style", prefix = "F_S_", file = "Style.bsmx")]
    pub struct Style {
        id: Text = "_PERMID_";
        name: Text = "F_S_NAME" [required];
        category: Text = "F_S_CATEGORY";
        guide: Text = "F_S_GUIDE";
        letter: Text = "F_S_LETTER";
        number: Int = "F_S_NUMBER";
        style_type: Int = "F_S_TYPE";
        min_og: Float = "F_S_MIN_OG";
        max_og: Float = "F_S_MAX_OG";
        min_fg: Float = "F_S_MIN_FG";
        max_fg: Float = "F_S_MAX_FG";
        min_ibu: Float = "F_S_MIN_IBU";
        max_ibu: Float = "F_S_MAX_IBU";
        min_color: Float = "F_S_MIN_COLOR";
        max_color: Float = "F_S_MAX_COLOR";
        min_abv: Float = "F_S_MIN_ABV";
        max_abv: Float = "F_S_MAX_ABV";
        description: Text = "F_S_DESCRIPTION";
        profile: Text = "F_S_PROFILE";
        ingredients: Text = "F_S_INGREDIENTS";
        examples: Text = "F_S_EXAMPLES";
    }
}

entity! {
    #[entity(kind = "equipment", element = "Equipment", prefix = "F_E_", file = "Equipment.bsmx")]
    /// An equipment profile. Volumes in fluid ounces, times in minutes.
    pub struct Equipment {
        id: Text = "_PERMID_";
        name: Text = "F_E_NAME" [required];
        batch_vol: Float = "F_E_BATCH_VOL";
        boil_vol: Float = "F_E_BOIL_VOL";
        boil_time: Float = "F_E_BOIL_TIME";
        boil_off: Float = "F_E_BOIL_OFF";
        trub_loss: Float = "F_E_TRUB_LOSS";
        fermenter_loss: Float = "F_E_FERMENTER_LOSS";
        mash_vol: Float = "F_E_MASH_VOL";
        efficiency: Float = "F_E_EFFICIENCY";
        hop_util: Float = "F_E_HOP_UTIL";
        calc_boil_vol: Bool = "F_E_CALC_BOIL";
        notes: Text = "F_E_NOTES";
    }
}

entity! {
    #[entity(kind = "mash step", element = "MashStep", prefix = "F_MS_")]
    pub struct MashStep {
        name: Text = "F_MS_NAME" [required];
        step_type: Int = "F_MS_TYPE";
        step_temp: Float = "F_MS_STEP_TEMP";
        step_time: Float = "F_MS_STEP_TIME";
        rise_time: Float = "F_MS_RISE_TIME";
        infusion: Float = "F_MS_INFUSION";
        infusion_temp: Float = "F_MS_INFUSION_TEMP";
        decoction_amt: Float = "F_MS_DECOCTION_AMT";
    }
}

entity! {
    #[entity(kind = "mash profile", element = "MashProfile", prefix = "F_MH_", file = "Mash.bsmx",
        hydrate = hydrate_mash)]
    /// A mash profile and its ordered steps.
    pub struct MashProfile {
        id: Text = "_PERMID_";
        name: Text = "F_MH_NAME" [required];
        grain_temp: Float = "F_MH_GRAIN_TEMP";
        tun_temp: Float = "F_MH_TUN_TEMP";
        sparge_temp: Float = "F_MH_SPARGE_TEMP";
        ph: Float = "F_MH_PH";
        notes: Text = "F_MH_NOTES";
    }
    owns {
        steps: Vec<MashStep>,
    }
}

fn hydrate_mash(mash: &mut MashProfile, doc: &Document, id: NodeId) {
    let Some(data) = doc
        .find_child(id, "steps")
        .and_then(|steps| doc.find_child(steps, "Data"))
    else {
        return;
    };
    for step in doc.find_children(data, MashStep::SCHEMA.element) {
        match parse_entity::<MashStep>(doc, step) {
            Ok(s) => mash.steps.push(s),
            Err(e) => tracing::warn!(mash = %mash.name, error = %e, "skipping invalid mash step"),
        }
    }
}

entity! {
    #[entity(kind = "misc", element = "Misc", prefix = "F_M_", file = "Misc.bsmx")]
    pub struct Misc {
        id: Text = "_PERMID_";
        name: Text = "F_M_NAME" [required];
        misc_type: Int = "F_M_TYPE";
        usage: Int = "F_M_USE";
        time: Float = "F_M_TIME";
        amount: Float = "F_M_AMOUNT";
        units: Int = "F_M_UNITS";
        use_for: Text = "F_M_USE_FOR";
        notes: Text = "F_M_NOTES";
        inventory: Float = "F_M_INVENTORY";
        price: Float = "F_M_PRICE";
    }
}

entity! {
    #[entity(kind = "carbonation", element = "Carbonation", prefix = "F_C_", file = "Carbonation.bsmx")]
    pub struct Carbonation {
        id: Text = "_PERMID_";
        name: Text = "F_C_NAME" [required];
        carb_type: Int = "F_C_TYPE";
        temperature: Float = "F_C_TEMPERATURE";
        primer_name: Text = "F_C_PRIMER_NAME";
        carb_rate: Float = "F_C_CARB_RATE";
        notes: Text = "F_C_NOTES";
    }
}

entity! {
    #[entity(kind = "age profile", element = "Age", prefix = "F_A_", file = "Age.bsmx")]
    /// Fermentation and aging schedule. Temperatures in °F, durations in days.
    pub struct AgeProfile {
        id: Text = "_PERMID_";
        name: Text = "F_A_NAME" [required];
        age_type: Int = "F_A_TYPE";
        prim_temp: Float = "F_A_PRIM_TEMP";
        prim_days: Float = "F_A_PRIM_DAYS";
        sec_temp: Float = "F_A_SEC_TEMP";
        sec_days: Float = "F_A_SEC_DAYS";
        tert_temp: Float = "F_A_TERT_TEMP";
        tert_days: Float = "F_A_TERT_DAYS";
        age_temp: Float = "F_A_AGE_TEMP";
        age_days: Float = "F_A_AGE_DAYS";
        notes: Text = "F_A_NOTES";
    }
}

entity! {
    #[entity(kind = "recipe", element = "Recipe", prefix = "F_R_", file = "Recipe.bsmx",
        hydrate = hydrate_recipe)]
    /// A fully hydrated recipe.
    ///
    /// Embedded profiles and ingredient line items are owned copies frozen at
    /// parse time; later catalog edits never reach an already parsed recipe.
    pub struct Recipe {
        id: Text = "_PERMID_";
        name: Text = "F_R_NAME" [required];
        brewer: Text = "F_R_BREWER";
        asst_brewer: Text = "F_R_ASST_BREWER";
        recipe_date: Text = "F_R_DATE";
        folder: Text = "F_R_FOLDER_NAME";
        recipe_type: Int = "F_R_TYPE";
        og: Float = "F_R_OG";
        fg: Float = "F_R_FG";
        ibu: Float = "F_R_IBU";
        color_srm: Float = "F_R_COLOR";
        abv: Float = "F_R_ABV";
        boil_time: Float = "F_R_BOIL_TIME";
        batch_vol: Float = "F_R_BATCH_VOL";
        efficiency: Float = "F_R_EFFICIENCY";
        notes: Text = "F_R_NOTES";
        taste_notes: Text = "F_R_TASTE_NOTES";
    }
    owns {
        style: Option<Style>,
        equipment: Option<Equipment>,
        mash: Option<MashProfile>,
        carbonation: Option<Carbonation>,
        age: Option<AgeProfile>,
        grains: Vec<Grain>,
        hops: Vec<Hop>,
        yeasts: Vec<Yeast>,
        miscs: Vec<Misc>,
        waters: Vec<Water>,
    }
}

/// Listing view of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub style: String,
    pub og: f64,
    pub fg: f64,
    pub ibu: f64,
    pub abv: f64,
    pub color_srm: f64,
    pub folder: String,
}

impl From<&Recipe> for RecipeSummary {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            style: r.style.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
            og: r.og,
            fg: r.fg,
            ibu: r.ibu,
            abv: r.abv,
            color_srm: r.color_srm,
            folder: r.folder.clone(),
        }
    }
}

/// Ingredient kinds covered by cross-catalog search and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientKind {
    Hop,
    Grain,
    Yeast,
    Misc,
}

impl IngredientKind {
    pub const ALL: [IngredientKind; 4] = [
        IngredientKind::Hop,
        IngredientKind::Grain,
        IngredientKind::Yeast,
        IngredientKind::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientKind::Hop => "hop",
            IngredientKind::Grain => "grain",
            IngredientKind::Yeast => "yeast",
            IngredientKind::Misc => "misc",
        }
    }
}

impl std::str::FromStr for IngredientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hop" | "hops" => Ok(IngredientKind::Hop),
            "grain" | "grains" => Ok(IngredientKind::Grain),
            "yeast" | "yeasts" => Ok(IngredientKind::Yeast),
            "misc" => Ok(IngredientKind::Misc),
            other => Err(format!("unknown ingredient kind: '{}'", other)),
        }
    }
}

/// A matching candidate handed to the fuzzy matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub kind: IngredientKind,
    pub id: String,
    pub keywords: Vec<String>,
}

/// Cross-catalog search results, grouped by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngredientHits {
    pub hops: Vec<Hop>,
    pub grains: Vec<Grain>,
    pub yeasts: Vec<Yeast>,
    pub miscs: Vec<Misc>,
}

impl IngredientHits {
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty() && self.grains.is_empty() && self.yeasts.is_empty() && self.miscs.is_empty()
    }
}
