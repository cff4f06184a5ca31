//! Recursive recipe tree walker.
//!
//! Recipe files nest recipes inside folder elements (`Table`), generic
//! `Data` containers and, for cloud recipes, `Cloud` wrappers. [`walk`]
//! descends through all of them, building the folder path from the `Name`
//! of every `Table` it passes through.
//!
//! A recipe whose own fields fail validation is dropped. Its embedded
//! profiles and ingredient line items are parsed one by one afterwards;
//! a failing one is logged and left out while the recipe itself is kept.

use crate::document::{Document, NodeId};
use crate::extract::{parse_entity, CONTAINER};
use crate::models::{
    AgeProfile, Carbonation, Equipment, Grain, Hop, MashProfile, Misc, Recipe, Style, Water, Yeast,
};
use crate::record::{self, to_record};
use crate::schema::Entity;

/// Folder path of recipes stored in the primary recipe file.
pub const ROOT_FOLDER: &str = "/";
/// Folder path of recipes stored in the cloud recipe file.
pub const CLOUD_FOLDER: &str = "/Cloud/";

const FOLDER: &str = "Table";
const CLOUD: &str = "Cloud";
const CLOUD_RECIPE: &str = "F_C_RECIPE";
const INGREDIENTS: &str = "Ingredients";

/// Every recipe below any root of the document.
pub fn walk_document(doc: &Document, root_folder: &str) -> Vec<Recipe> {
    doc.roots()
        .iter()
        .flat_map(|&root| walk(doc, root, root_folder))
        .collect()
}

/// Collect the recipes below `id`, assigning `folder` to those that do not
/// declare a folder of their own.
pub fn walk(doc: &Document, id: NodeId, folder: &str) -> Vec<Recipe> {
    let mut recipes = Vec::new();

    for table in doc.find_children(id, FOLDER) {
        let name = doc.child_text(table, "Name").unwrap_or("");
        if let Some(data) = doc.find_child(table, CONTAINER) {
            let path = format!("{}{}/", folder, name);
            recipes.extend(walk(doc, data, &path));
        }
    }

    for element in doc.find_children(id, Recipe::SCHEMA.element) {
        if let Some(recipe) = parse_recipe(doc, element) {
            recipes.push(place(recipe, folder));
        }
    }

    for cloud in doc.find_children(id, CLOUD) {
        if let Some(element) = doc.find_child(cloud, CLOUD_RECIPE) {
            if let Some(recipe) = parse_recipe(doc, element) {
                recipes.push(place(recipe, folder));
            }
        }
    }

    for data in doc.find_children(id, CONTAINER) {
        recipes.extend(walk(doc, data, folder));
    }

    recipes
}

fn place(mut recipe: Recipe, folder: &str) -> Recipe {
    if recipe.folder.is_empty() || recipe.folder == "/" {
        recipe.folder = folder.to_string();
    }
    recipe
}

/// Parse one recipe element. Returns `None` when the recipe's own fields
/// do not validate.
pub fn parse_recipe(doc: &Document, id: NodeId) -> Option<Recipe> {
    match parse_entity::<Recipe>(doc, id) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            let record = to_record(doc, id);
            let name = record::label(&record, "f_r_name");
            tracing::warn!(recipe = %name, error = %e, "failed to parse recipe '{}'", name);
            None
        }
    }
}

/// Attach the embedded profiles and ingredient line items of a recipe
/// element. Each one is parsed independently.
pub(crate) fn hydrate_recipe(recipe: &mut Recipe, doc: &Document, id: NodeId) {
    recipe.style = embedded::<Style>(recipe, doc, id, "F_R_STYLE");
    recipe.equipment = embedded::<Equipment>(recipe, doc, id, "F_R_EQUIPMENT");
    recipe.mash = embedded::<MashProfile>(recipe, doc, id, "F_R_MASH");
    recipe.carbonation = embedded::<Carbonation>(recipe, doc, id, "F_R_CARB");
    recipe.age = embedded::<AgeProfile>(recipe, doc, id, "F_R_AGE");

    let Some(data) = doc
        .find_child(id, INGREDIENTS)
        .and_then(|ingredients| doc.find_child(ingredients, CONTAINER))
    else {
        return;
    };
    recipe.grains = line_items::<Grain>(recipe, doc, data);
    recipe.hops = line_items::<Hop>(recipe, doc, data);
    recipe.yeasts = line_items::<Yeast>(recipe, doc, data);
    recipe.miscs = line_items::<Misc>(recipe, doc, data);
    recipe.waters = line_items::<Water>(recipe, doc, data);
}

fn embedded<E: Entity>(recipe: &Recipe, doc: &Document, id: NodeId, tag: &str) -> Option<E> {
    let element = doc.find_child(id, tag)?;
    match parse_entity::<E>(doc, element) {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!(
                recipe = %recipe.name,
                kind = E::SCHEMA.kind,
                error = %e,
                "failed to parse embedded {}",
                E::SCHEMA.kind
            );
            None
        }
    }
}

fn line_items<E: Entity>(recipe: &Recipe, doc: &Document, data: NodeId) -> Vec<E> {
    let mut items = Vec::new();
    for element in doc.find_children(data, E::SCHEMA.element) {
        match parse_entity::<E>(doc, element) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(
                recipe = %recipe.name,
                kind = E::SCHEMA.kind,
                error = %e,
                "skipping invalid {} in recipe",
                E::SCHEMA.kind
            ),
        }
    }
    items
}
