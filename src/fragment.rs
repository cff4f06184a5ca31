//! Fragment rendering for the write path.
//!
//! A fragment is one new element as text, ready to be spliced into an
//! existing file. Every field is written under its schema tag:
//!
//! - floats with exactly 7 fractional digits
//! - booleans as `0`/`1`
//! - text entity-escaped, with non-ASCII forced to numeric references
//!
//! The host application writes one tag per line, so fragments do too.

use crate::entities::escape_text;
use crate::models::{MashProfile, Recipe};
use crate::schema::{Entity, FieldValue};

const PERMID: &str = "_PERMID_";

/// Today's date in the `_MOD_` format.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => escape_text(s),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => format!("{:.7}", f),
        FieldValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
    }
}

/// Render one entity under its own element tag.
pub fn render_entity<E: Entity>(entity: &E) -> String {
    let mut lines = Vec::new();
    push_element(&mut lines, E::SCHEMA.element, entity, None);
    lines.join("\n")
}

/// Render a recipe with its embedded profiles and ingredient line items.
///
/// `modified` is written as the `_MOD_` stamp and as the recipe date when
/// the recipe carries none. A recipe without a permanent id gets `0`, which
/// the host application reassigns on load.
pub fn render_recipe(recipe: &Recipe, modified: &str) -> String {
    let mut recipe = recipe.clone();
    if recipe.id.is_empty() {
        recipe.id = "0".to_string();
    }
    if recipe.recipe_date.is_empty() {
        recipe.recipe_date = modified.to_string();
    }

    let mut lines = Vec::new();
    open_element(&mut lines, Recipe::SCHEMA.element, &recipe, Some(modified));

    if let Some(style) = &recipe.style {
        push_element(&mut lines, "F_R_STYLE", style, None);
    }
    if let Some(equipment) = &recipe.equipment {
        push_element(&mut lines, "F_R_EQUIPMENT", equipment, None);
    }
    if let Some(mash) = &recipe.mash {
        push_mash(&mut lines, "F_R_MASH", mash);
    }
    if let Some(carbonation) = &recipe.carbonation {
        push_element(&mut lines, "F_R_CARB", carbonation, None);
    }
    if let Some(age) = &recipe.age {
        push_element(&mut lines, "F_R_AGE", age, None);
    }

    lines.push("<Ingredients>".to_string());
    lines.push("<Data>".to_string());
    push_all(&mut lines, &recipe.grains);
    push_all(&mut lines, &recipe.hops);
    push_all(&mut lines, &recipe.yeasts);
    push_all(&mut lines, &recipe.miscs);
    push_all(&mut lines, &recipe.waters);
    lines.push("</Data>".to_string());
    lines.push("</Ingredients>".to_string());

    lines.push(format!("</{}>", Recipe::SCHEMA.element));
    lines.join("\n")
}

fn push_all<E: Entity>(lines: &mut Vec<String>, items: &[E]) {
    for item in items {
        push_element(lines, E::SCHEMA.element, item, None);
    }
}

fn push_mash(lines: &mut Vec<String>, tag: &str, mash: &MashProfile) {
    open_element(lines, tag, mash, None);
    if !mash.steps.is_empty() {
        lines.push("<steps>".to_string());
        lines.push("<Data>".to_string());
        push_all(lines, &mash.steps);
        lines.push("</Data>".to_string());
        lines.push("</steps>".to_string());
    }
    lines.push(format!("</{}>", tag));
}

fn push_element<E: Entity>(lines: &mut Vec<String>, tag: &str, entity: &E, modified: Option<&str>) {
    open_element(lines, tag, entity, modified);
    lines.push(format!("</{}>", tag));
}

/// Opening tag plus one line per field, with the `_MOD_` stamp right after
/// the permanent id when given.
fn open_element<E: Entity>(lines: &mut Vec<String>, tag: &str, entity: &E, modified: Option<&str>) {
    lines.push(format!("<{}>", tag));
    for (spec, value) in entity.field_values() {
        lines.push(format!("<{0}>{1}</{0}>", spec.tag, render_value(&value)));
        if spec.tag == PERMID {
            if let Some(date) = modified {
                lines.push(format!("<_MOD_>{}</_MOD_>", date));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extract::parse_entity;
    use crate::models::{Grain, Hop, MashStep, Style, Yeast};
    use crate::recipes::walk_document;

    #[test]
    fn test_value_rendering() {
        assert_eq!(render_value(&FieldValue::Float(5.5)), "5.5000000");
        assert_eq!(render_value(&FieldValue::Int(3)), "3");
        assert_eq!(render_value(&FieldValue::Bool(true)), "1");
        assert_eq!(render_value(&FieldValue::Bool(false)), "0");
        assert_eq!(
            render_value(&FieldValue::Text("Kölsch & <Alt>".into())),
            "K&#246;lsch &amp; &lt;Alt&gt;"
        );
    }

    #[test]
    fn test_entity_fragment_layout() {
        let hop = Hop {
            name: "Cascade".into(),
            alpha: 5.5,
            hop_type: 2,
            ..Default::default()
        };
        let text = render_entity(&hop);
        assert!(text.starts_with("<Hops>\n<_PERMID_></_PERMID_>\n<F_H_NAME>Cascade</F_H_NAME>"));
        assert!(text.contains("<F_H_ALPHA>5.5000000</F_H_ALPHA>"));
        assert!(text.contains("<F_H_TYPE>2</F_H_TYPE>"));
        assert!(text.ends_with("</Hops>"));
        assert!(!text.contains("_MOD_"));
    }

    #[test]
    fn test_entity_round_trip() {
        let grain = Grain {
            id: "17".into(),
            name: "Weyermann® Pilsner & Co".into(),
            origin: "Germany".into(),
            color: 1.7,
            yield_pct: 81.0,
            grain_type: 0,
            recommend_mash: true,
            notes: "Use 'as is'".into(),
            ..Default::default()
        };
        let text = render_entity(&grain);
        let doc = Document::parse(&text).unwrap();
        let parsed: Grain = parse_entity(&doc, doc.root().unwrap()).unwrap();
        assert_eq!(parsed, grain);
    }

    #[test]
    fn test_recipe_round_trip() {
        let recipe = Recipe {
            name: "Märzen".into(),
            brewer: "Ana".into(),
            og: 1.056,
            fg: 1.012,
            ibu: 24.0,
            style: Some(Style {
                name: "Märzen".into(),
                category: "Amber Lager".into(),
                ..Default::default()
            }),
            mash: Some(MashProfile {
                name: "Decoction".into(),
                steps: vec![
                    MashStep {
                        name: "Protein Rest".into(),
                        step_temp: 122.0,
                        ..Default::default()
                    },
                    MashStep {
                        name: "Saccharification".into(),
                        step_temp: 154.0,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            grains: vec![Grain {
                name: "Vienna".into(),
                amount: 160.0,
                ..Default::default()
            }],
            hops: vec![Hop {
                name: "Hallertauer".into(),
                boil_time: 60.0,
                ..Default::default()
            }],
            yeasts: vec![Yeast {
                name: "Bavarian Lager".into(),
                product_id: "WLP830".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let text = render_recipe(&recipe, "2026-10-16");
        assert!(text.contains("<_PERMID_>0</_PERMID_>\n<_MOD_>2026-10-16</_MOD_>"));
        assert!(text.contains("<F_R_DATE>2026-10-16</F_R_DATE>"));

        let wrapped = format!("<Recipe><Data>{}</Data></Recipe>", text);
        let doc = Document::parse(&wrapped).unwrap();
        let parsed = walk_document(&doc, "/");
        assert_eq!(parsed.len(), 1);
        let back = &parsed[0];
        assert_eq!(back.name, "Märzen");
        assert_eq!(back.og, 1.056);
        assert_eq!(back.id, "0");
        assert_eq!(back.style, recipe.style);
        assert_eq!(back.mash, recipe.mash);
        assert_eq!(back.grains, recipe.grains);
        assert_eq!(back.hops, recipe.hops);
        assert_eq!(back.yeasts, recipe.yeasts);
    }
}
