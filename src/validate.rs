//! Style checks: a recipe's vital statistics against its style's ranges.
//!
//! Each of OG, FG, ABV, IBU and color is compared with the inclusive
//! `[min, max]` range of the style embedded in the recipe. A value outside
//! its range is an issue, except a low FG, which only warns. A range whose
//! bounds are both zero is treated as unknown and never flags.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Library;
use crate::models::{Recipe, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Og,
    Fg,
    Abv,
    Ibu,
    Color,
}

/// Where a value sits relative to its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    InRange,
    Low,
    High,
    NoRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCheck {
    pub metric: Metric,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub standing: Standing,
}

impl MetricCheck {
    fn new(metric: Metric, value: f64, min: f64, max: f64) -> Self {
        let standing = if min == 0.0 && max == 0.0 {
            Standing::NoRange
        } else if value < min {
            Standing::Low
        } else if value > max {
            Standing::High
        } else {
            Standing::InRange
        };
        Self {
            metric,
            value,
            min,
            max,
            standing,
        }
    }

    /// Out of style.
    pub fn is_issue(&self) -> bool {
        match self.standing {
            Standing::High => true,
            Standing::Low => self.metric != Metric::Fg,
            Standing::InRange | Standing::NoRange => false,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.standing == Standing::Low && self.metric == Metric::Fg
    }
}

/// Result of checking one recipe against its style.
#[derive(Debug, Clone, Serialize)]
pub struct StyleReport {
    pub recipe: String,
    pub style: String,
    pub guide: String,
    pub in_style: bool,
    pub issues: usize,
    pub warnings: usize,
    pub checks: Vec<MetricCheck>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidateError {
    #[error("recipe '{0}' not found")]
    RecipeNotFound(String),

    #[error("recipe '{0}' has no style set")]
    NoStyle(String),
}

/// Compare a recipe's statistics with `style`.
pub fn check_against_style(recipe: &Recipe, style: &Style) -> StyleReport {
    let checks = vec![
        MetricCheck::new(Metric::Og, recipe.og, style.min_og, style.max_og),
        MetricCheck::new(Metric::Fg, recipe.fg, style.min_fg, style.max_fg),
        MetricCheck::new(Metric::Abv, recipe.abv, style.min_abv, style.max_abv),
        MetricCheck::new(Metric::Ibu, recipe.ibu, style.min_ibu, style.max_ibu),
        MetricCheck::new(Metric::Color, recipe.color_srm, style.min_color, style.max_color),
    ];
    let issues = checks.iter().filter(|c| c.is_issue()).count();
    let warnings = checks.iter().filter(|c| c.is_warning()).count();
    StyleReport {
        recipe: recipe.name.clone(),
        style: style.name.clone(),
        guide: style.guide.clone(),
        in_style: issues == 0,
        issues,
        warnings,
        checks,
    }
}

impl Library {
    /// Check a recipe, found by id or name, against the style stored with
    /// it.
    pub fn validate_recipe(&mut self, name_or_id: &str) -> Result<StyleReport, ValidateError> {
        let recipe = self
            .get_recipe(name_or_id)
            .ok_or_else(|| ValidateError::RecipeNotFound(name_or_id.to_string()))?;
        let style = recipe
            .style
            .as_ref()
            .ok_or_else(|| ValidateError::NoStyle(recipe.name.clone()))?;
        let report = check_against_style(&recipe, style);
        tracing::debug!(recipe = %recipe.name, issues = report.issues, "checked recipe against style");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn apa() -> Style {
        Style {
            name: "American Pale Ale".into(),
            guide: "BJCP 2015".into(),
            min_og: 1.045,
            max_og: 1.060,
            min_fg: 1.010,
            max_fg: 1.015,
            min_abv: 4.5,
            max_abv: 6.2,
            min_ibu: 30.0,
            max_ibu: 50.0,
            min_color: 5.0,
            max_color: 10.0,
            ..Default::default()
        }
    }

    fn standing(report: &StyleReport, metric: Metric) -> Standing {
        report.checks.iter().find(|c| c.metric == metric).unwrap().standing
    }

    #[test]
    fn test_recipe_in_style() {
        let recipe = Recipe {
            name: "Pale".into(),
            og: 1.052,
            fg: 1.012,
            abv: 5.2,
            ibu: 38.0,
            color_srm: 6.5,
            ..Default::default()
        };
        let report = check_against_style(&recipe, &apa());
        assert!(report.in_style);
        assert_eq!(report.issues, 0);
        assert_eq!(report.warnings, 0);
        assert!(report.checks.iter().all(|c| c.standing == Standing::InRange));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let recipe = Recipe {
            og: 1.045,
            fg: 1.015,
            abv: 6.2,
            ibu: 30.0,
            color_srm: 10.0,
            ..Default::default()
        };
        assert!(check_against_style(&recipe, &apa()).in_style);
    }

    #[test]
    fn test_out_of_range_metrics() {
        let recipe = Recipe {
            og: 1.070,
            fg: 1.008,
            abv: 7.5,
            ibu: 20.0,
            color_srm: 6.0,
            ..Default::default()
        };
        let report = check_against_style(&recipe, &apa());
        assert_eq!(standing(&report, Metric::Og), Standing::High);
        assert_eq!(standing(&report, Metric::Fg), Standing::Low);
        assert_eq!(standing(&report, Metric::Abv), Standing::High);
        assert_eq!(standing(&report, Metric::Ibu), Standing::Low);
        assert_eq!(standing(&report, Metric::Color), Standing::InRange);
        assert_eq!(report.issues, 3);
        assert_eq!(report.warnings, 1);
        assert!(!report.in_style);
    }

    #[test]
    fn test_low_fg_alone_only_warns() {
        let recipe = Recipe {
            og: 1.050,
            fg: 1.004,
            abv: 5.0,
            ibu: 35.0,
            color_srm: 7.0,
            ..Default::default()
        };
        let report = check_against_style(&recipe, &apa());
        assert!(report.in_style);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn test_zero_range_is_unknown() {
        let style = Style {
            name: "Specialty".into(),
            ..Default::default()
        };
        let recipe = Recipe {
            og: 1.090,
            ibu: 80.0,
            ..Default::default()
        };
        let report = check_against_style(&recipe, &style);
        assert!(report.checks.iter().all(|c| c.standing == Standing::NoRange));
        assert!(report.in_style);
    }

    #[test]
    fn test_validate_recipe_from_library() {
        let tmp = TempDir::new().unwrap();
        let recipes = "<Recipe><Data>\
            <Recipe><_PERMID_>11</_PERMID_><F_R_NAME>Pale Ale</F_R_NAME>\
              <F_R_OG>1.0700000</F_R_OG><F_R_FG>1.0120000</F_R_FG><F_R_ABV>5.0000000</F_R_ABV>\
              <F_R_IBU>40.0000000</F_R_IBU><F_R_COLOR>6.0000000</F_R_COLOR>\
              <F_R_STYLE><F_S_NAME>American Pale Ale</F_S_NAME>\
                <F_S_MIN_OG>1.0450000</F_S_MIN_OG><F_S_MAX_OG>1.0600000</F_S_MAX_OG>\
                <F_S_MIN_FG>1.0100000</F_S_MIN_FG><F_S_MAX_FG>1.0150000</F_S_MAX_FG>\
                <F_S_MIN_ABV>4.5000000</F_S_MIN_ABV><F_S_MAX_ABV>6.2000000</F_S_MAX_ABV>\
                <F_S_MIN_IBU>30.0000000</F_S_MIN_IBU><F_S_MAX_IBU>50.0000000</F_S_MAX_IBU>\
                <F_S_MIN_COLOR>5.0000000</F_S_MIN_COLOR><F_S_MAX_COLOR>10.0000000</F_S_MAX_COLOR>\
              </F_R_STYLE></Recipe>\
            <Recipe><_PERMID_>12</_PERMID_><F_R_NAME>Mystery</F_R_NAME></Recipe>\
            </Data></Recipe>";
        fs::write(tmp.path().join("Recipe.bsmx"), recipes).unwrap();
        let mut lib = Library::open(tmp.path()).unwrap();

        let report = lib.validate_recipe("11").unwrap();
        assert_eq!(report.recipe, "Pale Ale");
        assert_eq!(report.style, "American Pale Ale");
        assert_eq!(standing(&report, Metric::Og), Standing::High);
        assert_eq!(report.issues, 1);

        assert_eq!(
            lib.validate_recipe("mystery").unwrap_err(),
            ValidateError::NoStyle("Mystery".into())
        );
        assert_eq!(
            lib.validate_recipe("stout").unwrap_err(),
            ValidateError::RecipeNotFound("stout".into())
        );
    }
}
