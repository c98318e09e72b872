//! Shopping plan interpretation and rendering

use std::io;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::Serialize;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    catalog::{Catalog, ProductKey},
    solvers::Assignment,
};

/// Solved quantities at or below this are numerical noise, not purchases.
pub const NOISE_THRESHOLD_KG: f64 = 0.001;

/// Errors turning a solved assignment into a shopping plan.
#[derive(Debug, Error)]
pub enum InterpretError {
    /// The assignment references a product the catalog does not hold.
    #[error("assignment references a product missing from the catalog")]
    MissingProduct(ProductKey),
}

/// One line of the shopping plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    /// Product name
    pub name: String,

    /// Purchase amount in kilograms, rounded to two decimals
    pub amount_kg: f64,

    /// Line cost in euros, rounded to two decimals
    pub cost: f64,
}

/// The caller-facing optimization result: what to buy, and for how much.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingPlan {
    /// Purchased items in catalog order
    pub items: Vec<PlanItem>,

    /// Minimised total cost in euros, rounded to two decimals
    pub total_cost: f64,
}

impl ShoppingPlan {
    /// Interpret a solved assignment against the catalog it was built from.
    ///
    /// Products whose solved quantity does not exceed [`NOISE_THRESHOLD_KG`]
    /// are left out. Selection indicators are consulted only for internal
    /// consistency; they never surface in the plan.
    ///
    /// # Errors
    ///
    /// Returns [`InterpretError::MissingProduct`] if the assignment carries a
    /// key the catalog cannot resolve.
    pub fn from_assignment(
        assignment: &Assignment,
        catalog: &Catalog,
    ) -> Result<Self, InterpretError> {
        let mut items = Vec::with_capacity(assignment.items.len());

        for solved in &assignment.items {
            // A selected product under its floor is a model-construction bug,
            // not a caller-visible condition.
            debug_assert!(
                !solved.selected || solved.quantity_kg >= solved.floor_kg - 1e-6,
                "selected product solved below its per-item floor"
            );

            if solved.quantity_kg <= NOISE_THRESHOLD_KG {
                continue;
            }

            let product = catalog
                .get(solved.key)
                .ok_or(InterpretError::MissingProduct(solved.key))?;

            let amount_kg = round2(solved.quantity_kg);

            items.push(PlanItem {
                name: product.name.clone(),
                amount_kg,
                cost: round2(amount_kg * product.price_per_kg),
            });
        }

        Ok(Self {
            items,
            total_cost: round2(assignment.objective_value),
        })
    }

    /// Sum of the per-item costs, for checking against `total_cost`.
    #[must_use]
    pub fn items_cost(&self) -> f64 {
        self.items.iter().map(|item| item.cost).sum()
    }

    /// Render the plan as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written to `out`.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut builder = Builder::default();

        builder.push_record(["Product", "Amount (kg)", "Cost (EUR)"]);

        for item in &self.items {
            builder.push_record([
                item.name.clone(),
                format!("{:.2}", item.amount_kg),
                format!("{:.2}", item.cost),
            ]);
        }

        builder.push_record([
            "Total".to_owned(),
            String::new(),
            format!("{:.2}", self.total_cost),
        ]);

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);
        theme.insert_horizontal_line(self.items.len() + 1, separator);

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Rows::last(), Color::BOLD);
        table.modify(Columns::new(1..3), Alignment::right());

        writeln!(out, "{table}")
    }
}

fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .and_then(|decimal| decimal.round_dp(2).to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        catalog::{CatalogError, Product},
        solvers::SolvedItem,
    };

    use super::*;

    fn test_catalog() -> Result<Catalog, CatalogError> {
        Catalog::with_products([
            Product::new("Oats", 1.8).with_nutrients(135.0, 70.0, 600.0),
            Product::new("Bananas", 1.6).with_nutrients(11.0, 3.0, 230.0).produce(),
        ])
    }

    fn solved(catalog: &Catalog, name: &str, quantity_kg: f64) -> SolvedItem {
        SolvedItem {
            key: catalog.key_of(name).unwrap_or_default(),
            quantity_kg,
            selected: quantity_kg > NOISE_THRESHOLD_KG,
            limit_kg: 1.5,
            floor_kg: 0.2,
        }
    }

    #[test]
    fn from_assignment_emits_items_above_the_noise_threshold() -> TestResult {
        let catalog = test_catalog()?;

        let assignment = Assignment {
            objective_value: 1.8 * 1.2345 + 1.6 * 0.5,
            items: vec![
                solved(&catalog, "Oats", 1.2345),
                solved(&catalog, "Bananas", 0.5),
            ],
        };

        let plan = ShoppingPlan::from_assignment(&assignment, &catalog)?;

        assert_eq!(plan.items.len(), 2);

        let oats = plan
            .items
            .iter()
            .find(|item| item.name == "Oats")
            .ok_or("Oats missing from the plan")?;

        assert!((oats.amount_kg - 1.23).abs() < 1e-9, "amount rounds to 2 dp");
        assert!((oats.cost - 2.21).abs() < 1e-9, "cost derives from the rounded amount");

        Ok(())
    }

    #[test]
    fn from_assignment_drops_noise_quantities() -> TestResult {
        let catalog = test_catalog()?;

        let assignment = Assignment {
            objective_value: 1.6 * 0.5,
            items: vec![
                solved(&catalog, "Oats", 0.0005),
                solved(&catalog, "Bananas", 0.5),
            ],
        };

        let plan = ShoppingPlan::from_assignment(&assignment, &catalog)?;

        let names: Vec<&str> = plan.items.iter().map(|item| item.name.as_str()).collect();

        assert_eq!(names, ["Bananas"]);

        Ok(())
    }

    #[test]
    fn from_assignment_rejects_an_unknown_product_key() -> TestResult {
        let catalog = test_catalog()?;

        let assignment = Assignment {
            objective_value: 1.0,
            items: vec![SolvedItem {
                key: ProductKey::default(),
                quantity_kg: 1.0,
                selected: true,
                limit_kg: 1.5,
                floor_kg: 0.2,
            }],
        };

        let result = ShoppingPlan::from_assignment(&assignment, &catalog);

        assert!(matches!(result, Err(InterpretError::MissingProduct(_))));

        Ok(())
    }

    #[test]
    fn total_cost_matches_item_costs_within_rounding_tolerance() -> TestResult {
        let catalog = test_catalog()?;

        let assignment = Assignment {
            objective_value: 1.8 * 0.777 + 1.6 * 1.333,
            items: vec![
                solved(&catalog, "Oats", 0.777),
                solved(&catalog, "Bananas", 1.333),
            ],
        };

        let plan = ShoppingPlan::from_assignment(&assignment, &catalog)?;

        // Each line rounds independently, so allow a cent per item.
        assert!((plan.total_cost - plan.items_cost()).abs() <= 0.02);

        Ok(())
    }

    #[test]
    fn write_to_renders_items_and_total() -> TestResult {
        let catalog = test_catalog()?;

        let assignment = Assignment {
            objective_value: 2.96,
            items: vec![
                solved(&catalog, "Oats", 1.2),
                solved(&catalog, "Bananas", 0.5),
            ],
        };

        let plan = ShoppingPlan::from_assignment(&assignment, &catalog)?;

        let mut out = Vec::new();
        plan.write_to(&mut out)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Oats"));
        assert!(output.contains("Bananas"));
        assert!(output.contains("Total"));
        assert!(output.contains("2.96"));

        Ok(())
    }

    #[test]
    fn plan_serializes_with_the_documented_shape() -> TestResult {
        let plan = ShoppingPlan {
            items: vec![PlanItem {
                name: "Oats".to_owned(),
                amount_kg: 1.2,
                cost: 2.16,
            }],
            total_cost: 2.16,
        };

        let json = serde_json::to_value(&plan)?;

        assert_eq!(json.pointer("/total_cost").and_then(serde_json::Value::as_f64), Some(2.16));
        assert_eq!(json.pointer("/items/0/name").and_then(serde_json::Value::as_str), Some("Oats"));
        assert_eq!(json.pointer("/items/0/amount_kg").and_then(serde_json::Value::as_f64), Some(1.2));

        Ok(())
    }
}
