//! Plan model construction and solving
//!
//! Couples one continuous quantity variable and one binary selection variable
//! per product, so "selected" is a faithful indicator rather than a free
//! variable. The linking bounds are tight (the actual per-item limit, not an
//! arbitrary big-M constant) to keep the relaxation numerically sharp.

use std::fmt;

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, variable,
};
use smallvec::SmallVec;
use tracing::debug;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::{
    catalog::{Catalog, ProductKey},
    request::PlanRequest,
    solvers::{
        Assignment, BINARY_THRESHOLD, BuildError, ConstraintFamily, ModelSummary, PlanConstraint,
        Relation, SolveOutcome, SolvedItem,
    },
};

/// Decision variables created for one product, retained with the product's
/// key so interpretation never has to parse variable identifiers.
#[derive(Debug, Clone, Copy)]
struct ProductVars {
    key: ProductKey,
    quantity: Variable,
    selected: Variable,
    limit_kg: f64,
    floor_kg: f64,
}

/// The mixed-integer program derived from one (catalog, request) pair.
///
/// Built fresh per request, immutable once built, consumed exactly once by
/// [`PlanModel::solve`].
pub struct PlanModel {
    pb: ProblemVariables,
    objective: Expression,
    vars: Vec<ProductVars>,
    constraints: Vec<PlanConstraint>,
}

impl fmt::Debug for PlanModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanModel")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field("vars", &format!("[{} products]", self.vars.len()))
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl PlanModel {
    /// Build the plan model for a catalog and a request.
    ///
    /// The produce floor is omitted entirely when the catalog carries no
    /// produce items: an empty-sum constraint would make every positive
    /// floor unsatisfiable, forcing infeasibility the caller never asked for.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the catalog is empty or the request
    /// violates one of its invariants. No solve is attempted in either case.
    pub fn build(catalog: &Catalog, request: &PlanRequest) -> Result<Self, BuildError> {
        request.validate()?;

        if catalog.is_empty() {
            return Err(BuildError::EmptyCatalog);
        }

        let mut pb = ProblemVariables::new();
        let mut vars = Vec::with_capacity(catalog.len());

        let mut objective = Expression::default();
        let mut protein = Expression::default();
        let mut fat = Expression::default();
        let mut carbs = Expression::default();
        let mut produce_mass = Expression::default();
        let mut selected_count = Expression::default();

        for (key, product) in catalog.iter() {
            let quantity = pb.add(variable().min(0.0));
            let selected = pb.add(variable().binary());

            objective += quantity * product.price_per_kg;
            protein += quantity * product.protein_g_per_kg;
            fat += quantity * product.fat_g_per_kg;
            carbs += quantity * product.carbs_g_per_kg;
            selected_count += selected;

            if product.is_produce {
                produce_mass += quantity;
            }

            vars.push(ProductVars {
                key,
                quantity,
                selected,
                limit_kg: request.variety.limit_for(product),
                floor_kg: request.variety.min_per_item_kg,
            });
        }

        let mut constraints = Vec::with_capacity(2 * vars.len() + 6);

        constraints.push(PlanConstraint::new(
            ConstraintFamily::Budget,
            objective.clone(),
            Relation::Leq,
            request.budget_max,
        ));

        constraints.push(PlanConstraint::new(
            ConstraintFamily::Protein,
            protein,
            Relation::Geq,
            request.protein_min_g,
        ));

        constraints.push(PlanConstraint::new(
            ConstraintFamily::Fat,
            fat,
            Relation::Leq,
            request.fat_max_g,
        ));

        constraints.push(PlanConstraint::new(
            ConstraintFamily::Carbs,
            carbs,
            Relation::Leq,
            request.carbs_max_g,
        ));

        if catalog.produce_count() > 0 {
            constraints.push(PlanConstraint::new(
                ConstraintFamily::Produce,
                produce_mass,
                Relation::Geq,
                request.produce_min_kg,
            ));
        }

        for product_vars in &vars {
            // quantity <= limit * selected: deselected products buy nothing.
            constraints.push(PlanConstraint::new(
                ConstraintFamily::QuantityCap,
                Expression::from(product_vars.quantity) - product_vars.selected * product_vars.limit_kg,
                Relation::Leq,
                0.0,
            ));

            // quantity >= floor * selected: no trace purchases.
            constraints.push(PlanConstraint::new(
                ConstraintFamily::QuantityFloor,
                Expression::from(product_vars.quantity) - product_vars.selected * product_vars.floor_kg,
                Relation::Geq,
                0.0,
            ));
        }

        constraints.push(PlanConstraint::new(
            ConstraintFamily::Variety,
            selected_count,
            Relation::Geq,
            f64::from(request.variety.min_unique_items),
        ));

        Ok(Self {
            pb,
            objective,
            vars,
            constraints,
        })
    }

    /// Take a cheap structural summary, usable after the model is consumed.
    #[must_use]
    pub fn summary(&self) -> ModelSummary {
        let mut families: SmallVec<[ConstraintFamily; 8]> = SmallVec::new();

        for constraint in &self.constraints {
            if !families.contains(&constraint.family) {
                families.push(constraint.family);
            }
        }

        ModelSummary {
            products: self.vars.len(),
            variables: 2 * self.vars.len(),
            constraints: self.constraints.len(),
            families,
        }
    }

    /// Submit the model to the configured solver backend.
    ///
    /// Backend failures are reported as [`SolveOutcome::Error`], never
    /// conflated with infeasibility.
    #[must_use]
    pub fn solve(self) -> SolveOutcome {
        let Self {
            pb,
            objective,
            vars,
            constraints,
        } = self;

        debug!(
            products = vars.len(),
            constraints = constraints.len(),
            "submitting plan model"
        );

        let mut model = pb.minimise(objective.clone()).using(default_solver);

        for constraint in constraints {
            model = model.with(constraint.into_constraint());
        }

        match model.solve() {
            Ok(solution) => {
                let items = vars
                    .iter()
                    .map(|product_vars| SolvedItem {
                        key: product_vars.key,
                        quantity_kg: solution.value(product_vars.quantity),
                        selected: solution.value(product_vars.selected) > BINARY_THRESHOLD,
                        limit_kg: product_vars.limit_kg,
                        floor_kg: product_vars.floor_kg,
                    })
                    .collect();

                SolveOutcome::Optimal(Assignment {
                    objective_value: solution.eval(&objective),
                    items,
                })
            }
            Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
            Err(ResolutionError::Unbounded) => SolveOutcome::Unbounded,
            Err(error) => SolveOutcome::Error {
                detail: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use testresult::TestResult;

    use crate::{
        catalog::{CatalogError, Product},
        request::VarietyRules,
    };

    use super::*;

    fn test_catalog() -> Result<Catalog, CatalogError> {
        Catalog::with_products([
            Product::new("Oats", 1.8).with_nutrients(135.0, 70.0, 600.0),
            Product::new("Lentils", 2.4).with_nutrients(260.0, 11.0, 530.0),
            Product::new("Bananas", 1.6).with_nutrients(11.0, 3.0, 230.0).produce(),
        ])
    }

    fn test_request() -> PlanRequest {
        PlanRequest::new(20.0, 200.0, 500.0, 4000.0, 0.5).with_variety(VarietyRules {
            min_unique_items: 2,
            ..VarietyRules::default()
        })
    }

    #[test]
    fn build_rejects_an_empty_catalog() {
        let result = PlanModel::build(&Catalog::new(), &test_request());

        assert!(matches!(result, Err(BuildError::EmptyCatalog)));
    }

    #[test]
    fn build_rejects_an_invalid_request_before_touching_variables() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(-5.0, 100.0, 100.0, 100.0, 0.0);

        let result = PlanModel::build(&catalog, &request);

        assert!(matches!(result, Err(BuildError::Request(_))));

        Ok(())
    }

    #[test]
    fn build_creates_two_variables_per_product() -> TestResult {
        let catalog = test_catalog()?;

        let model = PlanModel::build(&catalog, &test_request())?;
        let summary = model.summary();

        assert_eq!(summary.products, 3);
        assert_eq!(summary.variables, 6);
        // Budget/Protein/Fat/Carbs/Produce/Variety plus a cap and floor per product.
        assert_eq!(summary.constraints, 12);

        Ok(())
    }

    #[test]
    fn build_includes_the_produce_floor_when_produce_exists() -> TestResult {
        let catalog = test_catalog()?;

        let model = PlanModel::build(&catalog, &test_request())?;

        assert!(model.summary().is_produce_constrained());

        Ok(())
    }

    #[test]
    fn build_omits_the_produce_floor_without_produce_items() -> TestResult {
        let catalog = Catalog::with_products([
            Product::new("Oats", 1.8).with_nutrients(135.0, 70.0, 600.0),
            Product::new("Lentils", 2.4).with_nutrients(260.0, 11.0, 530.0),
        ])?;

        // A positive produce floor must not reach the solver as an empty sum.
        let request = PlanRequest::new(20.0, 100.0, 500.0, 4000.0, 4.0).with_variety(VarietyRules {
            min_unique_items: 1,
            ..VarietyRules::default()
        });

        let model = PlanModel::build(&catalog, &request)?;

        assert!(!model.summary().is_produce_constrained());

        Ok(())
    }

    #[test]
    fn objective_is_the_priced_quantity_sum() -> TestResult {
        let catalog = test_catalog()?;

        let model = PlanModel::build(&catalog, &test_request())?;

        // Synthetic solution: 1 kg of everything, all selected.
        let solution: HashMap<Variable, f64> = model
            .vars
            .iter()
            .flat_map(|vars| [(vars.quantity, 1.0), (vars.selected, 1.0)])
            .collect();

        let expected = 1.8 + 2.4 + 1.6;
        let actual = solution.eval(&model.objective);

        assert!((actual - expected).abs() <= f64::EPSILON);

        Ok(())
    }

    #[test]
    fn produce_items_get_the_relaxed_cap() -> TestResult {
        let catalog = test_catalog()?;

        let model = PlanModel::build(&catalog, &test_request())?;

        let caps: Vec<f64> = model.vars.iter().map(|vars| vars.limit_kg).collect();

        assert_eq!(caps, [1.5, 1.5, 3.0]);

        Ok(())
    }

    #[test]
    fn solve_finds_an_optimal_plan_for_a_feasible_model() -> TestResult {
        let catalog = test_catalog()?;

        let model = PlanModel::build(&catalog, &test_request())?;

        let SolveOutcome::Optimal(assignment) = model.solve() else {
            return Err("expected an optimal outcome".into());
        };

        assert!(assignment.objective_value >= 0.0);
        assert!(assignment.objective_value <= 20.0 + 1e-6);
        assert_eq!(assignment.items.len(), 3);

        let selected = assignment.items.iter().filter(|item| item.selected).count();

        assert!(selected >= 2, "variety floor requires two selected products");

        Ok(())
    }

    #[test]
    fn solve_reports_infeasible_when_the_budget_cannot_cover_the_protein_floor() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(0.01, 5000.0, 500.0, 4000.0, 0.0).with_variety(VarietyRules {
            min_unique_items: 1,
            ..VarietyRules::default()
        });

        let model = PlanModel::build(&catalog, &request)?;

        assert!(matches!(model.solve(), SolveOutcome::Infeasible));

        Ok(())
    }

    #[test]
    fn solve_reports_infeasible_when_variety_exceeds_the_catalog() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(20.0, 0.0, 500.0, 4000.0, 0.0).with_variety(VarietyRules {
            min_unique_items: 6,
            ..VarietyRules::default()
        });

        let model = PlanModel::build(&catalog, &request)?;

        assert!(matches!(model.solve(), SolveOutcome::Infeasible));

        Ok(())
    }
}
