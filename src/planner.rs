//! Plan orchestration and the caller-facing error taxonomy
//!
//! One solve per request, no retries: a second solve of an identical model
//! cannot produce a different feasibility verdict.

use std::{fmt, sync::mpsc, thread, time::Duration};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    catalog::Catalog,
    plan::{InterpretError, ShoppingPlan},
    request::PlanRequest,
    solvers::{BuildError, ModelSummary, SolveOutcome, milp::PlanModel},
};

/// Failures of the solving capability itself.
///
/// A correctly built plan model is bounded below by zero and above by the
/// budget, so any of these signals a defect rather than targets that are too
/// strict. They are logged at `error` and kept distinct from infeasibility.
#[derive(Debug, Error)]
pub enum SolverFault {
    /// The backend reported the model as unbounded.
    #[error("solver reported the model as unbounded")]
    Unbounded,

    /// The backend failed internally.
    #[error("solver backend failed: {detail}")]
    Backend {
        /// Backend-provided failure description
        detail: String,
    },

    /// The solve exceeded the configured time limit.
    #[error("solve exceeded the {limit:?} time limit")]
    Timeout {
        /// Configured time limit
        limit: Duration,
    },

    /// The solve worker terminated without reporting an outcome.
    #[error("solve worker terminated without reporting an outcome")]
    WorkerVanished,

    /// The solved assignment did not line up with the catalog.
    #[error(transparent)]
    Interpret(#[from] InterpretError),
}

/// Context handed to callers alongside an infeasible verdict.
///
/// The solver collapses every over-tight target into the same status;
/// these counts let user-facing messaging tell "budget too low" apart from
/// "no produce in the catalog" or "variety rules too strict".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfeasibleDiagnostics {
    /// Products in the catalog
    pub products: usize,

    /// Produce-flagged products in the catalog
    pub produce_products: usize,

    /// Whether the model carried a produce floor constraint
    pub produce_constrained: bool,

    /// Requested budget ceiling in euros
    pub budget_max: f64,

    /// Requested protein floor in grams
    pub protein_min_g: f64,

    /// Requested produce floor in kilograms
    pub produce_min_kg: f64,

    /// Requested minimum number of distinct products
    pub min_unique_items: u32,
}

impl InfeasibleDiagnostics {
    fn collect(catalog: &Catalog, request: &PlanRequest, summary: &ModelSummary) -> Self {
        Self {
            products: catalog.len(),
            produce_products: catalog.produce_count(),
            produce_constrained: summary.is_produce_constrained(),
            budget_max: request.budget_max,
            protein_min_g: request.protein_min_g,
            produce_min_kg: request.produce_min_kg,
            min_unique_items: request.variety.min_unique_items,
        }
    }

    /// Whether the variety floor alone rules out every plan.
    #[must_use]
    pub fn variety_exceeds_catalog(&self) -> bool {
        usize::try_from(self.min_unique_items).map_or(true, |needed| self.products < needed)
    }
}

impl fmt::Display for InfeasibleDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "catalog has {} products ({} produce), targets were budget {:.2} EUR, \
             protein {:.0} g, produce {:.2} kg, at least {} distinct items",
            self.products,
            self.produce_products,
            self.budget_max,
            self.protein_min_g,
            self.produce_min_kg,
            self.min_unique_items,
        )?;

        if self.variety_exceeds_catalog() {
            write!(f, "; the variety floor exceeds the catalog size")?;
        }

        if self.produce_min_kg > 0.0 && !self.produce_constrained {
            write!(
                f,
                "; the produce floor was dropped because the catalog has no produce items"
            )?;
        }

        Ok(())
    }
}

/// Errors a plan request can end in.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The request or catalog was rejected before any solve was attempted.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] BuildError),

    /// The model admits no feasible assignment. An expected outcome, not a bug.
    #[error("no feasible plan: {diagnostics}")]
    Infeasible {
        /// Context for user-facing messaging
        diagnostics: InfeasibleDiagnostics,
    },

    /// The solving capability failed; see [`SolverFault`].
    #[error(transparent)]
    SolverFault(#[from] SolverFault),
}

/// Orchestrates build, solve, and interpretation for one request at a time.
///
/// Stateless across requests; a planner can be shared freely as long as each
/// call gets its own catalog snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    solve_timeout: Option<Duration>,
}

impl Planner {
    /// Create a planner that solves inline with no time limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run each solve on its own worker thread, bounded by `limit`.
    ///
    /// On expiry the request fails with [`SolverFault::Timeout`]. The backend
    /// is not cancelled; the worker's late result is discarded.
    #[must_use]
    pub fn with_solve_timeout(mut self, limit: Duration) -> Self {
        self.solve_timeout = Some(limit);
        self
    }

    /// Compute the cheapest plan satisfying the request, or say why none exists.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidRequest`] without solving when the request
    /// or catalog is rejected, [`PlanError::Infeasible`] when no assignment
    /// satisfies the constraints, and [`PlanError::SolverFault`] when the
    /// solving capability itself fails.
    pub fn plan(
        &self,
        catalog: &Catalog,
        request: &PlanRequest,
    ) -> Result<ShoppingPlan, PlanError> {
        let model = PlanModel::build(catalog, request)?;
        let summary = model.summary();

        debug!(
            products = summary.products,
            constraints = summary.constraints,
            produce_constrained = summary.is_produce_constrained(),
            "solving plan model"
        );

        match self.run_solve(model)? {
            SolveOutcome::Optimal(assignment) => {
                let plan =
                    ShoppingPlan::from_assignment(&assignment, catalog).map_err(SolverFault::from)?;

                info!(
                    total_cost = plan.total_cost,
                    items = plan.items.len(),
                    "found optimal plan"
                );

                Ok(plan)
            }
            SolveOutcome::Infeasible => {
                let diagnostics = InfeasibleDiagnostics::collect(catalog, request, &summary);

                warn!(%diagnostics, "no feasible plan");

                Err(PlanError::Infeasible { diagnostics })
            }
            SolveOutcome::Unbounded => {
                error!("solver reported an unbounded model");

                Err(SolverFault::Unbounded.into())
            }
            SolveOutcome::Error { detail } => {
                error!(detail = %detail, "solver backend failed");

                Err(SolverFault::Backend { detail }.into())
            }
        }
    }

    fn run_solve(&self, model: PlanModel) -> Result<SolveOutcome, PlanError> {
        let Some(limit) = self.solve_timeout else {
            return Ok(model.solve());
        };

        let (sender, receiver) = mpsc::channel();

        // Detached on purpose: a timed-out worker finishes into a closed
        // channel and its result is dropped.
        thread::spawn(move || {
            _ = sender.send(model.solve());
        });

        match receiver.recv_timeout(limit) {
            Ok(outcome) => Ok(outcome),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                error!(?limit, "solve timed out");

                Err(SolverFault::Timeout { limit }.into())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                error!("solve worker vanished");

                Err(SolverFault::WorkerVanished.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
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
    fn plan_returns_a_shopping_plan_for_a_feasible_request() -> TestResult {
        let catalog = test_catalog()?;

        let plan = Planner::new().plan(&catalog, &test_request())?;

        assert!(plan.total_cost <= 20.0);
        assert!(plan.items.len() >= 2);

        Ok(())
    }

    #[test]
    fn plan_rejects_an_invalid_request_without_solving() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(-5.0, 100.0, 100.0, 100.0, 0.0);

        let result = Planner::new().plan(&catalog, &request);

        assert!(matches!(result, Err(PlanError::InvalidRequest(_))));

        Ok(())
    }

    #[test]
    fn plan_reports_infeasibility_with_diagnostics() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(1.0, 5000.0, 500.0, 4000.0, 1.0).with_variety(VarietyRules {
            min_unique_items: 2,
            ..VarietyRules::default()
        });

        let Err(PlanError::Infeasible { diagnostics }) = Planner::new().plan(&catalog, &request)
        else {
            return Err("expected an infeasible outcome".into());
        };

        assert_eq!(diagnostics.products, 3);
        assert_eq!(diagnostics.produce_products, 1);
        assert!(diagnostics.produce_constrained);
        assert!(!diagnostics.variety_exceeds_catalog());

        Ok(())
    }

    #[test]
    fn diagnostics_call_out_a_variety_floor_above_the_catalog_size() -> TestResult {
        let catalog = test_catalog()?;
        let request = PlanRequest::new(20.0, 0.0, 500.0, 4000.0, 0.0).with_variety(VarietyRules {
            min_unique_items: 6,
            ..VarietyRules::default()
        });

        let Err(PlanError::Infeasible { diagnostics }) = Planner::new().plan(&catalog, &request)
        else {
            return Err("expected an infeasible outcome".into());
        };

        assert!(diagnostics.variety_exceeds_catalog());
        assert!(diagnostics.to_string().contains("variety floor exceeds"));

        Ok(())
    }

    #[test]
    fn a_generous_timeout_does_not_change_the_outcome() -> TestResult {
        let catalog = test_catalog()?;
        let request = test_request();

        let inline = Planner::new().plan(&catalog, &request)?;
        let bounded = Planner::new()
            .with_solve_timeout(Duration::from_secs(30))
            .plan(&catalog, &request)?;

        assert!((inline.total_cost - bounded.total_cost).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn an_expired_timeout_surfaces_as_a_solver_fault() -> TestResult {
        // Large enough that the worker cannot beat a zero-length wait.
        let products = (0..64).map(|i| {
            Product::new(format!("P{i:02}"), 1.0 + f64::from(i) * 0.05)
                .with_nutrients(50.0 + f64::from(i), 2.0, 100.0)
        });
        let catalog = Catalog::with_products(products)?;

        let result = Planner::new()
            .with_solve_timeout(Duration::ZERO)
            .plan(&catalog, &test_request());

        assert!(matches!(
            result,
            Err(PlanError::SolverFault(SolverFault::Timeout { .. }))
        ));

        Ok(())
    }
}
