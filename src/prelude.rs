//! Ration prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{
        Catalog, CatalogError, Product, ProductKey,
        csv::{CatalogIoError, LoadStats, load_catalog, parse_catalog},
        provider::{CatalogProvider, CatalogSnapshot, ReloadReport},
        stats::{CatalogStats, ProteinValue, protein_per_euro_ranking},
    },
    plan::{InterpretError, PlanItem, ShoppingPlan},
    planner::{InfeasibleDiagnostics, PlanError, Planner, SolverFault},
    request::{PlanRequest, RequestError, VarietyRules},
    solvers::{
        Assignment, BuildError, ConstraintFamily, ModelSummary, SolveOutcome, SolvedItem,
        milp::PlanModel,
    },
};
