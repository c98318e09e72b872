//! Plan model building blocks and solve outcomes

use std::fmt;

use good_lp::{Constraint, Expression, constraint};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{catalog::ProductKey, request::RequestError};

pub mod milp;

/// Threshold above which a relaxed binary variable counts as set.
///
/// Solvers return floats for binary variables; values above this are treated
/// as 1 to tolerate tiny numerical noise.
pub(crate) const BINARY_THRESHOLD: f64 = 0.5;

/// Errors preventing model construction.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The request violated one of its invariants.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The catalog has no products to plan over.
    #[error("catalog contains no products")]
    EmptyCatalog,
}

/// Constraint families in the plan model, named for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintFamily {
    /// Total spend must stay within the budget ceiling
    Budget,

    /// Total protein must reach the floor
    Protein,

    /// Total fat must stay under the cap
    Fat,

    /// Total carbohydrates must stay under the cap
    Carbs,

    /// Total produce mass must reach the floor
    Produce,

    /// Per-product cap tying quantity to the selection indicator
    QuantityCap,

    /// Per-product floor forbidding trace purchases
    QuantityFloor,

    /// Minimum number of distinct selected products
    Variety,
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Budget => "Budget",
            Self::Protein => "Protein",
            Self::Fat => "Fat",
            Self::Carbs => "Carbs",
            Self::Produce => "Produce",
            Self::QuantityCap => "QuantityCap",
            Self::QuantityFloor => "QuantityFloor",
            Self::Variety => "Variety",
        };

        f.write_str(name)
    }
}

/// Relation operator for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Equality (`lhs == rhs`)
    Eq,

    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

/// Recorded linear constraint emitted during model construction.
#[derive(Debug, Clone)]
pub struct PlanConstraint {
    /// Family this constraint belongs to
    pub family: ConstraintFamily,

    /// Left-hand side expression
    pub(crate) lhs: Expression,

    /// Relation operator
    pub relation: Relation,

    /// Right-hand side scalar
    pub rhs: f64,
}

impl PlanConstraint {
    pub(crate) fn new(family: ConstraintFamily, lhs: Expression, relation: Relation, rhs: f64) -> Self {
        Self {
            family,
            lhs,
            relation,
            rhs,
        }
    }

    /// Realise the recorded constraint for the solver backend.
    pub(crate) fn into_constraint(self) -> Constraint {
        match self.relation {
            Relation::Eq => constraint::eq(self.lhs, self.rhs),
            Relation::Leq => constraint::leq(self.lhs, self.rhs),
            Relation::Geq => constraint::geq(self.lhs, self.rhs),
        }
    }
}

/// One product's solved variable values.
#[derive(Debug, Clone, Copy)]
pub struct SolvedItem {
    /// Key of the product the variables were created for
    pub key: ProductKey,

    /// Solved purchase quantity in kilograms
    pub quantity_kg: f64,

    /// Whether the selection indicator was set
    pub selected: bool,

    /// Per-item cap the model applied to this product, in kilograms
    pub limit_kg: f64,

    /// Per-item floor the model applied to this product, in kilograms
    pub floor_kg: f64,
}

/// Variable assignment achieving the minimum objective.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Minimised total cost
    pub objective_value: f64,

    /// Per-product solved values, in catalog order
    pub items: Vec<SolvedItem>,
}

/// Solver's answer for one plan model.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// An optimal assignment was found
    Optimal(Assignment),

    /// No assignment satisfies all constraints
    Infeasible,

    /// The objective has no lower bound
    Unbounded,

    /// The backend failed internally
    Error {
        /// Backend-provided failure description
        detail: String,
    },
}

/// Cheap structural summary of a built model.
#[derive(Debug, Clone)]
pub struct ModelSummary {
    /// Products the model covers
    pub products: usize,

    /// Total decision variables
    pub variables: usize,

    /// Total recorded constraints
    pub constraints: usize,

    /// Constraint families present, in recording order
    pub families: SmallVec<[ConstraintFamily; 8]>,
}

impl ModelSummary {
    /// Whether the model carries a produce floor constraint.
    #[must_use]
    pub fn is_produce_constrained(&self) -> bool {
        self.families.contains(&ConstraintFamily::Produce)
    }
}
