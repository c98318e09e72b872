//! Optimization targets

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;

/// Errors rejecting a plan request before any solve is attempted.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A numeric target is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Offending request field
        field: &'static str,

        /// Offending value
        value: f64,
    },

    /// A numeric target that must not be negative is negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Offending request field
        field: &'static str,

        /// Offending value
        value: f64,
    },

    /// A numeric target that must be positive is zero.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Offending request field
        field: &'static str,

        /// Offending value
        value: f64,
    },
}

/// Variety-control knobs.
///
/// The defaults produce diverse, realistic shopping lists; a request is usable
/// without touching any of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarietyRules {
    /// Per-item purchase cap in kilograms
    pub max_per_item_kg: f64,

    /// Minimum purchase per selected item in kilograms
    pub min_per_item_kg: f64,

    /// Minimum number of distinct products in the plan
    pub min_unique_items: u32,

    /// Multiplier applied to the per-item cap for produce items
    pub produce_max_multiplier: f64,
}

impl VarietyRules {
    /// Default per-item purchase cap in kilograms.
    pub const DEFAULT_MAX_PER_ITEM_KG: f64 = 1.5;

    /// Default minimum purchase per selected item in kilograms.
    pub const DEFAULT_MIN_PER_ITEM_KG: f64 = 0.2;

    /// Default minimum number of distinct products.
    pub const DEFAULT_MIN_UNIQUE_ITEMS: u32 = 6;

    /// Default produce cap multiplier.
    pub const DEFAULT_PRODUCE_MAX_MULTIPLIER: f64 = 2.0;

    /// Per-item purchase cap for one product in kilograms.
    ///
    /// Produce items get the relaxed cap `max_per_item_kg * produce_max_multiplier`.
    #[must_use]
    pub fn limit_for(&self, product: &Product) -> f64 {
        if product.is_produce {
            self.max_per_item_kg * self.produce_max_multiplier
        } else {
            self.max_per_item_kg
        }
    }
}

impl Default for VarietyRules {
    fn default() -> Self {
        Self {
            max_per_item_kg: Self::DEFAULT_MAX_PER_ITEM_KG,
            min_per_item_kg: Self::DEFAULT_MIN_PER_ITEM_KG,
            min_unique_items: Self::DEFAULT_MIN_UNIQUE_ITEMS,
            produce_max_multiplier: Self::DEFAULT_PRODUCE_MAX_MULTIPLIER,
        }
    }
}

/// One optimization call's targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Budget ceiling in euros
    pub budget_max: f64,

    /// Minimum total protein in grams
    pub protein_min_g: f64,

    /// Maximum total fat in grams
    pub fat_max_g: f64,

    /// Maximum total carbohydrates in grams
    pub carbs_max_g: f64,

    /// Minimum produce mass in kilograms
    pub produce_min_kg: f64,

    /// Variety-control knobs
    #[serde(default)]
    pub variety: VarietyRules,
}

impl PlanRequest {
    /// Create a request with the given targets and default variety rules.
    ///
    /// Targets follow the constraint order: budget ceiling (euros), protein
    /// floor (grams), fat cap (grams), carbohydrate cap (grams), produce
    /// floor (kilograms).
    #[must_use]
    pub fn new(
        budget_max: f64,
        protein_min_g: f64,
        fat_max_g: f64,
        carbs_max_g: f64,
        produce_min_kg: f64,
    ) -> Self {
        Self {
            budget_max,
            protein_min_g,
            fat_max_g,
            carbs_max_g,
            produce_min_kg,
            variety: VarietyRules::default(),
        }
    }

    /// Replace the variety rules.
    #[must_use]
    pub fn with_variety(mut self, variety: VarietyRules) -> Self {
        self.variety = variety;
        self
    }

    /// Check every field against its invariant.
    ///
    /// A `min_per_item_kg` above `max_per_item_kg` is deliberately not an
    /// error here: the request is well-formed, it just has an empty feasible
    /// region, which the solve reports as infeasible.
    ///
    /// # Errors
    ///
    /// Returns the first [`RequestError`] found.
    pub fn validate(&self) -> Result<(), RequestError> {
        let fields = [
            ("budget_max", self.budget_max),
            ("protein_min_g", self.protein_min_g),
            ("fat_max_g", self.fat_max_g),
            ("carbs_max_g", self.carbs_max_g),
            ("produce_min_kg", self.produce_min_kg),
            ("max_per_item_kg", self.variety.max_per_item_kg),
            ("min_per_item_kg", self.variety.min_per_item_kg),
            ("produce_max_multiplier", self.variety.produce_max_multiplier),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(RequestError::NotFinite { field, value });
            }

            if value < 0.0 {
                return Err(RequestError::Negative { field, value });
            }
        }

        let positive_fields = [
            ("budget_max", self.budget_max),
            ("max_per_item_kg", self.variety.max_per_item_kg),
        ];

        for (field, value) in positive_fields {
            if value <= 0.0 {
                return Err(RequestError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}
