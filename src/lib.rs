//! Ration
//!
//! Ration is a constrained shopping-list optimizer: given a catalog of priced,
//! nutrient-tagged products and a set of nutritional targets, it computes the
//! cheapest combination of product quantities that meets every target, or
//! reports definitively that no feasible plan exists.
//!
//! ```
//! use ration::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::with_products([
//!     Product::new("Oats", 1.8).with_nutrients(135.0, 70.0, 600.0),
//!     Product::new("Lentils", 2.4).with_nutrients(260.0, 11.0, 530.0),
//!     Product::new("Bananas", 1.6).with_nutrients(11.0, 3.0, 230.0).produce(),
//! ])?;
//!
//! let request = PlanRequest::new(12.0, 150.0, 300.0, 2500.0, 0.5).with_variety(VarietyRules {
//!     min_unique_items: 2,
//!     ..VarietyRules::default()
//! });
//!
//! let plan = Planner::new().plan(&catalog, &request)?;
//!
//! assert!(plan.total_cost <= 12.0);
//! assert!(plan.items.len() >= 2);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod plan;
pub mod planner;
pub mod prelude;
pub mod request;
pub mod solvers;
