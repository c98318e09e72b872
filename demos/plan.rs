//! Shopping Plan Demo
//!
//! Builds a small in-code catalog and prints the cheapest plan for the given
//! targets. Lower the budget to watch the request turn infeasible.

use std::{io, time::Instant};

use anyhow::Result;
use clap::Parser;
use ration::prelude::*;

/// Arguments for the shopping plan demo
#[derive(Debug, Parser)]
struct DemoArgs {
    /// Budget ceiling in euros
    #[clap(short, long, default_value_t = 30.0)]
    budget: f64,

    /// Minimum total protein in grams
    #[clap(short, long, default_value_t = 700.0)]
    protein: f64,

    /// Maximum total fat in grams
    #[clap(short, long, default_value_t = 450.0)]
    fat: f64,

    /// Maximum total carbohydrates in grams
    #[clap(short, long, default_value_t = 4000.0)]
    carbs: f64,

    /// Minimum produce mass in kilograms
    #[clap(long, default_value_t = 1.5)]
    produce: f64,
}

/// Shopping Plan Demo
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = DemoArgs::parse();

    let catalog = demo_catalog()?;
    let request = PlanRequest::new(args.budget, args.protein, args.fat, args.carbs, args.produce);

    let start = Instant::now();

    match Planner::new().plan(&catalog, &request) {
        Ok(plan) => {
            let stdout = io::stdout();
            plan.write_to(stdout.lock())?;

            println!("\nSolution: {}s", start.elapsed().as_secs_f32());
        }
        Err(PlanError::Infeasible { diagnostics }) => {
            println!("No feasible plan: {diagnostics}");
        }
        Err(error) => return Err(error.into()),
    }

    Ok(())
}

fn demo_catalog() -> Result<Catalog, CatalogError> {
    Catalog::with_products([
        Product::new("Chicken Breast", 8.9).with_nutrients(230.0, 15.0, 0.0),
        Product::new("Eggs", 3.2).with_nutrients(126.0, 95.0, 7.0),
        Product::new("Quark", 2.6).with_nutrients(120.0, 2.0, 40.0),
        Product::new("Oats", 1.5).with_nutrients(135.0, 70.0, 600.0),
        Product::new("Red Lentils", 2.4).with_nutrients(255.0, 11.0, 530.0),
        Product::new("Whole Wheat Pasta", 1.9).with_nutrients(130.0, 25.0, 660.0),
        Product::new("Milk", 1.05).with_nutrients(34.0, 35.0, 48.0),
        Product::new("Bananas", 1.6).with_nutrients(11.0, 3.0, 230.0).produce(),
        Product::new("Apples", 2.3).with_nutrients(3.0, 2.0, 140.0).produce(),
        Product::new("Carrots", 1.2).with_nutrients(9.0, 2.0, 100.0).produce(),
        Product::new("Frozen Spinach", 2.1).with_nutrients(29.0, 4.0, 14.0).produce(),
    ])
}
