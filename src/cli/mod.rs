//! Command tree for the `ration` binary.

use std::{
    io::{self, Write as _},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use ration::prelude::*;
use ration::catalog::stats::{write_products, write_ranking, write_stats};

/// Errors a CLI invocation can end in.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// The catalog file could not be read or parsed.
    #[error(transparent)]
    Catalog(#[from] CatalogIoError),

    /// The optimization failed; carries the full taxonomy, diagnostics included.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The plan could not be encoded as JSON.
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Parser)]
#[command(
    name = "ration",
    about = "Cheapest shopping list under nutritional targets",
    long_about = None
)]
pub(crate) struct Cli {
    /// Catalog CSV file
    #[arg(
        long,
        global = true,
        env = "RATION_CATALOG",
        default_value = "data/food_data.csv"
    )]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the cheapest plan meeting the given targets
    Optimize(OptimizeArgs),

    /// Inspect the product catalog
    Catalog(CatalogCommand),
}

#[derive(Debug, Args)]
struct OptimizeArgs {
    /// Budget ceiling in euros
    #[arg(long)]
    budget: f64,

    /// Minimum total protein in grams
    #[arg(long)]
    protein: f64,

    /// Maximum total fat in grams
    #[arg(long)]
    fat: f64,

    /// Maximum total carbohydrates in grams
    #[arg(long)]
    carbs: f64,

    /// Minimum produce mass in kilograms
    #[arg(long)]
    produce: f64,

    /// Per-item purchase cap in kilograms
    #[arg(long, default_value_t = VarietyRules::DEFAULT_MAX_PER_ITEM_KG)]
    max_per_item: f64,

    /// Minimum purchase per selected item in kilograms
    #[arg(long, default_value_t = VarietyRules::DEFAULT_MIN_PER_ITEM_KG)]
    min_per_item: f64,

    /// Minimum number of distinct products
    #[arg(long, default_value_t = VarietyRules::DEFAULT_MIN_UNIQUE_ITEMS)]
    min_unique: u32,

    /// Multiplier applied to the per-item cap for produce items
    #[arg(long, default_value_t = VarietyRules::DEFAULT_PRODUCE_MAX_MULTIPLIER)]
    produce_multiplier: f64,

    /// Abort the solve after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Table,

    /// JSON payload
    Json,
}

#[derive(Debug, Args)]
struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Price and produce statistics plus the protein-value ranking
    Stats(StatsArgs),

    /// List every product in the catalog
    Show,
}

#[derive(Debug, Args)]
struct StatsArgs {
    /// Number of ranking rows to show
    #[arg(long, default_value_t = 10)]
    top: usize,
}

impl Cli {
    pub(crate) fn run(self) -> Result<(), CliError> {
        let provider = CatalogProvider::open(self.catalog)?;
        let snapshot = provider.snapshot();

        match self.command {
            Commands::Optimize(args) => optimize(&snapshot, &args),
            Commands::Catalog(CatalogCommand {
                command: CatalogSubcommand::Stats(args),
            }) => stats(&snapshot, &args),
            Commands::Catalog(CatalogCommand {
                command: CatalogSubcommand::Show,
            }) => show(&snapshot),
        }
    }
}

fn optimize(catalog: &Catalog, args: &OptimizeArgs) -> Result<(), CliError> {
    let request = PlanRequest::new(args.budget, args.protein, args.fat, args.carbs, args.produce)
        .with_variety(VarietyRules {
            max_per_item_kg: args.max_per_item,
            min_per_item_kg: args.min_per_item,
            min_unique_items: args.min_unique,
            produce_max_multiplier: args.produce_multiplier,
        });

    let planner = args.timeout_ms.map_or_else(Planner::new, |millis| {
        Planner::new().with_solve_timeout(Duration::from_millis(millis))
    });

    let plan = planner.plan(catalog, &request)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match args.format {
        OutputFormat::Table => plan.write_to(&mut handle)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut handle, &plan)?;
            writeln!(handle)?;
        }
    }

    Ok(())
}

fn stats(catalog: &Catalog, args: &StatsArgs) -> Result<(), CliError> {
    let stats = CatalogStats::from_catalog(catalog);
    let ranking = protein_per_euro_ranking(catalog, args.top);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    write_stats(&mut handle, &stats)?;
    write_ranking(&mut handle, &ranking)?;

    Ok(())
}

fn show(catalog: &Catalog) -> Result<(), CliError> {
    let stdout = io::stdout();

    write_products(stdout.lock(), catalog)?;

    Ok(())
}
