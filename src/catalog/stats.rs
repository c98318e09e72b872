//! Catalog analytics

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};

use crate::catalog::Catalog;

/// Catalog-wide price and produce statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStats {
    /// Number of products in the catalog
    pub products: usize,

    /// Number of produce-flagged products
    pub produce_products: usize,

    /// Mean price per kilogram over produce products, if any exist
    pub mean_price_produce: Option<f64>,

    /// Mean price per kilogram over non-produce products, if any exist
    pub mean_price_other: Option<f64>,
}

impl CatalogStats {
    /// Compute statistics over a catalog.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut produce_sum = 0.0_f64;
        let mut produce_n = 0.0_f64;
        let mut other_sum = 0.0_f64;
        let mut other_n = 0.0_f64;

        for (_key, product) in catalog.iter() {
            if product.is_produce {
                produce_sum += product.price_per_kg;
                produce_n += 1.0;
            } else {
                other_sum += product.price_per_kg;
                other_n += 1.0;
            }
        }

        Self {
            products: catalog.len(),
            produce_products: catalog.produce_count(),
            mean_price_produce: (produce_n > 0.0).then(|| produce_sum / produce_n),
            mean_price_other: (other_n > 0.0).then(|| other_sum / other_n),
        }
    }
}

/// One row of the protein-value ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinValue {
    /// Product name
    pub name: String,

    /// Price in euros per kilogram
    pub price_per_kg: f64,

    /// Protein content in grams per kilogram
    pub protein_g_per_kg: f64,

    /// Grams of protein bought per euro spent
    pub protein_per_euro: f64,
}

/// Rank products by grams of protein per euro, best first.
///
/// `top` bounds the number of rows returned.
#[must_use]
pub fn protein_per_euro_ranking(catalog: &Catalog, top: usize) -> Vec<ProteinValue> {
    let mut ranking: Vec<ProteinValue> = catalog
        .iter()
        .map(|(_key, product)| ProteinValue {
            name: product.name.clone(),
            price_per_kg: product.price_per_kg,
            protein_g_per_kg: product.protein_g_per_kg,
            // Catalog validation guarantees a positive price.
            protein_per_euro: product.protein_g_per_kg / product.price_per_kg,
        })
        .collect();

    ranking.sort_by(|a, b| b.protein_per_euro.total_cmp(&a.protein_per_euro));
    ranking.truncate(top);

    ranking
}

/// Render the statistics as a table.
///
/// # Errors
///
/// Returns an error if the table cannot be written to `out`.
pub fn write_stats(mut out: impl io::Write, stats: &CatalogStats) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Metric", "Value"]);
    builder.push_record(["Products".to_owned(), stats.products.to_string()]);
    builder.push_record([
        "Produce products".to_owned(),
        stats.produce_products.to_string(),
    ]);
    builder.push_record([
        "Mean price, produce (EUR/kg)".to_owned(),
        format_mean(stats.mean_price_produce),
    ]);
    builder.push_record([
        "Mean price, other (EUR/kg)".to_owned(),
        format_mean(stats.mean_price_other),
    ]);

    let table = style_table(builder, 1..2);

    writeln!(out, "{table}")
}

/// Render a protein-value ranking as a table, best first.
///
/// # Errors
///
/// Returns an error if the table cannot be written to `out`.
pub fn write_ranking(mut out: impl io::Write, ranking: &[ProteinValue]) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Product", "Price (EUR/kg)", "Protein (g/kg)", "Protein/EUR"]);

    for row in ranking {
        builder.push_record([
            row.name.clone(),
            format!("{:.2}", row.price_per_kg),
            format!("{:.0}", row.protein_g_per_kg),
            format!("{:.1}", row.protein_per_euro),
        ]);
    }

    let table = style_table(builder, 1..4);

    writeln!(out, "{table}")
}

/// Render every catalog product as a table, in insertion order.
///
/// # Errors
///
/// Returns an error if the table cannot be written to `out`.
pub fn write_products(mut out: impl io::Write, catalog: &Catalog) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record([
        "Product",
        "Price (EUR/kg)",
        "Protein (g/kg)",
        "Fat (g/kg)",
        "Carbs (g/kg)",
        "Produce",
    ]);

    for (_key, product) in catalog.iter() {
        builder.push_record([
            product.name.clone(),
            format!("{:.2}", product.price_per_kg),
            format!("{:.0}", product.protein_g_per_kg),
            format!("{:.0}", product.fat_g_per_kg),
            format!("{:.0}", product.carbs_g_per_kg),
            if product.is_produce { "yes" } else { "" }.to_owned(),
        ]);
    }

    let table = style_table(builder, 1..5);

    writeln!(out, "{table}")
}

fn style_table(builder: Builder, numeric_columns: std::ops::Range<usize>) -> tabled::Table {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(numeric_columns), Alignment::right());

    table
}

fn format_mean(mean: Option<f64>) -> String {
    mean.map_or_else(|| "n/a".to_owned(), |value| format!("{value:.2}"))
}
