//! Catalog CSV ingestion
//!
//! Reads the `food_data.csv` product table: UTF-8 with a Latin-1 fallback,
//! malformed rows dropped and counted, duplicate names resolved first-seen-wins.

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogError, Product};

/// Column headers a catalog file must carry.
const REQUIRED_COLUMNS: [&str; 6] = [
    "Product_Name",
    "Price_per_kg_EUR",
    "Protein_g_per_kg",
    "Fat_g_per_kg",
    "Carbs_g_per_kg",
    "Is_Produce",
];

/// Errors raised while reading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogIoError {
    /// IO error reading the catalog file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// The file could not be parsed as CSV at all
    #[error("failed to parse catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row
    #[error("catalog file is missing required column: {0}")]
    MissingColumn(String),
}

/// Per-load bookkeeping for kept and dropped rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Rows that produced a catalog product
    pub loaded: usize,

    /// Rows dropped because a field failed to parse or validate
    pub malformed: usize,

    /// Rows dropped because an earlier row already used the name
    pub duplicates: usize,

    /// Whether the file had to be decoded as Latin-1
    pub latin1_fallback: bool,
}

/// One raw row of the catalog file.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    #[serde(rename = "Product_Name")]
    name: String,

    #[serde(rename = "Price_per_kg_EUR")]
    price_per_kg: f64,

    #[serde(rename = "Protein_g_per_kg")]
    protein_g_per_kg: f64,

    #[serde(rename = "Fat_g_per_kg")]
    fat_g_per_kg: f64,

    #[serde(rename = "Carbs_g_per_kg")]
    carbs_g_per_kg: f64,

    #[serde(rename = "Is_Produce")]
    is_produce: u8,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product {
            name: record.name.trim().to_owned(),
            price_per_kg: record.price_per_kg,
            protein_g_per_kg: record.protein_g_per_kg,
            fat_g_per_kg: record.fat_g_per_kg,
            carbs_g_per_kg: record.carbs_g_per_kg,
            is_produce: record.is_produce == 1,
        }
    }
}

/// Load a catalog from a CSV file on disk.
///
/// # Errors
///
/// Returns a [`CatalogIoError`] if the file cannot be read or its header row
/// is unusable. Individual bad rows are dropped and counted, not errors.
pub fn load_catalog(path: &Path) -> Result<(Catalog, LoadStats), CatalogIoError> {
    let bytes = fs::read(path)?;
    let (text, latin1_fallback) = decode_catalog_bytes(&bytes);

    let (catalog, mut stats) = parse_catalog(&text)?;

    stats.latin1_fallback = latin1_fallback;

    if stats.malformed > 0 || stats.duplicates > 0 {
        warn!(
            path = %path.display(),
            malformed = stats.malformed,
            duplicates = stats.duplicates,
            "dropped catalog rows"
        );
    }

    debug!(
        path = %path.display(),
        products = catalog.len(),
        latin1 = latin1_fallback,
        "loaded catalog"
    );

    Ok((catalog, stats))
}

/// Parse already-decoded catalog CSV text.
///
/// # Errors
///
/// Returns a [`CatalogIoError`] if the header row is missing a required column
/// or cannot be read.
pub fn parse_catalog(text: &str) -> Result<(Catalog, LoadStats), CatalogIoError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    check_required_columns(reader.headers()?)?;

    let mut catalog = Catalog::new();
    let mut stats = LoadStats::default();

    for row in reader.deserialize::<ProductRecord>() {
        match row {
            Ok(record) => insert_record(&mut catalog, &mut stats, record),
            Err(error) => {
                stats.malformed += 1;
                warn!(%error, "dropping malformed catalog row");
            }
        }
    }

    Ok((catalog, stats))
}

fn insert_record(catalog: &mut Catalog, stats: &mut LoadStats, record: ProductRecord) {
    if record.is_produce > 1 {
        stats.malformed += 1;
        warn!(
            name = %record.name,
            flag = record.is_produce,
            "dropping catalog row with non-binary Is_Produce flag"
        );
        return;
    }

    match catalog.push(Product::from(record)) {
        Ok(_key) => stats.loaded += 1,
        Err(CatalogError::DuplicateName(name)) => {
            stats.duplicates += 1;
            debug!(%name, "dropping duplicate catalog row");
        }
        Err(error) => {
            stats.malformed += 1;
            warn!(%error, "dropping invalid catalog row");
        }
    }
}

fn check_required_columns(headers: &csv::StringRecord) -> Result<(), CatalogIoError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(CatalogIoError::MissingColumn(column.to_owned()));
        }
    }

    Ok(())
}

fn decode_catalog_bytes(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_owned(), false),
        // Latin-1 maps every byte straight to the same code point.
        Err(_) => (bytes.iter().copied().map(char::from).collect(), true),
    }
}
