//! Product catalog

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

pub mod csv;
pub mod provider;
pub mod stats;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// One catalog entry: a priced, nutrient-tagged product.
#[derive(Debug, Clone)]
pub struct Product {
    /// Display name, unique within a catalog
    pub name: String,

    /// Price in euros per kilogram
    pub price_per_kg: f64,

    /// Protein content in grams per kilogram
    pub protein_g_per_kg: f64,

    /// Fat content in grams per kilogram
    pub fat_g_per_kg: f64,

    /// Carbohydrate content in grams per kilogram
    pub carbs_g_per_kg: f64,

    /// Produce items count toward the produce target and get a relaxed per-item cap
    pub is_produce: bool,
}

impl Product {
    /// Create a product with the given name and price and zero nutrient content.
    #[must_use]
    pub fn new(name: impl Into<String>, price_per_kg: f64) -> Self {
        Self {
            name: name.into(),
            price_per_kg,
            protein_g_per_kg: 0.0,
            fat_g_per_kg: 0.0,
            carbs_g_per_kg: 0.0,
            is_produce: false,
        }
    }

    /// Set the nutrient content in grams per kilogram.
    #[must_use]
    pub fn with_nutrients(
        mut self,
        protein_g_per_kg: f64,
        fat_g_per_kg: f64,
        carbs_g_per_kg: f64,
    ) -> Self {
        self.protein_g_per_kg = protein_g_per_kg;
        self.fat_g_per_kg = fat_g_per_kg;
        self.carbs_g_per_kg = carbs_g_per_kg;
        self
    }

    /// Mark the product as produce.
    #[must_use]
    pub fn produce(mut self) -> Self {
        self.is_produce = true;
        self
    }
}

/// Errors rejecting a product from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Product name is empty after trimming.
    #[error("product name must not be empty")]
    EmptyName,

    /// A product with the same name is already in the catalog.
    #[error("duplicate product name: {0}")]
    DuplicateName(String),

    /// Price must be a finite, positive number.
    #[error("product {name} has invalid price per kg: {value}")]
    InvalidPrice {
        /// Product name
        name: String,

        /// Offending value
        value: f64,
    },

    /// Nutrient contents must be finite and non-negative.
    #[error("product {name} has invalid {field} content: {value}")]
    InvalidNutrient {
        /// Product name
        name: String,

        /// Which nutrient column was rejected
        field: &'static str,

        /// Offending value
        value: f64,
    },
}

/// Validated product catalog with stable keys and insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    names: FxHashMap<String, ProductKey>,
    order: Vec<ProductKey>,
    produce_count: usize,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from products, validating each in turn.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if any product fails validation or repeats a name.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        for product in products {
            catalog.push(product)?;
        }

        Ok(catalog)
    }

    /// Validate and add a product, returning its key.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the product fails validation or its name is taken.
    pub fn push(&mut self, product: Product) -> Result<ProductKey, CatalogError> {
        validate(&product)?;

        if self.names.contains_key(&product.name) {
            return Err(CatalogError::DuplicateName(product.name));
        }

        if product.is_produce {
            self.produce_count += 1;
        }

        let name = product.name.clone();
        let key = self.products.insert(product);

        self.names.insert(name, key);
        self.order.push(key);

        Ok(key)
    }

    /// Look up a product by key.
    #[must_use]
    pub fn get(&self, key: ProductKey) -> Option<&Product> {
        self.products.get(key)
    }

    /// Look up a product key by name.
    #[must_use]
    pub fn key_of(&self, name: &str) -> Option<ProductKey> {
        self.names.get(name).copied()
    }

    /// Iterate products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductKey, &Product)> {
        self.order
            .iter()
            .filter_map(|&key| self.products.get(key).map(|product| (key, product)))
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of produce-flagged products.
    #[must_use]
    pub fn produce_count(&self) -> usize {
        self.produce_count
    }
}

fn validate(product: &Product) -> Result<(), CatalogError> {
    if product.name.trim().is_empty() {
        return Err(CatalogError::EmptyName);
    }

    if !(product.price_per_kg.is_finite() && product.price_per_kg > 0.0) {
        return Err(CatalogError::InvalidPrice {
            name: product.name.clone(),
            value: product.price_per_kg,
        });
    }

    let nutrients = [
        ("protein", product.protein_g_per_kg),
        ("fat", product.fat_g_per_kg),
        ("carbs", product.carbs_g_per_kg),
    ];

    for (field, value) in nutrients {
        if !(value.is_finite() && value >= 0.0) {
            return Err(CatalogError::InvalidNutrient {
                name: product.name.clone(),
                field,
                value,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn test_products() -> [Product; 3] {
        [
            Product::new("Oats", 1.8).with_nutrients(135.0, 70.0, 600.0),
            Product::new("Lentils", 2.4).with_nutrients(260.0, 11.0, 530.0),
            Product::new("Bananas", 1.6).with_nutrients(11.0, 3.0, 230.0).produce(),
        ]
    }

    #[test]
    fn push_preserves_insertion_order() -> TestResult {
        let catalog = Catalog::with_products(test_products())?;

        let names: Vec<&str> = catalog.iter().map(|(_key, p)| p.name.as_str()).collect();

        assert_eq!(names, ["Oats", "Lentils", "Bananas"]);
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());

        Ok(())
    }

    #[test]
    fn push_returns_key_that_resolves_back_to_the_product() -> TestResult {
        let mut catalog = Catalog::new();

        let key = catalog.push(Product::new("Quark", 4.1))?;

        assert!(matches!(catalog.get(key), Some(p) if p.name == "Quark"));
        assert_eq!(catalog.key_of("Quark"), Some(key));
        assert_eq!(catalog.key_of("Skyr"), None);

        Ok(())
    }

    #[test]
    fn push_rejects_duplicate_name() -> TestResult {
        let mut catalog = Catalog::new();

        catalog.push(Product::new("Oats", 1.8))?;

        let result = catalog.push(Product::new("Oats", 2.0));

        assert!(matches!(result, Err(CatalogError::DuplicateName(name)) if name == "Oats"));
        assert_eq!(catalog.len(), 1);

        Ok(())
    }

    #[test]
    fn push_rejects_empty_name() {
        let mut catalog = Catalog::new();

        let result = catalog.push(Product::new("   ", 1.0));

        assert!(matches!(result, Err(CatalogError::EmptyName)));
    }

    #[test]
    fn push_rejects_non_positive_or_non_finite_price() {
        for price in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let mut catalog = Catalog::new();

            let result = catalog.push(Product::new("Oats", price));

            assert!(
                matches!(result, Err(CatalogError::InvalidPrice { .. })),
                "price {price} should be rejected"
            );
        }
    }

    #[test]
    fn push_rejects_negative_nutrient() {
        let mut catalog = Catalog::new();

        let result = catalog.push(Product::new("Oats", 1.8).with_nutrients(135.0, -1.0, 600.0));

        assert!(matches!(
            result,
            Err(CatalogError::InvalidNutrient { field: "fat", .. })
        ));
    }

    #[test]
    fn produce_count_tracks_produce_flags() -> TestResult {
        let catalog = Catalog::with_products(test_products())?;

        assert_eq!(catalog.produce_count(), 1);

        Ok(())
    }

    #[test]
    fn with_products_propagates_the_first_validation_error() {
        let result = Catalog::with_products([
            Product::new("Oats", 1.8),
            Product::new("Free Lunch", 0.0),
            Product::new("Oats", 2.0),
        ]);

        assert!(matches!(result, Err(CatalogError::InvalidPrice { .. })));
    }
}
