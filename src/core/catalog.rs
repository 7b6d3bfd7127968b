//! Product catalog - the read-only list of things a customer can put in a cart.
//!
//! The catalog is loaded once at start-up (from `[[products]]` in the TOML
//! configuration, or the built-in farm list) and never mutated afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product offered by the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier, used to detect duplicate cart lines
    pub id: String,
    /// Display name (e.g., "Free-range eggs (dozen)")
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Image reference shown next to the product
    #[serde(default)]
    pub image: Option<String>,
    /// Grouping such as "eggs" or "meat"
    #[serde(default)]
    pub category: Option<String>,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
}

/// The full set of products, in display order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from an ordered product list.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The farm's standard product range.
    #[must_use]
    pub fn builtin() -> Self {
        let product = |id: &str, name: &str, cents: i64, category: &str| Product {
            id: id.to_string(),
            name: name.to_string(),
            price: Decimal::new(cents, 2),
            image: Some(format!("images/products/{id}.jpg")),
            category: Some(category.to_string()),
            description: None,
        };

        Self::new(vec![
            product("eggs-dozen", "Free-range eggs (dozen)", 450, "eggs"),
            product("eggs-tray", "Free-range eggs (tray of 30)", 1050, "eggs"),
            product("whole-chicken", "Whole broiler chicken", 1299, "meat"),
            product("chicken-breast", "Chicken breast (1 kg)", 995, "meat"),
            product("drumsticks", "Drumsticks (1 kg)", 650, "meat"),
            product("day-old-chicks", "Day-old chicks (box of 10)", 2500, "live birds"),
            product("layer-feed", "Layer feed (25 kg)", 3200, "feed"),
        ])
    }

    /// All products in display order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Finds a product by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Finds a product by name, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        let wanted = name.trim();
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
    }

    /// Product names containing `partial` (ASCII case-insensitive), in display order.
    #[must_use]
    pub fn names_matching(&self, partial: &str) -> Vec<String> {
        let partial_lower = partial.to_ascii_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_ascii_lowercase().contains(&partial_lower))
            .map(|p| p.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_builtin_catalog_has_unique_ids() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<&str> = catalog.products().iter().map(|p| p.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let catalog = Catalog::builtin();
        let product = catalog.find_by_name("  free-range EGGS (dozen) ").unwrap();
        assert_eq!(product.id, "eggs-dozen");
        assert_eq!(product.price, Decimal::new(450, 2));
        assert!(catalog.find_by_name("goose").is_none());
    }

    #[test]
    fn test_names_matching() {
        let catalog = Catalog::builtin();
        let names = catalog.names_matching("EGGS");
        assert_eq!(
            names,
            vec!["Free-range eggs (dozen)", "Free-range eggs (tray of 30)"]
        );
    }
}
