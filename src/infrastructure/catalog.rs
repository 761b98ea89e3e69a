use crate::domain::money::Price;
use crate::domain::order::{CustomerId, ProductId};
use crate::domain::ports::CatalogResolver;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// Catalog resolver backed by fixed customer and product sets.
///
/// Stands in for the customer directory and product catalog when running
/// against the in-memory database.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    customers: HashSet<CustomerId>,
    products: HashMap<ProductId, Price>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    customers: Vec<CustomerId>,
    #[serde(default)]
    products: Vec<ProductEntry>,
}

#[derive(Deserialize)]
struct ProductEntry {
    id: ProductId,
    price: Price,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(mut self, id: CustomerId) -> Self {
        self.customers.insert(id);
        self
    }

    pub fn with_product(mut self, id: ProductId, price: Price) -> Self {
        self.products.insert(id, price);
        self
    }

    /// Loads a catalog from JSON of the form
    /// `{"customers": ["C1"], "products": [{"id": "P1", "price": "10.00"}]}`.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let file: CatalogFile = serde_json::from_reader(source)?;
        let catalog = file
            .products
            .into_iter()
            .fold(Self::new(), |catalog, p| catalog.with_product(p.id, p.price));
        Ok(file
            .customers
            .into_iter()
            .fold(catalog, InMemoryCatalog::with_customer))
    }
}

#[async_trait]
impl CatalogResolver for InMemoryCatalog {
    async fn customer_exists(&self, id: &CustomerId) -> Result<bool> {
        Ok(self.customers.contains(id))
    }

    async fn product_price(&self, id: &ProductId) -> Result<Option<Price>> {
        Ok(self.products.get(id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_catalog_from_json() {
        let json = r#"{"customers": ["C1"], "products": [{"id": "P1", "price": "10.00"}]}"#;
        let catalog = InMemoryCatalog::from_reader(json.as_bytes()).unwrap();

        assert!(catalog.customer_exists(&CustomerId::new("C1").unwrap()).await.unwrap());
        assert!(!catalog.customer_exists(&CustomerId::new("C2").unwrap()).await.unwrap());
        assert_eq!(
            catalog
                .product_price(&ProductId::new("P1").unwrap())
                .await
                .unwrap()
                .map(|p| p.value()),
            Some(dec!(10.00))
        );
        assert!(catalog
            .product_price(&ProductId::new("P2").unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_catalog_rejects_float_prices() {
        let json = r#"{"products": [{"id": "P1", "price": 10.5}]}"#;
        assert!(InMemoryCatalog::from_reader(json.as_bytes()).is_err());
    }
}
