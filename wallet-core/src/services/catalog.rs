//! Product catalog service

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::money::validate_amount;
use crate::domain::result::{Result, WalletError};
use crate::domain::{NewProduct, Product};
use crate::ports::Repository;

pub struct CatalogService {
    repository: Arc<dyn Repository>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Validate and store a new product
    pub fn add_product(&self, input: NewProduct) -> Result<Product> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(WalletError::invalid("Product name is required"));
        }
        let price = validate_amount(input.price, "Price")?;
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let product = Product::new(name, price, description);
        self.repository.insert_product(&product)?;
        Ok(product)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.repository.list_products()
    }

    pub fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        self.repository.find_product(id)
    }
}
