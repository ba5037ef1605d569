//! Product service - inventory records

use std::sync::Arc;

use tracing::debug;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{Product, ProductInput};

/// Product service for inventory CRUD and stock movements
pub struct ProductService {
    repository: Arc<DuckDbRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// List products by name, optionally keeping only names that contain `filter`
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Product>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        self.repository.get_products(filter)
    }

    pub fn get(&self, id: i64) -> Result<Product> {
        self.repository
            .get_product_by_id(id)?
            .ok_or_else(|| Error::not_found(format!("Product {}", id)))
    }

    /// Add a product and return its id
    pub fn add(&self, input: &ProductInput) -> Result<i64> {
        let input = input.normalized();
        input.validate().map_err(Error::validation)?;

        let id = self.repository.insert_product(&input)?;
        debug!(id, "product added");
        Ok(id)
    }

    pub fn update(&self, id: i64, input: &ProductInput) -> Result<()> {
        let input = input.normalized();
        input.validate().map_err(Error::validation)?;
        self.repository.update_product(id, &input)
    }

    /// Delete a product. Deleting an unknown id is a no-op.
    ///
    /// Appointments that mention the product in their consumption are left as they are.
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self.repository.delete_product(id)?;
        debug!(id, deleted, "product delete");
        Ok(())
    }

    /// Reduce stock of the product named `name` (case-insensitive)
    ///
    /// Unknown names are ignored. Returns whether a product was updated.
    pub fn decrement_stock(&self, name: &str, amount: f64) -> Result<bool> {
        self.repository.decrement_stock(name.trim(), amount)
    }
}
