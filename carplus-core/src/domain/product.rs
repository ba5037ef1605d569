//! Product domain model

use serde::{Deserialize, Serialize};

/// An inventory item used during services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Stock on hand. Consumption can push it below zero.
    pub qty: f64,
    pub unit_price: f64,
    /// Reorder point. Informational only.
    pub threshold: f64,
}

impl Product {
    /// True when stock has dropped to or below the reorder threshold
    ///
    /// A threshold of zero means "not tracked" unless stock is already negative.
    pub fn is_below_threshold(&self) -> bool {
        if self.threshold > 0.0 {
            self.qty <= self.threshold
        } else {
            self.qty < 0.0
        }
    }
}

/// User-supplied fields for creating or editing a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub qty: f64,
    pub unit_price: f64,
    pub threshold: f64,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, qty: f64, unit_price: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            qty,
            unit_price,
            threshold,
        }
    }

    /// Trim text fields the way they are persisted
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            ..self.clone()
        }
    }

    /// Validate product data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("product name cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(qty: f64, threshold: f64) -> Product {
        Product {
            id: 1,
            name: "Wax".to_string(),
            qty,
            unit_price: 12.5,
            threshold,
        }
    }

    #[test]
    fn test_below_threshold() {
        assert!(product(1.0, 2.0).is_below_threshold());
        assert!(product(2.0, 2.0).is_below_threshold());
        assert!(!product(3.0, 2.0).is_below_threshold());
        assert!(!product(0.0, 0.0).is_below_threshold());
        assert!(product(-1.0, 0.0).is_below_threshold());
    }

    #[test]
    fn test_input_validation() {
        assert!(ProductInput::new("Shampoo", 1.0, 0.0, 0.0).validate().is_ok());
        assert!(ProductInput::new("   ", 1.0, 0.0, 0.0).validate().is_err());
        assert_eq!(ProductInput::new("  Wax ", 0.0, 0.0, 0.0).normalized().name, "Wax");
    }
}
