//! Product model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived stock level indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl InventoryStatus {
    /// Derive the status from the current quantity and low-stock threshold.
    ///
    /// Products without inventory tracking are always in stock.
    pub fn derive(track_inventory: bool, quantity: i32, low_stock_threshold: i32) -> Self {
        if !track_inventory {
            return Self::InStock;
        }
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= low_stock_threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

/// Product catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub tenant_id: String,
    pub name: String,
    /// Unique per tenant
    pub sku: String,
    pub price: Decimal,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub track_inventory: bool,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub is_active: bool,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Derived stock level for API responses
    pub fn inventory_status(&self) -> InventoryStatus {
        InventoryStatus::derive(self.track_inventory, self.quantity, self.low_stock_threshold)
    }
}

/// Product variant (per-variant SKU, optional price override, own stock)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    /// Falls back to the product price when absent
    pub price: Option<Decimal>,
    pub quantity: i32,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub track_inventory: Option<bool>,
    pub quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub variants: Option<Vec<VariantCreate>>,
}

/// Create variant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantCreate {
    pub name: String,
    pub sku: String,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
}

/// Update product payload (absent fields keep their current value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub track_inventory: Option<bool>,
    pub low_stock_threshold: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_status_untracked_is_in_stock() {
        assert_eq!(
            InventoryStatus::derive(false, 0, 5),
            InventoryStatus::InStock
        );
        assert_eq!(
            InventoryStatus::derive(false, -3, 5),
            InventoryStatus::InStock
        );
    }

    #[test]
    fn test_inventory_status_thresholds() {
        assert_eq!(InventoryStatus::derive(true, 0, 5), InventoryStatus::OutOfStock);
        assert_eq!(InventoryStatus::derive(true, 3, 5), InventoryStatus::LowStock);
        assert_eq!(InventoryStatus::derive(true, 5, 5), InventoryStatus::LowStock);
        assert_eq!(InventoryStatus::derive(true, 6, 5), InventoryStatus::InStock);
    }
}
