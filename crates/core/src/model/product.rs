//! Product catalog rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Price, ProductId, UnitType};

/// A catalog product as stored in the `products` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    /// Available colors, in display order.
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form specification sheet (key -> value, untyped).
    #[serde(default)]
    pub specifications: Map<String, Value>,
    pub price: Price,
    pub unit: UnitType,
    /// Units in stock; never negative.
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brochure_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert body for a new product. Id and timestamps are store defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub specifications: Map<String, Value>,
    pub price: Price,
    pub unit: UnitType,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brochure_url: Option<String>,
    pub is_active: bool,
}

/// Partial update for a product; `None` fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brochure_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_with_defaults() {
        // Row without optional columns, as older rows in the store may look.
        let json = serde_json::json!({
            "id": "7b6a3c64-48cf-4f3e-9a19-2f4d5f8b6c01",
            "name": "FR PVC Insulated Wire 1.5 sqmm",
            "brand": "Polycab",
            "category": "house-wire",
            "price": "1450.00",
            "unit": "coils",
            "stock": 24,
            "is_active": true,
            "created_at": "2025-11-02T10:15:00Z",
            "updated_at": "2025-11-02T10:15:00Z"
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert!(product.colors.is_empty());
        assert!(product.specifications.is_empty());
        assert!(product.description.is_none());
        assert_eq!(product.unit, UnitType::Coils);
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = ProductPatch {
            stock: Some(10),
            ..ProductPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "stock": 10 }));
    }
}
