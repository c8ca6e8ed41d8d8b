//! Order rows.
//!
//! Orders are created once at checkout and then only advanced by owner
//! actions; nothing in this client ever deletes one. The line items are kept
//! opaque (whatever the checkout UI assembled) - this layer stores and
//! relays them without interpreting their shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{OrderId, OrderStatus, PaymentStatus, Price, UserId};

/// An order as stored in the `orders` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-facing unique order number (e.g. `CK-20260805-4F2A`).
    pub order_number: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    /// Opaque line items, in the order the customer added them.
    #[serde(default)]
    pub items: Vec<Value>,
    pub subtotal: Price,
    pub shipping: Price,
    /// By convention subtotal + shipping; not enforced client-side.
    pub total: Price,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert body for a checkout. Order number and statuses are assigned by the
/// orders repository, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub items: Vec<Value>,
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_roundtrip_preserves_opaque_items() {
        let json = serde_json::json!({
            "id": "0d0cf9be-94a4-4c8e-a2a6-30cf6f9b01aa",
            "user_id": "b0cb3c1e-6f0a-47a5-8a0d-9a35a8c2f915",
            "order_number": "CK-20260805-4F2A",
            "customer_name": "Asha Verma",
            "customer_phone": "9876543210",
            "items": [
                { "product_id": "x", "qty": 3, "colour": "red" },
                { "product_id": "y", "qty": 1 }
            ],
            "subtotal": "2400.00",
            "shipping": "150.00",
            "total": "2550.00",
            "status": "pending",
            "payment_status": "pending",
            "created_at": "2026-08-05T08:00:00Z",
            "updated_at": "2026-08-05T08:00:00Z"
        });

        let order: Order = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.status, OrderStatus::Pending);

        // Items survive untouched, including fields this layer knows nothing about.
        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back.get("items"), json.get("items"));
    }
}
