//! Orders repository.
//!
//! Orders are append-then-advance: checkout creates the row, owner actions
//! move the status fields, and nothing here ever deletes one.

use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use tracing::error;

use copperkart_core::{NewOrder, Order, OrderId, OrderStatus, PaymentStatus, UserId};

use super::{EntityChange, Store, decode_row, decode_rows, typed_callback};
use crate::backend::{BackendError, RowPredicate, RowQuery};
use crate::realtime::Subscription;

const TABLE: &str = "orders";

/// Repository for orders.
pub struct Orders<'a> {
    store: &'a Store,
}

impl<'a> Orders<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Orders, newest first, optionally restricted to one customer.
    /// Failures are logged and come back as an empty list.
    pub async fn list(&self, owner: Option<UserId>) -> Vec<Order> {
        if !self.store.backend().is_configured() {
            return Vec::new();
        }

        let mut query = RowQuery::new().order_desc("created_at");
        if let Some(owner) = owner {
            query = query.eq("user_id", owner);
        }

        match self.store.backend().select(TABLE, query).await {
            Ok(rows) => decode_rows(rows, TABLE),
            Err(error) => {
                error!(%error, "failed to list orders");
                Vec::new()
            }
        }
    }

    /// One order by id. Missing rows and failures both come back as `None`;
    /// only failures are logged.
    pub async fn get(&self, id: OrderId) -> Option<Order> {
        if !self.store.backend().is_configured() {
            return None;
        }

        match self
            .store
            .backend()
            .select_single(TABLE, RowQuery::new().eq("id", id))
            .await
        {
            Ok(Some(row)) => decode_row(row, TABLE),
            Ok(None) => None,
            Err(error) => {
                error!(%error, %id, "failed to fetch order");
                None
            }
        }
    }

    /// Place an order at checkout.
    ///
    /// The repository assigns the order number and forces both statuses to
    /// pending; callers only supply the checkout data.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn create(&self, order: &NewOrder) -> Result<Option<Order>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let mut body = serde_json::to_value(order)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert(
                "order_number".to_string(),
                Value::String(generate_order_number()),
            );
            fields.insert(
                "status".to_string(),
                serde_json::to_value(OrderStatus::Pending)?,
            );
            fields.insert(
                "payment_status".to_string(),
                serde_json::to_value(PaymentStatus::Pending)?,
            );
        }

        let row = self.store.backend().insert(TABLE, &body).await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Advance the fulfillment status.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let patch = serde_json::json!({ "status": status });
        let row = self
            .store
            .backend()
            .update(TABLE, id.as_uuid(), &patch)
            .await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Record a payment outcome, optionally attaching gateway metadata.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn update_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
        metadata: Option<Value>,
    ) -> Result<Option<Order>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let mut patch = serde_json::json!({ "payment_status": status });
        if let (Some(fields), Some(metadata)) = (patch.as_object_mut(), metadata) {
            fields.insert("payment_metadata".to_string(), metadata);
        }

        let row = self
            .store
            .backend()
            .update(TABLE, id.as_uuid(), &patch)
            .await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Subscribe to order changes, optionally restricted to one customer.
    pub async fn subscribe<F>(&self, owner: Option<UserId>, callback: F) -> Subscription
    where
        F: Fn(EntityChange<Order>) + Send + Sync + 'static,
    {
        let predicate = owner.map(|owner| RowPredicate::eq("user_id", owner));
        self.store
            .realtime()
            .subscribe(TABLE, predicate, typed_callback(callback))
            .await
    }
}

/// A human-facing order number: date plus a short random suffix. The store
/// has a unique constraint on the column; a collision surfaces as a failed
/// insert for the caller to retry.
fn generate_order_number() -> String {
    let suffix: u32 = rand::rng().random_range(0..0x1_0000);
    format!("CK-{}-{suffix:04X}", Utc::now().format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        let mut parts = number.split('-');
        assert_eq!(parts.next(), Some("CK"));
        assert_eq!(parts.next().map(str::len), Some(8));
        assert_eq!(parts.next().map(str::len), Some(4));
        assert_eq!(parts.next(), None);
    }
}
