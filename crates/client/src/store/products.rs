//! Product catalog repository.

use tracing::error;

use copperkart_core::{NewProduct, Product, ProductId, ProductPatch};

use super::{EntityChange, Store, decode_row, decode_rows, typed_callback};
use crate::backend::{BackendError, RowQuery};
use crate::realtime::Subscription;

const TABLE: &str = "products";

/// Repository for catalog products.
pub struct Products<'a> {
    store: &'a Store,
}

impl<'a> Products<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All products, newest first. Failures are logged and come back as an
    /// empty list.
    pub async fn list(&self) -> Vec<Product> {
        if !self.store.backend().is_configured() {
            return Vec::new();
        }

        match self
            .store
            .backend()
            .select(TABLE, RowQuery::new().order_desc("created_at"))
            .await
        {
            Ok(rows) => decode_rows(rows, TABLE),
            Err(error) => {
                error!(%error, "failed to list products");
                Vec::new()
            }
        }
    }

    /// Products currently visible in the storefront, newest first.
    pub async fn list_active(&self) -> Vec<Product> {
        if !self.store.backend().is_configured() {
            return Vec::new();
        }

        match self
            .store
            .backend()
            .select(
                TABLE,
                RowQuery::new().eq("is_active", true).order_desc("created_at"),
            )
            .await
        {
            Ok(rows) => decode_rows(rows, TABLE),
            Err(error) => {
                error!(%error, "failed to list active products");
                Vec::new()
            }
        }
    }

    /// One product by id. Missing rows and failures both come back as
    /// `None`; only failures are logged.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
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
                error!(%error, %id, "failed to fetch product");
                None
            }
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn create(&self, product: &NewProduct) -> Result<Option<Product>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let row = self.store.backend().insert(TABLE, product).await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Patch a product.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let row = self
            .store
            .backend()
            .update(TABLE, id.as_uuid(), patch)
            .await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn delete(&self, id: ProductId) -> Result<(), BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(());
        }

        self.store.backend().delete(TABLE, id.as_uuid()).await
    }

    /// Subscribe to catalog changes.
    pub async fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(EntityChange<Product>) + Send + Sync + 'static,
    {
        self.store
            .realtime()
            .subscribe(TABLE, None, typed_callback(callback))
            .await
    }
}
