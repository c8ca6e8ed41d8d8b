//! Inquiries repository.

use tracing::error;

use copperkart_core::{Inquiry, InquiryId, InquiryStatus, NewInquiry, UserId};

use super::{EntityChange, Store, decode_row, decode_rows, typed_callback};
use crate::backend::{BackendError, RowPredicate, RowQuery};
use crate::realtime::Subscription;

const TABLE: &str = "inquiries";

/// Repository for bulk/custom inquiries.
pub struct Inquiries<'a> {
    store: &'a Store,
}

impl<'a> Inquiries<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Inquiries, newest first, optionally restricted to one customer.
    /// Failures are logged and come back as an empty list.
    pub async fn list(&self, owner: Option<UserId>) -> Vec<Inquiry> {
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
                error!(%error, "failed to list inquiries");
                Vec::new()
            }
        }
    }

    /// One inquiry by id. Missing rows and failures both come back as
    /// `None`; only failures are logged.
    pub async fn get(&self, id: InquiryId) -> Option<Inquiry> {
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
                error!(%error, %id, "failed to fetch inquiry");
                None
            }
        }
    }

    /// File a new inquiry. Status is always created as pending, whatever
    /// the caller's intent.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn create(&self, inquiry: &NewInquiry) -> Result<Option<Inquiry>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let mut body = serde_json::to_value(inquiry)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert(
                "status".to_string(),
                serde_json::to_value(InquiryStatus::Pending)?,
            );
        }

        let row = self.store.backend().insert(TABLE, &body).await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Move an inquiry through its lifecycle. The only mutation inquiries
    /// support.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn update_status(
        &self,
        id: InquiryId,
        status: InquiryStatus,
    ) -> Result<Option<Inquiry>, BackendError> {
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

    /// Subscribe to inquiry changes, optionally restricted to one customer.
    pub async fn subscribe<F>(&self, owner: Option<UserId>, callback: F) -> Subscription
    where
        F: Fn(EntityChange<Inquiry>) + Send + Sync + 'static,
    {
        let predicate = owner.map(|owner| RowPredicate::eq("user_id", owner));
        self.store
            .realtime()
            .subscribe(TABLE, predicate, typed_callback(callback))
            .await
    }
}
