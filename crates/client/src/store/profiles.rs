//! Customer profile repository.

use tracing::error;

use copperkart_core::{ProfileUpsert, UserId, UserProfile};

use super::{EntityChange, Store, decode_row, typed_callback};
use crate::backend::{BackendError, RowPredicate, RowQuery};
use crate::realtime::Subscription;

const TABLE: &str = "user_profiles";

/// Repository for customer profiles (one row per user).
pub struct Profiles<'a> {
    store: &'a Store,
}

impl<'a> Profiles<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The profile belonging to `user`. Missing rows and failures both come
    /// back as `None`; only failures are logged.
    pub async fn get_by_user(&self, user: UserId) -> Option<UserProfile> {
        if !self.store.backend().is_configured() {
            return None;
        }

        match self
            .store
            .backend()
            .select_single(TABLE, RowQuery::new().eq("user_id", user))
            .await
        {
            Ok(Some(row)) => decode_row(row, TABLE),
            Ok(None) => None,
            Err(error) => {
                error!(%error, %user, "failed to fetch profile");
                None
            }
        }
    }

    /// Create or update the profile for `upsert.user_id`, merging on the
    /// unique user id. Any upsert marks the profile completed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. `Ok(None)` only on an unconfigured
    /// backend.
    pub async fn upsert(&self, upsert: &ProfileUpsert) -> Result<Option<UserProfile>, BackendError> {
        if !self.store.backend().is_configured() {
            return Ok(None);
        }

        let mut body = serde_json::to_value(upsert)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert(
                "profile_completed".to_string(),
                serde_json::Value::Bool(true),
            );
        }

        let row = self.store.backend().upsert(TABLE, "user_id", &body).await?;
        Ok(Some(serde_json::from_value(row)?))
    }

    /// Subscribe to profile changes, optionally restricted to one user.
    pub async fn subscribe<F>(&self, owner: Option<UserId>, callback: F) -> Subscription
    where
        F: Fn(EntityChange<UserProfile>) + Send + Sync + 'static,
    {
        let predicate = owner.map(|owner| RowPredicate::eq("user_id", owner));
        self.store
            .realtime()
            .subscribe(TABLE, predicate, typed_callback(callback))
            .await
    }
}
