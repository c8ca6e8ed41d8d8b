//! Row CRUD against the backend's REST surface.
//!
//! Requests target `{url}/rest/v1/{table}` with equality filters, ordering
//! and limits expressed as query parameters (`?brand=eq.Polycab&
//! order=created_at.desc&limit=20`). Mutations ask for the affected row back
//! (`Prefer: return=representation`) so callers get the store's view of what
//! they just wrote, defaults and triggers included.

use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::{Backend, BackendError};

/// Filters, ordering and limit for a row select.
#[derive(Debug, Clone, Default)]
pub struct RowQuery {
    filters: Vec<(String, String)>,
    order_desc: Option<String>,
    limit: Option<u32>,
}

impl RowQuery {
    /// An unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Order by `column`, newest first.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_desc = Some(column.to_string());
        self
    }

    /// Cap the number of rows returned.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn into_params(self) -> Vec<(String, String)> {
        let mut params = self.filters;
        if let Some(column) = self.order_desc {
            params.push(("order".to_string(), format!("{column}.desc")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

impl Backend {
    /// Select rows from `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// or the backend rejects the request.
    #[instrument(skip(self, query), fields(table = %table))]
    pub async fn select(&self, table: &str, query: RowQuery) -> Result<Vec<Value>, BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .get(Self::endpoint(inner, &format!("rest/v1/{table}")))
            .query(&query.into_params())
            .header("apikey", inner.anon_key.expose_secret())
            .bearer_auth(Self::bearer_token(inner).await)
            .send()
            .await?;

        let rows: Vec<Value> = Self::read_json(response).await?;
        Ok(rows)
    }

    /// Select at most one row from `table`.
    ///
    /// Zero matching rows is the normal not-found signal and comes back as
    /// `Ok(None)`, never as an error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select`].
    pub async fn select_single(
        &self,
        table: &str,
        query: RowQuery,
    ) -> Result<Option<Value>, BackendError> {
        let rows = self.select(table, query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a row into `table`, returning the stored representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// or the backend rejects the insert.
    #[instrument(skip(self, body), fields(table = %table))]
    pub async fn insert<B: Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .post(Self::endpoint(inner, &format!("rest/v1/{table}")))
            .header("apikey", inner.anon_key.expose_secret())
            .header("Prefer", "return=representation")
            .bearer_auth(Self::bearer_token(inner).await)
            .json(body)
            .send()
            .await?;

        Self::read_single_row(response).await
    }

    /// Insert-or-update a row in `table`, merging on `on_conflict`.
    ///
    /// Only the columns present in `body` are written on conflict; the rest
    /// of the row is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// or the backend rejects the upsert.
    #[instrument(skip(self, body), fields(table = %table, on_conflict = %on_conflict))]
    pub async fn upsert<B: Serialize + Sync>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .post(Self::endpoint(inner, &format!("rest/v1/{table}")))
            .query(&[("on_conflict", on_conflict)])
            .header("apikey", inner.anon_key.expose_secret())
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .bearer_auth(Self::bearer_token(inner).await)
            .json(body)
            .send()
            .await?;

        Self::read_single_row(response).await
    }

    /// Patch the row of `table` with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// the backend rejects the patch, or no row has that id.
    #[instrument(skip(self, patch), fields(table = %table, id = %id))]
    pub async fn update<B: Serialize + Sync>(
        &self,
        table: &str,
        id: Uuid,
        patch: &B,
    ) -> Result<Value, BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .patch(Self::endpoint(inner, &format!("rest/v1/{table}")))
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", inner.anon_key.expose_secret())
            .header("Prefer", "return=representation")
            .bearer_auth(Self::bearer_token(inner).await)
            .json(patch)
            .send()
            .await?;

        Self::read_single_row(response).await
    }

    /// Delete the row of `table` with the given id.
    ///
    /// Deleting a row that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// or the backend rejects the delete.
    #[instrument(skip(self), fields(table = %table, id = %id))]
    pub async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .delete(Self::endpoint(inner, &format!("rest/v1/{table}")))
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", inner.anon_key.expose_secret())
            .bearer_auth(Self::bearer_token(inner).await)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status,
                message: truncate(&message),
            });
        }

        Ok(())
    }

    /// Read a JSON body, mapping non-success statuses to [`BackendError::Api`].
    pub(super) async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status,
                message: truncate(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Mutations return a representation array; unwrap its only element.
    async fn read_single_row(response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let mut rows: Vec<Value> = Self::read_json(response).await?;
        rows.pop().ok_or(BackendError::Api {
            status,
            message: "no row in representation".to_string(),
        })
    }
}

/// Keep error payloads log-sized.
fn truncate(message: &str) -> String {
    message.chars().take(500).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_query_params() {
        let params = RowQuery::new()
            .eq("brand", "Finolex")
            .order_desc("created_at")
            .limit(25)
            .into_params();

        assert_eq!(
            params,
            vec![
                ("brand".to_string(), "eq.Finolex".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_row_query_empty() {
        assert!(RowQuery::new().into_params().is_empty());
    }

    #[tokio::test]
    async fn test_select_unconfigured_errors() {
        let backend = Backend::unconfigured();
        let result = backend.select("products", RowQuery::new()).await;
        assert!(matches!(result, Err(BackendError::Unconfigured)));
    }
}
