//! Entity access façade.
//!
//! One repository per entity (products, orders, inquiries, profiles), all
//! sharing a [`Backend`] handle and a [`SubscriptionManager`] injected at
//! construction. The store is the only layer UI code talks to.
//!
//! # Error posture
//!
//! Reads swallow: a failed `list` logs and returns empty, a failed `get`
//! logs and returns `None` - callers cannot tell "failed" from "no data",
//! and the change feed is what reconciles any staleness. Writes propagate:
//! `create`/`update`/`delete` surface backend failures so the caller can
//! show an error instead of assuming success. On an unconfigured backend
//! everything short-circuits to a no-op without touching the network.
//!
//! There is no local cache and no optimistic update; the store of record is
//! the backend, and local state changes only via responses and change-feed
//! notifications.

mod inquiries;
mod orders;
mod products;
mod profiles;

pub use inquiries::Inquiries;
pub use orders::Orders;
pub use products::Products;
pub use profiles::Profiles;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::backend::{Backend, ChangeEvent, ChangeKind};
use crate::realtime::SubscriptionManager;

/// Shared entry point for entity access.
#[derive(Debug, Clone)]
pub struct Store {
    backend: Backend,
    realtime: SubscriptionManager,
}

impl Store {
    /// Create a store over an injected backend handle and subscription
    /// manager.
    #[must_use]
    pub const fn new(backend: Backend, realtime: SubscriptionManager) -> Self {
        Self { backend, realtime }
    }

    /// Product catalog access.
    #[must_use]
    pub const fn products(&self) -> Products<'_> {
        Products::new(self)
    }

    /// Order access.
    #[must_use]
    pub const fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    /// Inquiry access.
    #[must_use]
    pub const fn inquiries(&self) -> Inquiries<'_> {
        Inquiries::new(self)
    }

    /// Customer profile access.
    #[must_use]
    pub const fn profiles(&self) -> Profiles<'_> {
        Profiles::new(self)
    }

    pub(crate) const fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) const fn realtime(&self) -> &SubscriptionManager {
        &self.realtime
    }
}

/// A change notification decoded for one entity type.
///
/// `new` is the decoded row image for INSERT/UPDATE. `old` stays raw JSON:
/// the backend only ships the columns its replica identity covers for
/// UPDATE/DELETE, which is usually too little to decode a full row from.
#[derive(Debug, Clone)]
pub struct EntityChange<T> {
    pub kind: ChangeKind,
    pub new: Option<T>,
    pub old: Option<Value>,
}

impl<T: DeserializeOwned> EntityChange<T> {
    /// Decode a raw feed event. Events whose `new` image does not decode,
    /// or which carry neither image, are dropped with a warning.
    pub(crate) fn decode(event: ChangeEvent) -> Option<Self> {
        let ChangeEvent {
            kind,
            table,
            new,
            old,
        } = event;

        let new = match new {
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(error) => {
                    warn!(%table, %error, "dropping undecodable change notification");
                    return None;
                }
            },
            None => None,
        };

        if new.is_none() && old.is_none() {
            warn!(%table, "dropping change notification with no row image");
            return None;
        }

        Some(Self { kind, new, old })
    }
}

/// Adapt an entity-typed callback to the raw feed callback shape.
pub(crate) fn typed_callback<T, F>(callback: F) -> impl Fn(ChangeEvent) + Send + Sync + 'static
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(EntityChange<T>) + Send + Sync + 'static,
{
    move |event| {
        if let Some(change) = EntityChange::decode(event) {
            callback(change);
        }
    }
}

/// Decode a list of rows, skipping any that fail with a warning.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| decode_row(row, table))
        .collect()
}

/// Decode one row, logging and discarding on failure.
pub(crate) fn decode_row<T: DeserializeOwned>(row: Value, table: &str) -> Option<T> {
    match serde_json::from_value(row) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            warn!(%table, %error, "dropping undecodable row");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use copperkart_core::{NewProduct, Price, Product, UnitType};
    use secrecy::SecretString;
    use url::Url;

    fn unconfigured_store() -> Store {
        let backend = Backend::unconfigured();
        let realtime = SubscriptionManager::new(backend.clone());
        Store::new(backend, realtime)
    }

    /// A configured store pointing at a dead address, so every request
    /// fails at the transport layer.
    fn unreachable_store() -> Store {
        let config = BackendConfig {
            url: Url::parse("http://127.0.0.1:9").unwrap(),
            anon_key: SecretString::from("test-anon-key"),
        };
        let backend = Backend::new(Some(&config));
        let realtime = SubscriptionManager::new(backend.clone());
        Store::new(backend, realtime)
    }

    fn sample_product() -> NewProduct {
        NewProduct {
            name: "FR PVC Wire 2.5 sqmm".to_string(),
            brand: "Havells".to_string(),
            category: "house-wire".to_string(),
            price: Price::new("2150".parse().unwrap()).unwrap(),
            unit: UnitType::Coils,
            stock: 12,
            is_active: true,
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_reads_are_empty() {
        let store = unconfigured_store();
        assert!(store.products().list().await.is_empty());
        assert!(
            store
                .products()
                .get(copperkart_core::ProductId::generate())
                .await
                .is_none()
        );
        assert!(store.orders().list(None).await.is_empty());
        assert!(store.inquiries().list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_writes_are_noops() {
        let store = unconfigured_store();
        let created = store.products().create(&sample_product()).await.unwrap();
        assert!(created.is_none());

        store
            .products()
            .delete(copperkart_core::ProductId::generate())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_list_is_empty_but_create_fails() {
        let store = unreachable_store();

        // Reads swallow the failure.
        assert!(store.products().list().await.is_empty());
        assert!(
            store
                .products()
                .get(copperkart_core::ProductId::generate())
                .await
                .is_none()
        );

        // Writes surface it.
        assert!(store.products().create(&sample_product()).await.is_err());
        assert!(
            store
                .products()
                .delete(copperkart_core::ProductId::generate())
                .await
                .is_err()
        );
    }

    #[test]
    fn test_entity_change_decode_drops_bad_new_image() {
        let event = ChangeEvent {
            kind: ChangeKind::Insert,
            table: "products".to_string(),
            new: Some(serde_json::json!({"id": "not-a-product"})),
            old: None,
        };
        assert!(EntityChange::<Product>::decode(event).is_none());
    }

    #[test]
    fn test_entity_change_decode_delete_keeps_raw_old() {
        let event = ChangeEvent {
            kind: ChangeKind::Delete,
            table: "products".to_string(),
            new: None,
            old: Some(serde_json::json!({"id": "7b6a3c64-48cf-4f3e-9a19-2f4d5f8b6c01"})),
        };
        let change = EntityChange::<Product>::decode(event).unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert!(change.new.is_none());
        assert!(change.old.is_some());
    }
}
