//! Live tests for the entity façade.
//!
//! These tests require:
//! - A provisioned backend project (tables, policies, realtime enabled)
//! - `COPPERKART_BACKEND_URL` / `COPPERKART_BACKEND_ANON_KEY` in the environment
//!
//! Run with: cargo test -p copperkart-integration-tests -- --ignored

use copperkart_core::{NewProduct, Price, ProductPatch, UnitType};
use copperkart_integration_tests::{require_backend, test_client};

fn sample_product(marker: &str) -> NewProduct {
    NewProduct {
        name: format!("Integration Test Wire {marker}"),
        brand: "TestBrand".to_string(),
        category: "integration-test".to_string(),
        colors: vec!["red".to_string(), "black".to_string()],
        price: Price::new("999.50".parse().expect("static decimal")).expect("non-negative"),
        unit: UnitType::Metres,
        stock: 5,
        is_active: false,
        ..NewProduct::default()
    }
}

#[tokio::test]
#[ignore = "Requires a configured backend"]
async fn test_product_crud_roundtrip() {
    let client = test_client();
    if !require_backend(&client) {
        return;
    }

    let marker = uuid::Uuid::new_v4().to_string();
    let products = client.store().products();

    // Create
    let created = products
        .create(&sample_product(&marker))
        .await
        .expect("create failed")
        .expect("backend configured");
    assert_eq!(created.stock, 5);
    assert!(!created.is_active);

    // Read back
    let fetched = products.get(created.id).await.expect("product not found");
    assert_eq!(fetched.name, created.name);

    // Newest-first ordering puts it at the front of the unfiltered list.
    let listed = client.store().products().list().await;
    assert_eq!(listed.first().map(|p| p.id), Some(created.id));

    // Patch
    let updated = products
        .update(
            created.id,
            &ProductPatch {
                stock: Some(7),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("update failed")
        .expect("backend configured");
    assert_eq!(updated.stock, 7);

    // Delete, then the id resolves to nothing.
    products.delete(created.id).await.expect("delete failed");
    assert!(products.get(created.id).await.is_none());

    client.shutdown();
}

#[tokio::test]
#[ignore = "Requires a configured backend"]
async fn test_get_missing_product_is_none() {
    let client = test_client();
    if !require_backend(&client) {
        return;
    }

    let missing = copperkart_core::ProductId::generate();
    assert!(client.store().products().get(missing).await.is_none());

    client.shutdown();
}
