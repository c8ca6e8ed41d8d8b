//! Listing commands for products, orders, and inquiries.

use uuid::Uuid;

use copperkart_client::Client;
use copperkart_core::UserId;

/// Print the catalog, newest first.
pub async fn list_products(client: &Client, active_only: bool) {
    let products = if active_only {
        client.store().products().list_active().await
    } else {
        client.store().products().list().await
    };

    if products.is_empty() {
        println!("no products");
        return;
    }

    for product in products {
        println!(
            "{}  {:<40}  {:>10}/{}  stock {:>5}  {}",
            product.id,
            product.name,
            product.price,
            product.unit,
            product.stock,
            if product.is_active { "active" } else { "hidden" },
        );
    }
}

/// Print orders, newest first, optionally for one customer.
pub async fn list_orders(client: &Client, user: Option<Uuid>) {
    let orders = client.store().orders().list(user.map(UserId::new)).await;

    if orders.is_empty() {
        println!("no orders");
        return;
    }

    for order in orders {
        println!(
            "{}  {}  {:>10}  {:<10}  payment {:<9}  {}",
            order.id,
            order.order_number,
            order.total,
            order.status,
            order.payment_status,
            order.customer_name,
        );
    }
}

/// Print inquiries, newest first, optionally for one customer.
pub async fn list_inquiries(client: &Client, user: Option<Uuid>) {
    let inquiries = client.store().inquiries().list(user.map(UserId::new)).await;

    if inquiries.is_empty() {
        println!("no inquiries");
        return;
    }

    for inquiry in inquiries {
        println!(
            "{}  {:<12}  {:<10}  {}",
            inquiry.id, inquiry.requester_type, inquiry.status, inquiry.requirements,
        );
    }
}
