//! Stream change notifications to stdout.

use copperkart_client::Client;

/// Subscribe to `table` and print each notification as a JSON line until
/// Ctrl-C.
pub async fn watch(client: &Client, table: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !client.is_configured() {
        println!("backend not configured; nothing will arrive");
    }

    let subscription = client
        .realtime()
        .subscribe(table, None, |event| {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
        })
        .await;

    println!("watching {table} (Ctrl-C to stop)");
    tokio::signal::ctrl_c().await?;

    subscription.unsubscribe();
    client.shutdown();
    Ok(())
}
