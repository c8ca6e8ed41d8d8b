//! Inspect the durable customer session.

use copperkart_client::Client;

/// Restore the stored session and print what came back.
pub async fn show(client: &Client) {
    match client.auth().restore_session().await {
        Some(profile) => {
            println!("user id:  {}", profile.user_id);
            if let Some(email) = &profile.email {
                println!("email:    {email}");
            }
            if let Some(phone) = &profile.phone {
                println!("phone:    {phone}");
            }
            println!("verified: {}", profile.verified);
        }
        None => println!("no stored session"),
    }

    if client.admin().is_logged_in() {
        println!("owner dashboard session: active");
    }
}
