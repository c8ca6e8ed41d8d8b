//! Integration tests for Copperkart.
//!
//! These tests exercise the client against a real backend and are ignored
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Point the client at a test project
//! export COPPERKART_BACKEND_URL=https://test-project.example.com
//! export COPPERKART_BACKEND_ANON_KEY=...
//!
//! # Run the ignored live tests
//! cargo test -p copperkart-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `store_live` - row CRUD through the entity façade
//! - `realtime_live` - change-feed delivery end to end

#![cfg_attr(not(test), forbid(unsafe_code))]

use copperkart_client::{Client, ClientConfig};

/// Build a client from the test environment.
///
/// # Panics
///
/// Panics if the environment configuration is invalid; a missing backend
/// configuration yields a degenerate client, which the live tests detect
/// and report.
#[must_use]
pub fn test_client() -> Client {
    let config = ClientConfig::from_env().expect("invalid test environment");
    Client::new(config)
}

/// Skip-with-message guard for live tests run without a backend.
#[must_use]
pub fn require_backend(client: &Client) -> bool {
    if client.is_configured() {
        true
    } else {
        eprintln!("skipping: COPPERKART_BACKEND_URL / COPPERKART_BACKEND_ANON_KEY not set");
        false
    }
}
