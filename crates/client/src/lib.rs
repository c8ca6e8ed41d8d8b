//! Copperkart Client - SDK for the hosted store backend.
//!
//! The store runs entirely on a hosted data/auth/realtime service; this
//! crate is the thin, typed client in front of it.
//!
//! # Architecture
//!
//! - [`backend`] - lazily-configured handle: row CRUD, sessions, change feed
//! - [`realtime`] - subscription manager over the change feed
//! - [`store`] - per-entity access façade (products, orders, inquiries, profiles)
//! - [`auth`] - customer OTP login flow and owner dashboard gate
//! - [`session_store`] - durable local session file
//! - [`config`] - environment-driven configuration
//!
//! Everything is wired together by [`Client`], the composition root. With
//! no backend configured the whole client degrades to no-ops: reads come
//! back empty, writes do nothing, and no notifications are delivered.
//!
//! # Example
//!
//! ```rust,ignore
//! use copperkart_client::Client;
//!
//! let client = Client::from_env()?;
//!
//! // Browse the catalog
//! let products = client.store().products().list().await;
//!
//! // Watch it change
//! let subscription = client
//!     .store()
//!     .products()
//!     .subscribe(|change| println!("{:?}", change.kind))
//!     .await;
//!
//! // ... later
//! subscription.unsubscribe();
//! client.shutdown();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod backend;
mod client;
pub mod config;
pub mod realtime;
pub mod session_store;
pub mod store;

pub use auth::{AuthError, Authenticator, CustomerProfile, OtpSender, TracingOtpSender};
pub use backend::{Backend, BackendError, ChangeEvent, ChangeKind};
pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use realtime::{Subscription, SubscriptionManager};
pub use store::{EntityChange, Store};
