//! Copperkart Core - Shared types library.
//!
//! This crate provides common types used across all Copperkart components:
//! - `client` - SDK for the hosted store backend (rows, auth, realtime)
//! - `cli` - Command-line tools for browsing and watching store data
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no backend
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, contacts, prices, and statuses
//! - [`model`] - Row models for the entities held in the hosted store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod model;
pub mod types;

pub use model::*;
pub use types::*;
