//! Row models for the entities held in the hosted store.
//!
//! Each entity has a full row type (what `select` returns) and, where the
//! client creates or patches rows, companion insert/patch types whose `None`
//! fields are omitted from the request body so the store's defaults apply.
//!
//! The client never holds an authoritative copy of any of these; they are
//! ephemeral projections reconciled by change-feed notifications.

pub mod account;
pub mod inquiry;
pub mod order;
pub mod product;
pub mod profile;

pub use account::UserAccount;
pub use inquiry::{Inquiry, NewInquiry};
pub use order::{NewOrder, Order};
pub use product::{NewProduct, Product, ProductPatch};
pub use profile::{ProfileUpsert, UserProfile};
