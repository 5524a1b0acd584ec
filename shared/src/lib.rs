//! Shared types for the storefront platform
//!
//! Common types used across crates: the unified error system, domain
//! models (orders, products, payments, addresses), and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};
