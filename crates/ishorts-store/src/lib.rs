//! Job record store for the production pipeline.
//!
//! This crate provides:
//! - The `JobStore` contract the stage handlers and scheduler depend on
//! - A PostgreSQL implementation on sqlx
//! - An in-memory implementation with the same semantics

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{PgStore, StoreConfig};
pub use store::JobStore;
