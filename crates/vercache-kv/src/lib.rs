//! Remote key-value service boundary.
//!
//! The cache middleware talks to one shared remote key-value service for
//! both its version namespace and its data namespace. This crate defines
//! that boundary (`KvService`) and ships `MemoryKv`, an in-process
//! implementation with TTL support used by tests and single-process
//! deployments.

pub mod memory;
pub mod service;

pub use memory::MemoryKv;
pub use service::{KvError, KvService};
