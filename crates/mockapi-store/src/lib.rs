//! # mockapi-store — Mock Resource Table
//!
//! One process-wide table mapping a resource name (the first segment of a
//! request path) to its ordered list of records. Every record is an open
//! JSON object carrying an integer `id` assigned by the store.
//!
//! The table lives behind a single `parking_lot::Mutex`. Each operation
//! holds it for its whole duration, including the write of the backing file,
//! so concurrent requests observe a strict sequence of mutations and the
//! file on disk always matches some prefix of that sequence.

pub mod store;

pub use store::{IdPolicy, Record, ResourceStore, StoreError};
