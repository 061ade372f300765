//! File-backed persistence for script bodies, execution results, and the
//! metadata index.

pub mod error;
pub mod models;
pub mod repositories;

pub use error::{StoreError, StoreResult};
