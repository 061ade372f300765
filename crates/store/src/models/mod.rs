//! Persisted entity models.

pub mod script;
