//! Repository layer.
//!
//! Repositories own their on-disk state and expose async operations that
//! validate names before touching the filesystem.

pub mod script_repo;

pub use script_repo::ScriptRepo;
