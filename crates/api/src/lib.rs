//! Script manager facade: configuration, application errors, and the
//! orchestrator that ties the script repository to the execution harness.

pub mod config;
pub mod error;
pub mod orchestrator;
